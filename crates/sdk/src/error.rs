use paymentsheet_types::{CaptureMethod, ClientSecretError, IntentKind, SetupFutureUsage};
use thiserror::Error;

/// Errors that can occur in the PaymentSheet SDK
#[derive(Error, Debug)]
pub enum PaymentSheetError {
    /// Connection error (failed to reach the payments API)
    #[error("Connection error: {0}")]
    Connection(String),

    /// The payments API answered with a non-success status
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// HTTP error from reqwest
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Client secret could not be parsed
    #[error("Invalid client secret: {0}")]
    InvalidClientSecret(#[from] ClientSecretError),

    /// Missing or invalid configuration
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Server-returned intent does not match the deferred intent configuration
    #[error(transparent)]
    Validation(#[from] DeferredIntentValidationError),
}

/// Result type alias for SDK operations
pub type Result<T> = std::result::Result<T, PaymentSheetError>;

fn or_nil(usage: &Option<SetupFutureUsage>) -> String {
    usage
        .map(|u| u.to_string())
        .unwrap_or_else(|| "nil".to_string())
}

fn mode_name(kind: &IntentKind) -> &'static str {
    kind.mode_name()
}

/// A server-returned intent disagrees with the client's `IntentConfiguration`.
///
/// These are integration errors: the same inputs always fail the same way.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeferredIntentValidationError {
    #[error(
        "You returned a {returned} client secret but used an IntentConfiguration in {} mode.",
        mode_name(.mode)
    )]
    IntentModeMismatch { returned: IntentKind, mode: IntentKind },

    #[error(
        "Your PaymentIntent currency ({intent}) does not match the IntentConfiguration currency ({configured})."
    )]
    CurrencyMismatch { intent: String, configured: String },

    #[error(
        "Your PaymentIntent setup_future_usage ({}) does not match the IntentConfiguration setup_future_usage ({}).",
        or_nil(.intent),
        or_nil(.configured)
    )]
    SetupFutureUsageMismatch {
        intent: Option<SetupFutureUsage>,
        configured: Option<SetupFutureUsage>,
    },

    #[error(
        "Your PaymentIntent capture_method ({intent}) does not match the IntentConfiguration capture_method ({configured})."
    )]
    CaptureMethodMismatch {
        intent: CaptureMethod,
        configured: CaptureMethod,
    },

    #[error(
        "Your PaymentIntent confirmation_method (manual) can only be used with the Flow Controller integration."
    )]
    ManualConfirmationRequiresFlowController,

    #[error(
        "Your SetupIntent usage ({intent}) does not match the IntentConfiguration setup_future_usage ({configured})."
    )]
    SetupIntentUsageMismatch {
        intent: SetupFutureUsage,
        configured: SetupFutureUsage,
    },

    #[error(
        "Your {kind} payment_method ({intent_payment_method}) does not match the PaymentMethod ({confirm_payment_method}) passed into the confirm handler. Ensure either:\n  1. Your {kind} is created after the confirm handler is called, using the PaymentMethod it receives.\n  2. Your server updates the existing {kind}'s payment_method to the PaymentMethod passed into the confirm handler before returning it."
    )]
    PaymentMethodMismatch {
        kind: IntentKind,
        intent_payment_method: String,
        confirm_payment_method: String,
    },
}

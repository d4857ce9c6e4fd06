use serde::{Deserialize, Serialize};

use crate::{
    client_secret::IntentKind,
    intent::{CaptureMethod, SetupFutureUsage},
};

/// What kind of intent a deferred checkout will create, and its shape
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum IntentMode {
    /// Collect a payment now
    Payment {
        /// Amount in the currency's smallest unit
        amount: i64,

        /// Three-letter ISO currency code (e.g., "usd")
        currency: String,

        /// Save the payment method for later use
        #[serde(default, skip_serializing_if = "Option::is_none")]
        setup_future_usage: Option<SetupFutureUsage>,

        #[serde(default)]
        capture_method: CaptureMethod,
    },

    /// Save a payment method without charging it
    Setup {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        currency: Option<String>,

        #[serde(default)]
        setup_future_usage: SetupFutureUsage,
    },
}

impl IntentMode {
    /// The intent kind this mode expects the server to return
    pub fn intent_kind(&self) -> IntentKind {
        match self {
            IntentMode::Payment { .. } => IntentKind::Payment,
            IntentMode::Setup { .. } => IntentKind::Setup,
        }
    }

    pub fn currency(&self) -> Option<&str> {
        match self {
            IntentMode::Payment { currency, .. } => Some(currency),
            IntentMode::Setup { currency, .. } => currency.as_deref(),
        }
    }
}

impl std::fmt::Display for IntentMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IntentMode::Payment { .. } => write!(f, "payment"),
            IntentMode::Setup { .. } => write!(f, "setup"),
        }
    }
}

/// Client-declared shape of an intent the merchant's server creates later.
///
/// The server-returned intent is reconciled against this at confirmation
/// time. Builders consume `self`, so a configuration is not mutated once it
/// has been handed to the checkout flow.
///
/// # Example
///
/// ```
/// use paymentsheet_types::{CaptureMethod, IntentConfiguration, SetupFutureUsage};
///
/// let config = IntentConfiguration::payment(1099, "usd")
///     .with_capture_method(CaptureMethod::Manual)
///     .with_setup_future_usage(SetupFutureUsage::OffSession);
///
/// assert_eq!(config.mode.currency(), Some("usd"));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IntentConfiguration {
    #[serde(flatten)]
    pub mode: IntentMode,

    /// Payment method types to offer; empty lets the server decide
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub payment_method_types: Vec<String>,
}

impl IntentConfiguration {
    /// Create a payment-mode configuration
    pub fn payment(amount: i64, currency: impl Into<String>) -> Self {
        Self {
            mode: IntentMode::Payment {
                amount,
                currency: currency.into(),
                setup_future_usage: None,
                capture_method: CaptureMethod::default(),
            },
            payment_method_types: vec![],
        }
    }

    /// Create a setup-mode configuration (off-session usage, no currency)
    pub fn setup() -> Self {
        Self {
            mode: IntentMode::Setup {
                currency: None,
                setup_future_usage: SetupFutureUsage::default(),
            },
            payment_method_types: vec![],
        }
    }

    /// Set the setup future usage.
    ///
    /// In setup mode this is the usage the setup intent must have.
    pub fn with_setup_future_usage(mut self, usage: SetupFutureUsage) -> Self {
        match &mut self.mode {
            IntentMode::Payment {
                setup_future_usage, ..
            } => *setup_future_usage = Some(usage),
            IntentMode::Setup {
                setup_future_usage, ..
            } => *setup_future_usage = usage,
        }
        self
    }

    /// Set the capture method (payment mode only)
    pub fn with_capture_method(mut self, method: CaptureMethod) -> Self {
        if let IntentMode::Payment { capture_method, .. } = &mut self.mode {
            *capture_method = method;
        }
        self
    }

    /// Set the currency (setup mode only; payment mode takes it in `payment`)
    pub fn with_currency(mut self, code: impl Into<String>) -> Self {
        if let IntentMode::Setup { currency, .. } = &mut self.mode {
            *currency = Some(code.into());
        }
        self
    }

    pub fn with_payment_method_types(mut self, types: Vec<String>) -> Self {
        self.payment_method_types = types;
        self
    }
}

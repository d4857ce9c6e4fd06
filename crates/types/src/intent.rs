//! Payment and setup intents as returned by the payments API.

use serde::{Deserialize, Deserializer, Serialize};

use crate::{client_secret::IntentKind, configuration::IntentConfiguration};

/// Status of a payment or setup intent
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum IntentStatus {
    RequiresPaymentMethod,
    RequiresConfirmation,
    RequiresAction,
    Processing,
    RequiresCapture,
    Succeeded,
    Canceled,
    #[serde(other)]
    Unknown,
}

impl IntentStatus {
    /// Whether no further transition is expected for this intent
    pub fn is_terminal(&self) -> bool {
        matches!(self, IntentStatus::Succeeded | IntentStatus::Canceled)
    }
}

impl std::fmt::Display for IntentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IntentStatus::RequiresPaymentMethod => write!(f, "requires_payment_method"),
            IntentStatus::RequiresConfirmation => write!(f, "requires_confirmation"),
            IntentStatus::RequiresAction => write!(f, "requires_action"),
            IntentStatus::Processing => write!(f, "processing"),
            IntentStatus::RequiresCapture => write!(f, "requires_capture"),
            IntentStatus::Succeeded => write!(f, "succeeded"),
            IntentStatus::Canceled => write!(f, "canceled"),
            IntentStatus::Unknown => write!(f, "unknown"),
        }
    }
}

/// When the funds are captured for a payment intent
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum CaptureMethod {
    #[default]
    Automatic,
    AutomaticAsync,
    Manual,
    /// Any capture method this client does not know about
    #[serde(other)]
    Unknown,
}

impl CaptureMethod {
    /// `automatic` and `automatic_async` only differ in how the API settles the
    /// charge, so the client treats them as the same capture behaviour.
    pub fn is_equivalent(&self, other: &CaptureMethod) -> bool {
        use CaptureMethod::*;
        match (self, other) {
            (Automatic | AutomaticAsync, Automatic | AutomaticAsync) => true,
            _ => self == other,
        }
    }
}

impl std::fmt::Display for CaptureMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CaptureMethod::Automatic => write!(f, "automatic"),
            CaptureMethod::AutomaticAsync => write!(f, "automatic_async"),
            CaptureMethod::Manual => write!(f, "manual"),
            CaptureMethod::Unknown => write!(f, "unknown"),
        }
    }
}

/// How a payment intent gets confirmed
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConfirmationMethod {
    #[default]
    Automatic,
    Manual,
    #[serde(other)]
    Unknown,
}

impl std::fmt::Display for ConfirmationMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfirmationMethod::Automatic => write!(f, "automatic"),
            ConfirmationMethod::Manual => write!(f, "manual"),
            ConfirmationMethod::Unknown => write!(f, "unknown"),
        }
    }
}

/// Whether a payment method is saved for later use.
///
/// Used both as a payment intent's `setup_future_usage` and a setup intent's
/// `usage`. Setup intents default to `off_session`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SetupFutureUsage {
    OnSession,
    #[default]
    OffSession,
    #[serde(other)]
    Unknown,
}

impl std::fmt::Display for SetupFutureUsage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SetupFutureUsage::OnSession => write!(f, "on_session"),
            SetupFutureUsage::OffSession => write!(f, "off_session"),
            SetupFutureUsage::Unknown => write!(f, "unknown"),
        }
    }
}

/// Accepts either a bare payment method id or an expanded payment method object
fn deserialize_payment_method_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Expandable {
        Id(String),
        Object { id: String },
    }

    let value: Option<Expandable> = Option::deserialize(deserializer)?;
    Ok(value.map(|v| match v {
        Expandable::Id(id) => id,
        Expandable::Object { id } => id,
    }))
}

/// Payment intent
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PaymentIntent {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
    pub amount: i64,
    pub currency: String,
    pub status: IntentStatus,
    #[serde(default)]
    pub capture_method: CaptureMethod,
    #[serde(default)]
    pub confirmation_method: ConfirmationMethod,
    #[serde(default)]
    pub setup_future_usage: Option<SetupFutureUsage>,
    #[serde(
        default,
        deserialize_with = "deserialize_payment_method_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub payment_method: Option<String>,
}

impl PaymentIntent {
    pub fn new(id: impl Into<String>, amount: i64, currency: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            client_secret: None,
            amount,
            currency: currency.into(),
            status: IntentStatus::RequiresPaymentMethod,
            capture_method: CaptureMethod::default(),
            confirmation_method: ConfirmationMethod::default(),
            setup_future_usage: None,
            payment_method: None,
        }
    }

    pub fn with_status(mut self, status: IntentStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_capture_method(mut self, capture_method: CaptureMethod) -> Self {
        self.capture_method = capture_method;
        self
    }

    pub fn with_confirmation_method(mut self, confirmation_method: ConfirmationMethod) -> Self {
        self.confirmation_method = confirmation_method;
        self
    }

    pub fn with_setup_future_usage(mut self, usage: Option<SetupFutureUsage>) -> Self {
        self.setup_future_usage = usage;
        self
    }

    pub fn with_payment_method(mut self, payment_method: impl Into<String>) -> Self {
        self.payment_method = Some(payment_method.into());
        self
    }
}

/// Setup intent
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SetupIntent {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
    pub status: IntentStatus,
    #[serde(default)]
    pub usage: SetupFutureUsage,
    #[serde(
        default,
        deserialize_with = "deserialize_payment_method_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub payment_method: Option<String>,
}

impl SetupIntent {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            client_secret: None,
            status: IntentStatus::RequiresPaymentMethod,
            usage: SetupFutureUsage::default(),
            payment_method: None,
        }
    }

    pub fn with_status(mut self, status: IntentStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_usage(mut self, usage: SetupFutureUsage) -> Self {
        self.usage = usage;
        self
    }

    pub fn with_payment_method(mut self, payment_method: impl Into<String>) -> Self {
        self.payment_method = Some(payment_method.into());
        self
    }
}

/// An intent that exists on the server, tagged by its API `object` name
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "object", rename_all = "snake_case")]
pub enum RetrievedIntent {
    #[serde(rename = "payment_intent")]
    Payment(PaymentIntent),
    #[serde(rename = "setup_intent")]
    Setup(SetupIntent),
}

impl RetrievedIntent {
    pub fn kind(&self) -> IntentKind {
        match self {
            RetrievedIntent::Payment(_) => IntentKind::Payment,
            RetrievedIntent::Setup(_) => IntentKind::Setup,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            RetrievedIntent::Payment(pi) => &pi.id,
            RetrievedIntent::Setup(si) => &si.id,
        }
    }

    pub fn status(&self) -> IntentStatus {
        match self {
            RetrievedIntent::Payment(pi) => pi.status,
            RetrievedIntent::Setup(si) => si.status,
        }
    }

    /// Id of the payment method already attached to the intent, if any
    pub fn payment_method_id(&self) -> Option<&str> {
        match self {
            RetrievedIntent::Payment(pi) => pi.payment_method.as_deref(),
            RetrievedIntent::Setup(si) => si.payment_method.as_deref(),
        }
    }
}

impl From<PaymentIntent> for RetrievedIntent {
    fn from(intent: PaymentIntent) -> Self {
        RetrievedIntent::Payment(intent)
    }
}

impl From<SetupIntent> for RetrievedIntent {
    fn from(intent: SetupIntent) -> Self {
        RetrievedIntent::Setup(intent)
    }
}

/// The intent a checkout session is working with.
///
/// A deferred intent only carries the client-declared configuration; the
/// merchant's server creates the real intent when the customer confirms.
#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    Payment(PaymentIntent),
    Setup(SetupIntent),
    Deferred(IntentConfiguration),
}

impl Intent {
    pub fn is_deferred(&self) -> bool {
        matches!(self, Intent::Deferred(_))
    }

    /// Status of a realized intent; deferred intents have none yet
    pub fn status(&self) -> Option<IntentStatus> {
        match self {
            Intent::Payment(pi) => Some(pi.status),
            Intent::Setup(si) => Some(si.status),
            Intent::Deferred(_) => None,
        }
    }

    pub fn currency(&self) -> Option<&str> {
        match self {
            Intent::Payment(pi) => Some(&pi.currency),
            Intent::Setup(_) => None,
            Intent::Deferred(config) => config.mode.currency(),
        }
    }

    pub fn configuration(&self) -> Option<&IntentConfiguration> {
        match self {
            Intent::Deferred(config) => Some(config),
            _ => None,
        }
    }
}

impl From<RetrievedIntent> for Intent {
    fn from(intent: RetrievedIntent) -> Self {
        match intent {
            RetrievedIntent::Payment(pi) => Intent::Payment(pi),
            RetrievedIntent::Setup(si) => Intent::Setup(si),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_status_falls_back() {
        let status: IntentStatus = serde_json::from_str("\"requires_source\"").unwrap();
        assert_eq!(status, IntentStatus::Unknown);
    }

    #[test]
    fn test_payment_intent_from_api_json() {
        let json = serde_json::json!({
            "id": "pi_123",
            "object": "payment_intent",
            "amount": 1099,
            "currency": "usd",
            "status": "requires_action",
            "capture_method": "automatic_async",
            "confirmation_method": "automatic",
            "setup_future_usage": null,
            "payment_method": { "id": "pm_card_visa", "object": "payment_method" },
            "livemode": false
        });

        let intent: PaymentIntent = serde_json::from_value(json).unwrap();
        assert_eq!(intent.status, IntentStatus::RequiresAction);
        assert_eq!(intent.capture_method, CaptureMethod::AutomaticAsync);
        assert_eq!(intent.setup_future_usage, None);
        assert_eq!(intent.payment_method.as_deref(), Some("pm_card_visa"));
    }

    #[test]
    fn test_unrecognised_enum_values_fall_back_to_unknown() {
        let json = serde_json::json!({
            "id": "pi_123",
            "object": "payment_intent",
            "amount": 1099,
            "currency": "usd",
            "status": "processing",
            "capture_method": "manual_multicapture",
            "confirmation_method": "deferred",
            "setup_future_usage": "off_session_recurring"
        });

        let intent: PaymentIntent = serde_json::from_value(json).unwrap();
        assert_eq!(intent.status, IntentStatus::Processing);
        assert_eq!(intent.capture_method, CaptureMethod::Unknown);
        assert_eq!(intent.confirmation_method, ConfirmationMethod::Unknown);
        assert_eq!(intent.setup_future_usage, Some(SetupFutureUsage::Unknown));

        assert!(!CaptureMethod::Unknown.is_equivalent(&CaptureMethod::Automatic));
        assert!(CaptureMethod::Unknown.is_equivalent(&CaptureMethod::Unknown));
    }

    #[test]
    fn test_setup_intent_defaults_to_off_session() {
        let json = serde_json::json!({
            "id": "seti_123",
            "status": "succeeded",
            "payment_method": "pm_123"
        });

        let intent: SetupIntent = serde_json::from_value(json).unwrap();
        assert_eq!(intent.usage, SetupFutureUsage::OffSession);
        assert_eq!(intent.payment_method.as_deref(), Some("pm_123"));
    }

    #[test]
    fn test_retrieved_intent_tagged_by_object() {
        let json = serde_json::json!({
            "object": "setup_intent",
            "id": "seti_abc",
            "status": "processing",
            "usage": "on_session"
        });

        let intent: RetrievedIntent = serde_json::from_value(json).unwrap();
        assert_eq!(intent.kind(), IntentKind::Setup);
        assert_eq!(intent.id(), "seti_abc");
        assert_eq!(intent.status(), IntentStatus::Processing);
        assert_eq!(intent.payment_method_id(), None);
    }

    #[test]
    fn test_capture_method_equivalence() {
        assert!(CaptureMethod::Automatic.is_equivalent(&CaptureMethod::AutomaticAsync));
        assert!(CaptureMethod::AutomaticAsync.is_equivalent(&CaptureMethod::Automatic));
        assert!(CaptureMethod::Manual.is_equivalent(&CaptureMethod::Manual));
        assert!(!CaptureMethod::Manual.is_equivalent(&CaptureMethod::Automatic));
        assert!(!CaptureMethod::AutomaticAsync.is_equivalent(&CaptureMethod::Manual));
    }

    #[test]
    fn test_deferred_intent_has_no_status() {
        let intent = Intent::Deferred(IntentConfiguration::payment(1000, "eur"));
        assert!(intent.is_deferred());
        assert_eq!(intent.status(), None);
        assert_eq!(intent.currency(), Some("eur"));
    }
}

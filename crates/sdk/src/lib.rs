//! PaymentSheet SDK
//!
//! Client-side logic for a payment collection flow: watching an intent's
//! status while the customer finishes authentication, and checking that a
//! server-created intent matches what the checkout declared.
//!
//! # Overview
//!
//! - [`IntentStatusPoller`] - polls an intent and publishes status changes
//! - [`IntentRetriever`] - capability used by the poller to fetch an intent,
//!   with [`HttpIntentRetriever`] as the payments API implementation
//! - [`validator`] - deferred intent validation
//!
//! # Quick Start
//!
//! ## Waiting for a payment to settle
//!
//! ```ignore
//! use std::sync::Arc;
//! use paymentsheet_sdk::{ApiConfig, ClientSecret, HttpIntentRetriever, IntentStatusPoller, PollerConfig};
//!
//! let retriever = Arc::new(HttpIntentRetriever::new(ApiConfig::new("pk_test_...")));
//! let secret = ClientSecret::parse(&client_secret)?;
//!
//! let mut poller = IntentStatusPoller::new(secret, retriever, PollerConfig::default());
//! let mut rx = poller.subscribe();
//! poller.begin_polling();
//!
//! while let Ok(intent) = rx.recv().await {
//!     if intent.status().is_terminal() {
//!         break;
//!     }
//! }
//! poller.suspend_polling();
//! ```
//!
//! ## Validating a deferred intent
//!
//! ```
//! use paymentsheet_sdk::{IntentConfiguration, PaymentIntent, PaymentMethod, validator};
//!
//! let config = IntentConfiguration::payment(1000, "usd");
//! let returned = PaymentIntent::new("pi_123", 1000, "gbp");
//! let payment_method = PaymentMethod::new("pm_123", "card");
//!
//! let err = validator::validate_payment_intent(&returned, &config, &payment_method, false)
//!     .unwrap_err();
//! assert!(err.to_string().contains("gbp"));
//! ```

pub mod error;
pub mod poller;
pub mod retriever;
pub mod types;
pub mod validator;

// Re-export main types at crate root
pub use error::{DeferredIntentValidationError, PaymentSheetError, Result};
pub use poller::IntentStatusPoller;
pub use retriever::{HttpIntentRetriever, IntentRetriever};
pub use types::{
    ApiConfig, CaptureMethod, ClientSecret, ConfirmationMethod, Intent, IntentConfiguration,
    IntentKind, IntentMode, IntentStatus, PaymentIntent, PaymentMethod, PollerConfig,
    RetrievedIntent, SetupFutureUsage, SetupIntent,
};

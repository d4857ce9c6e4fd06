//! Data model shared by the PaymentSheet SDK and CLI.
//!
//! - [`RetrievedIntent`] / [`Intent`] - payment and setup intents as the API returns them
//! - [`IntentConfiguration`] - the client-declared shape of a deferred intent
//! - [`ClientSecret`] - parsed, log-safe client secret

pub mod client_secret;
pub mod configuration;
pub mod intent;
pub mod payment_method;

pub use client_secret::{ClientSecret, ClientSecretError, IntentKind};
pub use configuration::{IntentConfiguration, IntentMode};
pub use intent::{
    CaptureMethod, ConfirmationMethod, Intent, IntentStatus, PaymentIntent, RetrievedIntent,
    SetupFutureUsage, SetupIntent,
};
pub use payment_method::PaymentMethod;

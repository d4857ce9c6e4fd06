use std::time::Duration;

// Re-export shared types from paymentsheet-types
pub use paymentsheet_types::{
    CaptureMethod, ClientSecret, ClientSecretError, ConfirmationMethod, Intent,
    IntentConfiguration, IntentKind, IntentMode, IntentStatus, PaymentIntent, PaymentMethod,
    RetrievedIntent, SetupFutureUsage, SetupIntent,
};

use crate::error::{PaymentSheetError, Result};

/// Default delay between two status polls
pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_secs(3);

/// Shortest delay the poller will wait between two polls
pub const MIN_RETRY_INTERVAL: Duration = Duration::from_millis(1);

/// Default payments API base URL
pub const DEFAULT_API_ENDPOINT: &str = "https://api.stripe.com";

/// Configuration for intent status polling
#[derive(Debug, Clone)]
pub struct PollerConfig {
    /// Delay between two polls while polling is active. Values below
    /// [`MIN_RETRY_INTERVAL`] are raised to it by the poller.
    pub retry_interval: Duration,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            retry_interval: DEFAULT_RETRY_INTERVAL,
        }
    }
}

impl PollerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the retry interval. A zero interval is raised to one millisecond.
    pub fn with_retry_interval(mut self, interval: Duration) -> Self {
        self.retry_interval = interval.max(MIN_RETRY_INTERVAL);
        self
    }

    /// Same configuration with the retry interval clamped to
    /// [`MIN_RETRY_INTERVAL`]
    pub fn normalized(self) -> Self {
        let interval = self.retry_interval;
        self.with_retry_interval(interval)
    }
}

/// Configuration for talking to the payments API
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL for the payments API
    pub endpoint: String,

    /// Publishable key used to read intents with their client secret
    pub publishable_key: String,

    /// Connected account to act on behalf of, sent as `Stripe-Account`
    pub stripe_account: Option<String>,
}

impl ApiConfig {
    /// Create a new configuration for the given publishable key
    pub fn new(publishable_key: impl Into<String>) -> Self {
        Self {
            endpoint: DEFAULT_API_ENDPOINT.to_string(),
            publishable_key: publishable_key.into(),
            stripe_account: None,
        }
    }

    /// Load the configuration from the environment.
    ///
    /// Reads `STRIPE_PUBLISHABLE_KEY` (required), `STRIPE_API_BASE` and
    /// `STRIPE_ACCOUNT` (both optional).
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let publishable_key = lookup("STRIPE_PUBLISHABLE_KEY")
            .filter(|key| !key.is_empty())
            .ok_or_else(|| {
                PaymentSheetError::Configuration(
                    "STRIPE_PUBLISHABLE_KEY environment variable is not set".to_string(),
                )
            })?;

        let mut config = Self::new(publishable_key);
        if let Some(endpoint) = lookup("STRIPE_API_BASE") {
            config = config.with_endpoint(endpoint);
        }
        if let Some(account) = lookup("STRIPE_ACCOUNT") {
            config = config.with_stripe_account(account);
        }
        Ok(config)
    }

    /// Set the API base URL
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Act on behalf of a connected account
    pub fn with_stripe_account(mut self, account: impl Into<String>) -> Self {
        self.stripe_account = Some(account.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_zero_retry_interval_is_clamped() {
        let config = PollerConfig::new().with_retry_interval(Duration::ZERO);
        assert_eq!(config.retry_interval, Duration::from_millis(1));

        let literal = PollerConfig {
            retry_interval: Duration::ZERO,
        };
        assert_eq!(literal.normalized().retry_interval, MIN_RETRY_INTERVAL);
    }

    #[test]
    fn test_api_config_from_env() {
        let config = ApiConfig::from_lookup(lookup_from(&[
            ("STRIPE_PUBLISHABLE_KEY", "pk_test_123"),
            ("STRIPE_ACCOUNT", "acct_42"),
        ]))
        .unwrap();

        assert_eq!(config.publishable_key, "pk_test_123");
        assert_eq!(config.endpoint, DEFAULT_API_ENDPOINT);
        assert_eq!(config.stripe_account.as_deref(), Some("acct_42"));
    }

    #[test]
    fn test_api_config_requires_publishable_key() {
        let err = ApiConfig::from_lookup(lookup_from(&[("STRIPE_API_BASE", "http://localhost")]))
            .unwrap_err();
        assert!(matches!(err, PaymentSheetError::Configuration(_)));
    }
}

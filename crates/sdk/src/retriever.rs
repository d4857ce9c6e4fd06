use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};
use url::Url;

use crate::{
    error::{PaymentSheetError, Result},
    types::{ApiConfig, ClientSecret, IntentKind, RetrievedIntent},
};

/// Capability to fetch the current state of an intent.
///
/// The poller only depends on this trait, so any HTTP client or test double
/// can back it.
#[async_trait]
pub trait IntentRetriever: Send + Sync {
    async fn retrieve_intent(&self, client_secret: &ClientSecret) -> Result<RetrievedIntent>;
}

/// Error body returned by the payments API
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: Option<String>,
    code: Option<String>,
}

/// Retrieves intents from the payments API with a publishable key
pub struct HttpIntentRetriever {
    /// Configuration
    config: ApiConfig,

    /// HTTP client
    http_client: reqwest::Client,
}

impl HttpIntentRetriever {
    pub fn new(config: ApiConfig) -> Self {
        Self {
            config,
            http_client: reqwest::Client::new(),
        }
    }

    /// Build the retrieve URL for the intent behind this client secret
    fn build_url(&self, client_secret: &ClientSecret) -> Result<Url> {
        let raw = format!(
            "{}/v1/{}/{}",
            self.config.endpoint.trim_end_matches('/'),
            client_secret.kind().api_path(),
            client_secret.intent_id()
        );

        let mut url = Url::parse(&raw).map_err(|e| {
            PaymentSheetError::Configuration(format!(
                "Invalid API endpoint '{}': {}",
                self.config.endpoint, e
            ))
        })?;
        url.query_pairs_mut()
            .append_pair("client_secret", client_secret.expose());

        Ok(url)
    }
}

#[async_trait]
impl IntentRetriever for HttpIntentRetriever {
    async fn retrieve_intent(&self, client_secret: &ClientSecret) -> Result<RetrievedIntent> {
        let url = self.build_url(client_secret)?;
        debug!(intent_id = %client_secret.intent_id(), "Retrieving intent");

        let mut request = self
            .http_client
            .get(url)
            .bearer_auth(&self.config.publishable_key);
        if let Some(ref account) = self.config.stripe_account {
            request = request.header("Stripe-Account", account);
        }

        let response = request.send().await.map_err(transport_error)?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let err = api_error(status.as_u16(), &body);
            warn!(
                intent_id = %client_secret.intent_id(),
                status = status.as_u16(),
                error = %err,
                "Intent retrieval rejected"
            );
            return Err(err);
        }

        parse_intent(client_secret.kind(), &body)
    }
}

/// Parse a retrieve response body for the given intent kind
fn parse_intent(kind: IntentKind, body: &str) -> Result<RetrievedIntent> {
    let intent = match kind {
        IntentKind::Payment => RetrievedIntent::Payment(serde_json::from_str(body)?),
        IntentKind::Setup => RetrievedIntent::Setup(serde_json::from_str(body)?),
    };
    Ok(intent)
}

/// Failures to reach the API become connection errors, the rest stay HTTP errors
fn transport_error(e: reqwest::Error) -> PaymentSheetError {
    if e.is_connect() || e.is_timeout() {
        PaymentSheetError::Connection(e.to_string())
    } else {
        PaymentSheetError::Http(e)
    }
}

/// Map an error response to an API error, preferring the API's own message
fn api_error(status: u16, body: &str) -> PaymentSheetError {
    let message = match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(ApiErrorBody { error }) => match (error.message, error.code) {
            (Some(message), _) => message,
            (None, Some(code)) => code,
            (None, None) => format!("Request failed with status {}", status),
        },
        Err(_) if body.trim().is_empty() => format!("Request failed with status {}", status),
        Err(_) => body.to_string(),
    };
    PaymentSheetError::Api { status, message }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CaptureMethod, IntentStatus};

    fn secret(raw: &str) -> ClientSecret {
        ClientSecret::parse(raw).unwrap()
    }

    #[test]
    fn test_build_url_payment_intent() {
        let retriever = HttpIntentRetriever::new(ApiConfig::new("pk_test_123"));
        assert_eq!(
            retriever.build_url(&secret("pi_123_secret_abc")).unwrap().as_str(),
            "https://api.stripe.com/v1/payment_intents/pi_123?client_secret=pi_123_secret_abc"
        );
    }

    #[test]
    fn test_build_url_setup_intent_custom_endpoint() {
        let config = ApiConfig::new("pk_test_123").with_endpoint("http://localhost:12111/");
        let retriever = HttpIntentRetriever::new(config);
        assert_eq!(
            retriever.build_url(&secret("seti_456_secret_def")).unwrap().as_str(),
            "http://localhost:12111/v1/setup_intents/seti_456?client_secret=seti_456_secret_def"
        );
    }

    #[test]
    fn test_build_url_rejects_bad_endpoint() {
        let config = ApiConfig::new("pk_test_123").with_endpoint("not a url");
        let retriever = HttpIntentRetriever::new(config);
        assert!(matches!(
            retriever.build_url(&secret("pi_123_secret_abc")),
            Err(PaymentSheetError::Configuration(_))
        ));
    }

    #[test]
    fn test_parse_intent_by_kind() {
        let body = r#"{
            "id": "pi_123",
            "object": "payment_intent",
            "amount": 500,
            "currency": "usd",
            "status": "processing",
            "capture_method": "manual"
        }"#;

        let intent = parse_intent(IntentKind::Payment, body).unwrap();
        assert_eq!(intent.status(), IntentStatus::Processing);
        match intent {
            RetrievedIntent::Payment(pi) => assert_eq!(pi.capture_method, CaptureMethod::Manual),
            other => panic!("expected payment intent, got {:?}", other),
        }
    }

    #[test]
    fn test_api_error_uses_api_message() {
        let body = r#"{"error": {"message": "No such payment_intent: 'pi_123'", "code": "resource_missing"}}"#;
        match api_error(404, body) {
            PaymentSheetError::Api { status, message } => {
                assert_eq!(status, 404);
                assert_eq!(message, "No such payment_intent: 'pi_123'");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_api_error_falls_back_to_status() {
        match api_error(502, "") {
            PaymentSheetError::Api { message, .. } => {
                assert_eq!(message, "Request failed with status 502")
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_connection_error() {
        let config = ApiConfig::new("pk_test_123").with_endpoint("http://127.0.0.1:1");
        let retriever = HttpIntentRetriever::new(config);

        let err = retriever
            .retrieve_intent(&secret("pi_123_secret_abc"))
            .await
            .unwrap_err();
        assert!(matches!(err, PaymentSheetError::Connection(_)), "got {:?}", err);
    }
}

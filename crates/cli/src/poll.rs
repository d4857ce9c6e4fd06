use std::{sync::Arc, time::Duration};

use anyhow::Context;
use clap::Parser;
use paymentsheet_sdk::{
    ApiConfig, HttpIntentRetriever, IntentStatusPoller, PollerConfig,
    RetrievedIntent,
};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::warn;

#[derive(Parser, PartialEq, Clone, Debug)]
pub struct PollCommand {
    /// Client secret of the payment or setup intent to watch
    #[arg(long = "client-secret", short = 'c', env = "PAYMENTSHEET_CLIENT_SECRET")]
    pub client_secret: String,

    /// Publishable key. If not provided, will check STRIPE_PUBLISHABLE_KEY env var
    #[arg(long = "publishable-key", short = 'k')]
    pub publishable_key: Option<String>,

    /// Payments API base URL (overrides STRIPE_API_BASE)
    #[arg(long = "api-base")]
    pub api_base: Option<String>,

    /// Delay between polls in milliseconds
    #[arg(long = "interval-ms", default_value_t = 3000)]
    pub interval_ms: u64,

    /// Fetch the intent once and exit
    #[arg(long = "once")]
    pub once: bool,

    /// Stop after this many status changes
    #[arg(long = "max-updates")]
    pub max_updates: Option<usize>,

    /// Output format: json or pretty (default: pretty)
    #[arg(long = "format", short = 'f', default_value = "pretty")]
    pub format: OutputFormat,
}

#[derive(Clone, Debug, PartialEq)]
pub enum OutputFormat {
    Json,
    Pretty,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "pretty" => Ok(OutputFormat::Pretty),
            _ => Err(format!(
                "Invalid format: {}. Valid options are: json, pretty",
                s
            )),
        }
    }
}

impl OutputFormat {
    fn render(&self, intent: &RetrievedIntent) -> anyhow::Result<String> {
        Ok(match self {
            OutputFormat::Json => serde_json::to_string(intent)?,
            OutputFormat::Pretty => format!("{}  {}", intent.id(), intent.status()),
        })
    }
}

impl PollCommand {
    /// API configuration with priority: flags, then environment
    fn api_config(&self) -> anyhow::Result<ApiConfig> {
        let mut config = match &self.publishable_key {
            Some(key) => {
                let mut config = ApiConfig::new(key);
                if let Ok(endpoint) = std::env::var("STRIPE_API_BASE") {
                    config = config.with_endpoint(endpoint);
                }
                config
            }
            None => ApiConfig::from_env().context(
                "Publishable key not found. Please provide --publishable-key or set STRIPE_PUBLISHABLE_KEY",
            )?,
        };

        if let Some(ref api_base) = self.api_base {
            config = config.with_endpoint(api_base);
        }
        Ok(config)
    }

    pub async fn execute(&self) -> anyhow::Result<()> {
        let retriever = Arc::new(HttpIntentRetriever::new(self.api_config()?));
        let config =
            PollerConfig::new().with_retry_interval(Duration::from_millis(self.interval_ms));

        let mut poller = IntentStatusPoller::for_client_secret(&self.client_secret, retriever, config)
            .context("Invalid --client-secret")?;

        if self.once {
            let intent = poller
                .poll_once()
                .await
                .with_context(|| format!("Failed to retrieve {}", poller.client_secret().intent_id()))?;
            println!("{}", self.format.render(&intent)?);
            return Ok(());
        }

        let mut rx = poller.subscribe();
        poller.begin_polling();
        eprintln!(
            "Polling {} every {}ms (Ctrl-C to stop)",
            poller.client_secret().intent_id(),
            self.interval_ms
        );

        let result = self
            .follow_updates(&mut rx, tokio::signal::ctrl_c())
            .await;
        poller.suspend_polling();
        result.map(|_| ())
    }

    /// Print status changes until a terminal status, `--max-updates`, a
    /// closed channel or `shutdown` completes. Returns the number printed.
    async fn follow_updates(
        &self,
        rx: &mut broadcast::Receiver<RetrievedIntent>,
        shutdown: impl Future<Output = std::io::Result<()>>,
    ) -> anyhow::Result<usize> {
        tokio::pin!(shutdown);

        let mut updates = 0;
        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    eprintln!("Interrupted");
                    break;
                }
                received = rx.recv() => {
                    match received {
                        Ok(intent) => {
                            println!("{}", self.format.render(&intent)?);
                            updates += 1;

                            if intent.status().is_terminal() {
                                break;
                            }
                            if self.max_updates.is_some_and(|max| updates >= max) {
                                break;
                            }
                        }
                        Err(RecvError::Lagged(skipped)) => {
                            warn!(skipped, "Status updates skipped");
                        }
                        Err(RecvError::Closed) => break,
                    }
                }
            }
        }

        Ok(updates)
    }
}

#[cfg(test)]
mod tests {
    use paymentsheet_sdk::{IntentStatus, PaymentIntent, PaymentSheetError};

    use super::*;

    #[test]
    fn test_output_format_parsing() {
        assert_eq!("JSON".parse::<OutputFormat>(), Ok(OutputFormat::Json));
        assert_eq!("pretty".parse::<OutputFormat>(), Ok(OutputFormat::Pretty));
        assert!("yaml".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_render_intent() {
        let intent: RetrievedIntent = PaymentIntent::new("pi_123", 1000, "usd")
            .with_status(IntentStatus::Succeeded)
            .into();

        assert_eq!(
            OutputFormat::Pretty.render(&intent).unwrap(),
            "pi_123  succeeded"
        );

        let json: serde_json::Value =
            serde_json::from_str(&OutputFormat::Json.render(&intent).unwrap()).unwrap();
        assert_eq!(json["object"], "payment_intent");
        assert_eq!(json["status"], "succeeded");
    }

    #[test]
    fn test_api_base_flag_overrides_endpoint() {
        let cmd = PollCommand {
            client_secret: "pi_123_secret_abc".to_string(),
            publishable_key: Some("pk_test_123".to_string()),
            api_base: Some("http://localhost:12111".to_string()),
            interval_ms: 3000,
            once: true,
            max_updates: None,
            format: OutputFormat::Pretty,
        };

        let config = cmd.api_config().unwrap();
        assert_eq!(config.publishable_key, "pk_test_123");
        assert_eq!(config.endpoint, "http://localhost:12111");
    }

    fn follow_command(max_updates: Option<usize>) -> PollCommand {
        PollCommand {
            client_secret: "pi_123_secret_abc".to_string(),
            publishable_key: Some("pk_test_123".to_string()),
            api_base: None,
            interval_ms: 3000,
            once: false,
            max_updates,
            format: OutputFormat::Pretty,
        }
    }

    fn update(status: IntentStatus) -> RetrievedIntent {
        PaymentIntent::new("pi_123", 1000, "usd")
            .with_status(status)
            .into()
    }

    #[tokio::test]
    async fn test_follow_updates_stops_on_terminal_status() {
        let (tx, mut rx) = broadcast::channel(8);
        tx.send(update(IntentStatus::Processing)).unwrap();
        tx.send(update(IntentStatus::Succeeded)).unwrap();
        tx.send(update(IntentStatus::Canceled)).unwrap();

        let printed = follow_command(None)
            .follow_updates(&mut rx, std::future::pending::<std::io::Result<()>>())
            .await
            .unwrap();
        assert_eq!(printed, 2);
    }

    #[tokio::test]
    async fn test_follow_updates_honours_max_updates() {
        let (tx, mut rx) = broadcast::channel(8);
        tx.send(update(IntentStatus::RequiresAction)).unwrap();
        tx.send(update(IntentStatus::Processing)).unwrap();

        let printed = follow_command(Some(1))
            .follow_updates(&mut rx, std::future::pending::<std::io::Result<()>>())
            .await
            .unwrap();
        assert_eq!(printed, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_follow_updates_sees_shutdown_between_updates() {
        let (tx, mut rx) = broadcast::channel(8);
        let shutdown = async {
            tokio::time::sleep(Duration::from_secs(1)).await;
            Ok::<(), std::io::Error>(())
        };

        let sender = tokio::spawn(async move {
            tx.send(update(IntentStatus::Processing)).unwrap();
            tokio::time::sleep(Duration::from_secs(5)).await;
            drop(tx);
        });

        let printed = follow_command(None)
            .follow_updates(&mut rx, shutdown)
            .await
            .unwrap();
        assert_eq!(printed, 1);
        sender.abort();
    }

    #[tokio::test]
    async fn test_execute_rejects_malformed_client_secret() {
        let mut cmd = follow_command(None);
        cmd.client_secret = "pi_123".to_string();

        let err = cmd.execute().await.unwrap_err();
        assert!(err.to_string().contains("Invalid --client-secret"));
        assert!(matches!(
            err.downcast_ref::<PaymentSheetError>(),
            Some(PaymentSheetError::InvalidClientSecret(_))
        ));
    }
}

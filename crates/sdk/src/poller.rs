use std::sync::Arc;

use parking_lot::RwLock;
use tokio::{
    sync::{broadcast, mpsc},
    time::{self, Duration, MissedTickBehavior},
};
use tracing::{debug, info, warn};

use crate::{
    error::Result,
    retriever::IntentRetriever,
    types::{ClientSecret, IntentStatus, PollerConfig, RetrievedIntent},
};

/// Mutable polling state shared between the poller and its tasks
#[derive(Debug, Default)]
struct PollingSession {
    /// Last status delivered to subscribers; `None` until the first observation
    latest_status: Option<IntentStatus>,

    is_polling: bool,

    /// Bumped on every `begin_polling`; timer fetches carry the value they
    /// were dispatched under
    generation: u64,

    /// Generation of the outstanding timer fetch, if any
    in_flight: Option<u64>,
}

/// Everything a fetch needs, cloned into spawned tasks
#[derive(Clone)]
struct StatusFetcher {
    client_secret: ClientSecret,
    retriever: Arc<dyn IntentRetriever>,
    session: Arc<RwLock<PollingSession>>,
    update_tx: broadcast::Sender<RetrievedIntent>,
}

impl StatusFetcher {
    async fn fetch(&self) -> Result<RetrievedIntent> {
        self.retriever.retrieve_intent(&self.client_secret).await
    }

    /// Publish `intent` if its status changed.
    ///
    /// Timer fetches pass the generation they were dispatched under and are
    /// dropped unless that session is still polling. The check, the status
    /// update and the send happen under one lock so concurrent completions
    /// cannot both announce the same status.
    fn deliver(&self, intent: &RetrievedIntent, generation: Option<u64>) -> bool {
        let mut session = self.session.write();

        if let Some(generation) = generation {
            if !session.is_polling || session.generation != generation {
                debug!(
                    intent_id = %self.client_secret.intent_id(),
                    status = %intent.status(),
                    "Dropping poll result received after suspend"
                );
                return false;
            }
        }

        let status = intent.status();
        if session.latest_status == Some(status) {
            return false;
        }

        info!(
            intent_id = %self.client_secret.intent_id(),
            previous = %session.latest_status.unwrap_or(IntentStatus::Unknown),
            status = %status,
            "Intent status updated"
        );
        session.latest_status = Some(status);
        // No subscribers is fine, the status is still tracked
        let _ = self.update_tx.send(intent.clone());
        true
    }
}

/// Intent status poller
///
/// Polls the intent behind a client secret on a fixed interval and
/// publishes the retrieved intent to subscribers whenever its status
/// changes. Retrieval errors are logged and retried on the next tick.
///
/// # Example
///
/// ```ignore
/// use std::sync::Arc;
/// use paymentsheet_sdk::{ApiConfig, ClientSecret, HttpIntentRetriever, IntentStatusPoller, PollerConfig};
///
/// let retriever = Arc::new(HttpIntentRetriever::new(ApiConfig::from_env()?));
/// let secret = ClientSecret::parse("pi_123_secret_abc")?;
///
/// let mut poller = IntentStatusPoller::new(secret, retriever, PollerConfig::default());
/// let mut rx = poller.subscribe();
/// poller.begin_polling();
///
/// while let Ok(intent) = rx.recv().await {
///     println!("Status: {}", intent.status());
///     if intent.status().is_terminal() {
///         poller.suspend_polling();
///         break;
///     }
/// }
/// ```
pub struct IntentStatusPoller {
    /// Shared fetch state
    fetcher: StatusFetcher,

    /// Configuration
    config: PollerConfig,

    /// Stops the interval task
    shutdown_tx: Option<mpsc::Sender<()>>,
}

impl IntentStatusPoller {
    /// Create an idle poller for the given intent
    ///
    /// The retry interval is clamped to [`MIN_RETRY_INTERVAL`](crate::types::MIN_RETRY_INTERVAL).
    pub fn new(
        client_secret: ClientSecret,
        retriever: Arc<dyn IntentRetriever>,
        config: PollerConfig,
    ) -> Self {
        let (update_tx, _) = broadcast::channel(64);

        Self {
            fetcher: StatusFetcher {
                client_secret,
                retriever,
                session: Arc::new(RwLock::new(PollingSession::default())),
                update_tx,
            },
            config: config.normalized(),
            shutdown_tx: None,
        }
    }

    /// Create an idle poller from a raw client secret
    pub fn for_client_secret(
        client_secret: &str,
        retriever: Arc<dyn IntentRetriever>,
        config: PollerConfig,
    ) -> Result<Self> {
        let client_secret = ClientSecret::parse(client_secret)?;
        Ok(Self::new(client_secret, retriever, config))
    }

    /// Subscribe to status changes
    ///
    /// Each received value is the intent as retrieved when its status
    /// changed. Multiple subscribers can be created.
    pub fn subscribe(&self) -> broadcast::Receiver<RetrievedIntent> {
        self.fetcher.update_tx.subscribe()
    }

    pub fn client_secret(&self) -> &ClientSecret {
        &self.fetcher.client_secret
    }

    pub fn is_polling(&self) -> bool {
        self.fetcher.session.read().is_polling
    }

    /// Last delivered status, `Unknown` before the first observation
    pub fn latest_status(&self) -> IntentStatus {
        self.fetcher
            .session
            .read()
            .latest_status
            .unwrap_or(IntentStatus::Unknown)
    }

    /// Start polling, fetching immediately and then every retry interval.
    ///
    /// Does nothing if already polling. Must be called within a tokio runtime.
    pub fn begin_polling(&mut self) {
        let generation = {
            let mut session = self.fetcher.session.write();
            if session.is_polling {
                debug!(intent_id = %self.fetcher.client_secret.intent_id(), "Already polling");
                return;
            }
            session.is_polling = true;
            session.generation += 1;
            session.generation
        };

        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>(1);
        self.shutdown_tx = Some(shutdown_tx);

        info!(
            intent_id = %self.fetcher.client_secret.intent_id(),
            interval_ms = self.config.retry_interval.as_millis() as u64,
            "Polling started"
        );

        let fetcher = self.fetcher.clone();
        let retry_interval = self.config.retry_interval;
        tokio::spawn(async move {
            Self::run_polling(fetcher, generation, retry_interval, shutdown_rx).await;
        });
    }

    /// Stop polling.
    ///
    /// Fetches already in flight still complete, but their results are not
    /// delivered.
    pub fn suspend_polling(&mut self) {
        {
            let mut session = self.fetcher.session.write();
            if !session.is_polling {
                return;
            }
            session.is_polling = false;
        }

        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.try_send(());
        }
        info!(intent_id = %self.fetcher.client_secret.intent_id(), "Polling suspended");
    }

    /// Fetch the intent once, whatever the polling state.
    ///
    /// A status change is published to subscribers like any other poll.
    /// Unlike timer polls, retrieval errors are returned to the caller.
    pub async fn poll_once(&self) -> Result<RetrievedIntent> {
        let intent = self.fetcher.fetch().await.inspect_err(|e| {
            debug!(
                intent_id = %self.fetcher.client_secret.intent_id(),
                error = %e,
                "One-shot poll failed"
            );
        })?;
        self.fetcher.deliver(&intent, None);
        Ok(intent)
    }

    /// Run the interval loop for one polling generation
    async fn run_polling(
        fetcher: StatusFetcher,
        generation: u64,
        retry_interval: Duration,
        mut shutdown_rx: mpsc::Receiver<()>,
    ) {
        let mut interval = time::interval(retry_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => {
                    debug!(intent_id = %fetcher.client_secret.intent_id(), "Polling loop stopped");
                    return;
                }
                _ = interval.tick() => {
                    {
                        let mut session = fetcher.session.write();
                        if !session.is_polling || session.generation != generation {
                            return;
                        }
                        // Single flight: a slow fetch keeps its slot until it completes
                        if session.in_flight == Some(generation) {
                            debug!(
                                intent_id = %fetcher.client_secret.intent_id(),
                                "Previous poll still in flight, skipping tick"
                            );
                            continue;
                        }
                        session.in_flight = Some(generation);
                    }

                    tokio::spawn(Self::run_timer_fetch(fetcher.clone(), generation));
                }
            }
        }
    }

    async fn run_timer_fetch(fetcher: StatusFetcher, generation: u64) {
        let result = fetcher.fetch().await;

        {
            let mut session = fetcher.session.write();
            if session.in_flight == Some(generation) {
                session.in_flight = None;
            }
        }

        match result {
            Ok(intent) => {
                fetcher.deliver(&intent, Some(generation));
            }
            Err(e) => {
                warn!(
                    intent_id = %fetcher.client_secret.intent_id(),
                    error = %e,
                    "Intent status poll failed, retrying on next tick"
                );
            }
        }
    }
}

impl Drop for IntentStatusPoller {
    fn drop(&mut self) {
        self.fetcher.session.write().is_polling = false;
        // Signal shutdown synchronously
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.try_send(());
        }
    }
}

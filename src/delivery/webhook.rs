//! Webhook notifier (Slack, Teams, Discord, ...).
//!
//! `notify` never blocks: events are filtered by type, then offered to a
//! bounded queue. One worker task drains the queue in FIFO order and
//! retries each event with exponential backoff.
//!
//! On shutdown the worker finishes the event it is delivering, then
//! discards whatever is still queued and logs how many were dropped.

use std::collections::HashSet;
use std::time::Duration;

use reqwest::Client;
use serde_json::{json, Value};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, mpsc};

use crate::config::WebhookConfig;
use crate::delivery::{EventType, SinkEvent};
use crate::lifecycle::Shutdown;
use crate::observability::metrics;
use crate::resilience::calculate_backoff;
use crate::siem::{is_success, SinkError};

const USER_AGENT: &str = concat!("request-shield/", env!("CARGO_PKG_VERSION"));

/// Upper bound for a single backoff sleep.
const MAX_BACKOFF_MS: u64 = 60_000;

/// What happened to an event handed to [`WebhookNotifier::notify`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyOutcome {
    Queued,
    /// Event type not in the enabled set.
    Filtered,
    /// Queue full or worker gone.
    Dropped,
    /// Notifier not configured.
    Disabled,
}

/// JSON body posted to the webhook.
pub fn encode_webhook(event: &SinkEvent) -> Value {
    json!({
        "event": event.event_type.as_str(),
        "timestamp": event.timestamp_rfc3339(),
        "ip": event.ip,
        "path": event.path,
        "method": event.method,
        "message": event.message,
        "metadata": event.metadata,
    })
}

/// Producer half. Cheap to share behind an `Arc`.
#[derive(Debug)]
pub struct WebhookNotifier {
    enabled_events: HashSet<EventType>,
    sender: Option<mpsc::Sender<SinkEvent>>,
}

impl WebhookNotifier {
    /// A notifier that accepts nothing.
    pub fn disabled() -> Self {
        Self {
            enabled_events: HashSet::new(),
            sender: None,
        }
    }

    /// Start the delivery worker when the webhook is enabled and has a URL.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn from_config(config: &WebhookConfig, shutdown: &Shutdown) -> Result<Self, SinkError> {
        let url = match config.url.as_deref().filter(|u| !u.trim().is_empty()) {
            Some(url) if config.enabled => url.to_string(),
            None if config.enabled => {
                tracing::warn!("Webhook notifications enabled but no url configured; disabling");
                return Ok(Self::disabled());
            }
            _ => return Ok(Self::disabled()),
        };

        let timeout = Duration::from_secs(config.timeout_secs.max(1));
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;

        let (sender, receiver) = mpsc::channel(config.queue_capacity.max(1));
        let worker = WebhookWorker {
            client,
            url,
            retry_attempts: config.retry_attempts.max(1),
            base_delay_ms: config.base_delay_ms,
        };
        tokio::spawn(worker.run(receiver, shutdown.subscribe()));

        tracing::info!(
            queue_capacity = config.queue_capacity,
            retry_attempts = config.retry_attempts,
            events = ?config.events,
            "Webhook notifier started"
        );

        Ok(Self {
            enabled_events: config.events.iter().copied().collect(),
            sender: Some(sender),
        })
    }

    /// Notifier without a worker; the caller owns the queue's receiving end.
    pub fn detached(events: &[EventType], capacity: usize) -> (Self, mpsc::Receiver<SinkEvent>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let notifier = Self {
            enabled_events: events.iter().copied().collect(),
            sender: Some(sender),
        };
        (notifier, receiver)
    }

    pub fn is_enabled(&self) -> bool {
        self.sender.is_some()
    }

    pub fn accepts(&self, event_type: EventType) -> bool {
        self.is_enabled() && self.enabled_events.contains(&event_type)
    }

    /// Offer an event to the queue without waiting.
    pub fn notify(&self, event: SinkEvent) -> NotifyOutcome {
        let Some(sender) = &self.sender else {
            return NotifyOutcome::Disabled;
        };
        if !self.enabled_events.contains(&event.event_type) {
            return NotifyOutcome::Filtered;
        }

        let event_type = event.event_type;
        match sender.try_send(event) {
            Ok(()) => NotifyOutcome::Queued,
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!(event_type = %event_type, "Webhook notification queue is full, dropping event");
                metrics::record_webhook_dropped("queue_full");
                NotifyOutcome::Dropped
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::warn!(event_type = %event_type, "Webhook worker stopped, dropping event");
                metrics::record_webhook_dropped("closed");
                NotifyOutcome::Dropped
            }
        }
    }

    /// Events waiting in the queue.
    pub fn queue_depth(&self) -> usize {
        self.sender
            .as_ref()
            .map(|s| s.max_capacity() - s.capacity())
            .unwrap_or(0)
    }

    pub fn queue_capacity(&self) -> usize {
        self.sender.as_ref().map(|s| s.max_capacity()).unwrap_or(0)
    }
}

struct WebhookWorker {
    client: Client,
    url: String,
    retry_attempts: u32,
    base_delay_ms: u64,
}

impl WebhookWorker {
    async fn run(self, mut queue: mpsc::Receiver<SinkEvent>, mut shutdown: broadcast::Receiver<()>) {
        let mut shutdown_open = true;

        loop {
            tokio::select! {
                biased;
                signal = shutdown.recv(), if shutdown_open => match signal {
                    Ok(()) | Err(RecvError::Lagged(_)) => break,
                    Err(RecvError::Closed) => shutdown_open = false,
                },
                next = queue.recv() => match next {
                    Some(event) => {
                        self.deliver_with_retry(&event).await;
                    }
                    None => break,
                },
            }
        }

        queue.close();
        let mut discarded = 0u64;
        while queue.try_recv().is_ok() {
            discarded += 1;
        }
        if discarded > 0 {
            tracing::warn!(discarded, "Webhook worker stopping, discarding queued events");
            metrics::record_webhook_dropped_many("shutdown", discarded);
        }
        tracing::info!("Webhook worker stopped");
    }

    async fn deliver_with_retry(&self, event: &SinkEvent) -> bool {
        for attempt in 1..=self.retry_attempts {
            match self.send(event).await {
                Ok(()) => {
                    tracing::debug!(event_type = %event.event_type, attempt, "Webhook delivered");
                    metrics::record_webhook_delivery("delivered");
                    return true;
                }
                Err(e) if attempt < self.retry_attempts => {
                    let delay = calculate_backoff(attempt, self.base_delay_ms, MAX_BACKOFF_MS);
                    tracing::warn!(
                        event_type = %event.event_type,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Webhook delivery failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    tracing::error!(
                        event_type = %event.event_type,
                        attempts = self.retry_attempts,
                        error = %e,
                        "Failed to send webhook after {} attempts",
                        self.retry_attempts
                    );
                    metrics::record_webhook_delivery("abandoned");
                }
            }
        }
        false
    }

    async fn send(&self, event: &SinkEvent) -> Result<(), SinkError> {
        let response = self
            .client
            .post(&self.url)
            .json(&encode_webhook(event))
            .send()
            .await?;

        let status = response.status().as_u16();
        if is_success(status) {
            Ok(())
        } else {
            Err(SinkError::Status {
                status,
                body: String::new(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(event_type: EventType) -> SinkEvent {
        SinkEvent::new(event_type, "1.2.3.4", "/login", "POST", "test")
    }

    #[test]
    fn test_payload_shape() {
        let body = encode_webhook(&event(EventType::IpBlocked).with_metadata("risk_score", 60));
        assert_eq!(body["event"], "IP_BLOCKED");
        assert_eq!(body["ip"], "1.2.3.4");
        assert_eq!(body["metadata"]["risk_score"], 60);
        assert!(body["timestamp"].as_str().unwrap().ends_with('Z'));
    }

    #[test]
    fn test_overflow_drops_without_blocking() {
        let (notifier, mut queue) = WebhookNotifier::detached(&[EventType::IpBlocked], 3);

        let outcomes: Vec<_> = (0..5).map(|_| notifier.notify(event(EventType::IpBlocked))).collect();
        assert_eq!(&outcomes[..3], &[NotifyOutcome::Queued; 3]);
        assert_eq!(&outcomes[3..], &[NotifyOutcome::Dropped; 2]);
        assert_eq!(notifier.queue_depth(), 3);

        let mut received = 0;
        while queue.try_recv().is_ok() {
            received += 1;
        }
        assert_eq!(received, 3);
    }

    #[test]
    fn test_only_enabled_types_are_queued() {
        let (notifier, mut queue) = WebhookNotifier::detached(&EventType::default_webhook_events(), 10);

        assert_eq!(notifier.notify(event(EventType::AuditLog)), NotifyOutcome::Filtered);
        assert_eq!(notifier.notify(event(EventType::GeoBlocked)), NotifyOutcome::Filtered);
        assert_eq!(notifier.notify(event(EventType::TorBlocked)), NotifyOutcome::Queued);

        assert_eq!(queue.try_recv().unwrap().event_type, EventType::TorBlocked);
        assert!(queue.try_recv().is_err());
    }

    #[test]
    fn test_disabled_notifier() {
        let notifier = WebhookNotifier::disabled();
        assert_eq!(notifier.notify(event(EventType::IpBlocked)), NotifyOutcome::Disabled);
        assert_eq!(notifier.queue_depth(), 0);
    }

    #[tokio::test]
    async fn test_enabled_without_url_is_disabled() {
        let config = WebhookConfig {
            enabled: true,
            ..Default::default()
        };
        let notifier = WebhookNotifier::from_config(&config, &Shutdown::new()).unwrap();
        assert!(!notifier.is_enabled());
    }
}

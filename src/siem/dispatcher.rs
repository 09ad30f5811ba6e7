//! Inline fan-out of one event to every enabled SIEM sink.

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use reqwest::Client;

use super::{DatadogSink, GraylogSink, QRadarSink, SecuritySink, SinkError, SplunkSink};
use crate::config::SiemConfig;
use crate::delivery::SinkEvent;
use crate::observability::metrics;

pub struct SiemDispatcher {
    sinks: Vec<Arc<dyn SecuritySink>>,
    timeout: Duration,
}

impl SiemDispatcher {
    /// Keeps only sinks that report enabled. Disabled ones are never called.
    pub fn new(sinks: Vec<Arc<dyn SecuritySink>>, timeout: Duration) -> Self {
        let sinks = sinks.into_iter().filter(|s| s.is_enabled()).collect();
        Self { sinks, timeout }
    }

    pub fn from_config(config: &SiemConfig) -> Result<Self, SinkError> {
        let timeout = Duration::from_secs(config.timeout_secs.max(1));
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()?;

        let splunk: Arc<dyn SecuritySink> = Arc::new(SplunkSink::new(config.splunk.clone(), client.clone()));
        let datadog: Arc<dyn SecuritySink> = Arc::new(DatadogSink::new(config.datadog.clone(), client.clone()));
        let qradar: Arc<dyn SecuritySink> = Arc::new(QRadarSink::new(config.qradar.clone()));
        let graylog: Arc<dyn SecuritySink> = Arc::new(GraylogSink::new(config.graylog.clone(), client));

        let candidates = [
            (config.splunk.enabled, splunk),
            (config.datadog.enabled, datadog),
            (config.qradar.enabled, qradar),
            (config.graylog.enabled, graylog),
        ];

        let mut sinks = Vec::new();
        for (requested, sink) in candidates {
            if sink.is_enabled() {
                tracing::info!(sink = sink.name(), "SIEM sink enabled");
                sinks.push(sink);
            } else if requested {
                tracing::warn!(sink = sink.name(), "SIEM sink enabled but not fully configured; skipping");
            }
        }

        Ok(Self::new(sinks, timeout))
    }

    pub fn sink_names(&self) -> Vec<&'static str> {
        self.sinks.iter().map(|s| s.name()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    /// Send to all sinks concurrently. Returns the number of failed sinks;
    /// failures are logged and counted, never retried.
    pub async fn dispatch(&self, event: &SinkEvent) -> usize {
        let sends = self.sinks.iter().map(|sink| async move {
            let outcome = match tokio::time::timeout(self.timeout, sink.send(event)).await {
                Ok(result) => result,
                Err(_) => Err(SinkError::Transport(format!("timed out after {:?}", self.timeout))),
            };
            (sink.name(), outcome)
        });

        let mut failures = 0;
        for (name, outcome) in join_all(sends).await {
            if let Err(e) = outcome {
                failures += 1;
                tracing::warn!(sink = name, event_type = %event.event_type, error = %e, "SIEM delivery failed");
                metrics::record_sink_failure(name);
            }
        }
        failures
    }
}

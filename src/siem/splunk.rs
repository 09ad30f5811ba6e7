//! Splunk HTTP Event Collector.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use super::{is_success, non_empty, send_checked, SecuritySink, SinkError};
use crate::config::SplunkConfig;
use crate::delivery::SinkEvent;

pub struct SplunkSink {
    config: SplunkConfig,
    client: Client,
}

impl SplunkSink {
    pub fn new(config: SplunkConfig, client: Client) -> Self {
        Self { config, client }
    }
}

/// HEC envelope: `{time, source, sourcetype, index, event}`.
pub fn encode_hec(event: &SinkEvent, source: &str, index: &str) -> Value {
    json!({
        "time": event.timestamp.timestamp_millis() as f64 / 1000.0,
        "source": source,
        "sourcetype": "_json",
        "index": index,
        "event": event.to_fields(),
    })
}

#[async_trait]
impl SecuritySink for SplunkSink {
    fn name(&self) -> &'static str {
        "splunk"
    }

    fn is_enabled(&self) -> bool {
        self.config.enabled && non_empty(&self.config.url).is_some() && non_empty(&self.config.token).is_some()
    }

    async fn send(&self, event: &SinkEvent) -> Result<(), SinkError> {
        let (Some(url), Some(token)) = (non_empty(&self.config.url), non_empty(&self.config.token)) else {
            return Err(SinkError::Disabled);
        };

        let body = encode_hec(event, &self.config.source, &self.config.index);
        let request = self
            .client
            .post(url)
            .header("Authorization", format!("Splunk {token}"))
            .json(&body);

        send_checked(request, is_success).await
    }
}

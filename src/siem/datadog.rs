//! Datadog Logs intake.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Map, Value};

use super::{is_success, local_hostname, non_empty, send_checked, SecuritySink, SinkError};
use crate::config::DatadogConfig;
use crate::delivery::SinkEvent;

pub struct DatadogSink {
    config: DatadogConfig,
    client: Client,
    hostname: String,
}

impl DatadogSink {
    pub fn new(config: DatadogConfig, client: Client) -> Self {
        Self {
            config,
            client,
            hostname: local_hostname(),
        }
    }

    /// `endpoint` when set, else the regional intake for `site`.
    pub fn endpoint(&self) -> String {
        match non_empty(&self.config.endpoint) {
            Some(endpoint) => endpoint.to_string(),
            None => format!("https://http-intake.logs.{}/api/v2/logs", self.config.site),
        }
    }
}

/// Event fields flattened with the Datadog reserved attributes.
pub fn encode_datadog(event: &SinkEvent, source: &str, service: &str, hostname: &str) -> Value {
    let mut body: Map<String, Value> = event.to_fields();
    body.insert("ddsource".into(), Value::from(source));
    body.insert(
        "ddtags".into(),
        Value::from(format!("env:production,service:{service}")),
    );
    body.insert("service".into(), Value::from(service));
    body.insert("hostname".into(), Value::from(hostname));
    Value::Object(body)
}

#[async_trait]
impl SecuritySink for DatadogSink {
    fn name(&self) -> &'static str {
        "datadog"
    }

    fn is_enabled(&self) -> bool {
        self.config.enabled && non_empty(&self.config.api_key).is_some()
    }

    async fn send(&self, event: &SinkEvent) -> Result<(), SinkError> {
        let Some(api_key) = non_empty(&self.config.api_key) else {
            return Err(SinkError::Disabled);
        };

        let body = encode_datadog(event, &self.config.source, &self.config.service, &self.hostname);
        let request = self
            .client
            .post(self.endpoint())
            .header("DD-API-KEY", api_key)
            .json(&body);

        send_checked(request, is_success).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delivery::EventType;

    #[test]
    fn test_flattened_body() {
        let event = SinkEvent::new(EventType::RateLimitExceeded, "1.2.3.4", "/api", "POST", "limited");
        let body = encode_datadog(&event, "rust", "checkout", "web-1");

        assert_eq!(body["ddsource"], "rust");
        assert_eq!(body["ddtags"], "env:production,service:checkout");
        assert_eq!(body["service"], "checkout");
        assert_eq!(body["hostname"], "web-1");
        assert_eq!(body["event_type"], "RATE_LIMIT_EXCEEDED");
        assert_eq!(body["ip"], "1.2.3.4");
    }

    #[test]
    fn test_endpoint_from_site() {
        let config = DatadogConfig {
            site: "datadoghq.eu".into(),
            ..Default::default()
        };
        let sink = DatadogSink::new(config, Client::new());
        assert_eq!(sink.endpoint(), "https://http-intake.logs.datadoghq.eu/api/v2/logs");
        assert!(!sink.is_enabled());
    }
}

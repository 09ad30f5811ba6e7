//! Graylog GELF over HTTP.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Map, Value};

use super::{local_hostname, non_empty, send_checked, SecuritySink, SinkError};
use crate::config::GraylogConfig;
use crate::delivery::SinkEvent;

pub struct GraylogSink {
    config: GraylogConfig,
    client: Client,
    hostname: String,
}

impl GraylogSink {
    pub fn new(config: GraylogConfig, client: Client) -> Self {
        Self {
            config,
            client,
            hostname: local_hostname(),
        }
    }
}

/// GELF 1.1 message; every event field becomes an `_`-prefixed additional field.
pub fn encode_gelf(event: &SinkEvent, host: &str, facility: &str) -> Value {
    let mut gelf = Map::new();
    gelf.insert("version".into(), Value::from("1.1"));
    gelf.insert("host".into(), Value::from(host));
    gelf.insert("facility".into(), Value::from(facility));
    gelf.insert(
        "timestamp".into(),
        Value::from(event.timestamp.timestamp_millis() as f64 / 1000.0),
    );
    gelf.insert(
        "short_message".into(),
        Value::from(format!("{} {}", event.method, event.path)),
    );
    gelf.insert("level".into(), Value::from(event.risk_level().syslog_severity()));

    for (key, value) in event.to_fields() {
        gelf.insert(format!("_{key}"), value);
    }
    Value::Object(gelf)
}

/// Graylog answers 202 Accepted for HTTP GELF inputs; some proxies answer 200.
fn is_accepted(status: u16) -> bool {
    status == 200 || status == 202
}

#[async_trait]
impl SecuritySink for GraylogSink {
    fn name(&self) -> &'static str {
        "graylog"
    }

    fn is_enabled(&self) -> bool {
        self.config.enabled && non_empty(&self.config.url).is_some()
    }

    async fn send(&self, event: &SinkEvent) -> Result<(), SinkError> {
        let Some(url) = non_empty(&self.config.url) else {
            return Err(SinkError::Disabled);
        };

        let body = encode_gelf(event, &self.hostname, &self.config.facility);
        send_checked(self.client.post(url).json(&body), is_accepted).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delivery::EventType;

    #[test]
    fn test_gelf_fields() {
        let event = SinkEvent::new(EventType::IpBlocked, "6.6.6.6", "/admin", "GET", "blocked")
            .with_metadata("status_code", 403);
        let gelf = encode_gelf(&event, "web-1", "request-shield");

        assert_eq!(gelf["version"], "1.1");
        assert_eq!(gelf["host"], "web-1");
        assert_eq!(gelf["short_message"], "GET /admin");
        assert_eq!(gelf["level"], 3);
        assert_eq!(gelf["_ip"], "6.6.6.6");
        assert_eq!(gelf["_status_code"], 403);
        assert!(gelf.get("ip").is_none());
    }

    #[test]
    fn test_accepted_statuses() {
        assert!(is_accepted(200));
        assert!(is_accepted(202));
        assert!(!is_accepted(204));
        assert!(!is_accepted(500));
    }
}

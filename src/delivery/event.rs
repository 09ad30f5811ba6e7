//! Outbound security events.

use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Kinds of events the shield can raise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    RateLimitExceeded,
    IpBlocked,
    TorBlocked,
    GeoBlocked,
    HighRiskRequest,
    SecurityHeaderBlocked,
    AuditLog,
}

impl EventType {
    pub const ALL: [EventType; 7] = [
        EventType::RateLimitExceeded,
        EventType::IpBlocked,
        EventType::TorBlocked,
        EventType::GeoBlocked,
        EventType::HighRiskRequest,
        EventType::SecurityHeaderBlocked,
        EventType::AuditLog,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::RateLimitExceeded => "RATE_LIMIT_EXCEEDED",
            EventType::IpBlocked => "IP_BLOCKED",
            EventType::TorBlocked => "TOR_BLOCKED",
            EventType::GeoBlocked => "GEO_BLOCKED",
            EventType::HighRiskRequest => "HIGH_RISK_REQUEST",
            EventType::SecurityHeaderBlocked => "SECURITY_HEADER_BLOCKED",
            EventType::AuditLog => "AUDIT_LOG",
        }
    }

    /// Event types forwarded to the webhook when none are configured.
    pub fn default_webhook_events() -> Vec<EventType> {
        vec![
            EventType::RateLimitExceeded,
            EventType::IpBlocked,
            EventType::TorBlocked,
            EventType::HighRiskRequest,
        ]
    }

    /// Risk score used when the event metadata carries none.
    pub fn default_risk_score(&self) -> u32 {
        match self {
            EventType::RateLimitExceeded => 30,
            EventType::IpBlocked | EventType::TorBlocked => 60,
            EventType::GeoBlocked => 40,
            EventType::HighRiskRequest => 80,
            EventType::SecurityHeaderBlocked => 30,
            EventType::AuditLog => 0,
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse risk bucket derived from a numeric score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// `> 50` is high, `> 20` is medium, anything else is low.
    pub fn from_score(score: u32) -> Self {
        if score > 50 {
            RiskLevel::High
        } else if score > 20 {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }

    /// Syslog severity: informational, warning, error.
    pub fn syslog_severity(&self) -> u8 {
        match self {
            RiskLevel::Low => 6,
            RiskLevel::Medium => 4,
            RiskLevel::High => 3,
        }
    }

    /// CEF severity on the 0-10 scale.
    pub fn cef_severity(&self) -> u8 {
        match self {
            RiskLevel::Low => 3,
            RiskLevel::Medium => 6,
            RiskLevel::High => 8,
        }
    }
}

/// Payload handed to sinks and the webhook notifier.
#[derive(Debug, Clone, PartialEq)]
pub struct SinkEvent {
    pub event_type: EventType,
    pub timestamp: DateTime<Utc>,
    pub ip: String,
    pub path: String,
    pub method: String,
    pub message: String,
    pub metadata: Map<String, Value>,
}

impl SinkEvent {
    pub fn new(
        event_type: EventType,
        ip: impl Into<String>,
        path: impl Into<String>,
        method: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            event_type,
            timestamp: Utc::now(),
            ip: ip.into(),
            path: path.into(),
            method: method.into(),
            message: message.into(),
            metadata: Map::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// RFC 3339 timestamp with millisecond precision.
    pub fn timestamp_rfc3339(&self) -> String {
        self.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    /// Metadata `risk_score` when present, else the event type default.
    pub fn risk_score(&self) -> u32 {
        self.metadata
            .get("risk_score")
            .and_then(Value::as_u64)
            .map(|s| s.min(u32::MAX as u64) as u32)
            .unwrap_or_else(|| self.event_type.default_risk_score())
    }

    pub fn risk_level(&self) -> RiskLevel {
        RiskLevel::from_score(self.risk_score())
    }

    pub fn status_code(&self) -> Option<u16> {
        self.metadata
            .get("status_code")
            .and_then(Value::as_u64)
            .and_then(|s| u16::try_from(s).ok())
    }

    /// Flat field view: the fixed fields first, then metadata.
    /// Metadata never overrides the fixed fields.
    pub fn to_fields(&self) -> Map<String, Value> {
        let mut fields = Map::new();
        fields.insert("event_type".into(), Value::from(self.event_type.as_str()));
        fields.insert("timestamp".into(), Value::from(self.timestamp_rfc3339()));
        fields.insert("ip".into(), Value::from(self.ip.as_str()));
        fields.insert("path".into(), Value::from(self.path.as_str()));
        fields.insert("method".into(), Value::from(self.method.as_str()));
        fields.insert("message".into(), Value::from(self.message.as_str()));
        for (key, value) in &self.metadata {
            if !fields.contains_key(key) {
                fields.insert(key.clone(), value.clone());
            }
        }
        fields
    }
}

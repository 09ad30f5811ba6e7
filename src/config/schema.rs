//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the shield.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::delivery::EventType;

/// Root configuration for the request shield.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ShieldConfig {
    /// Listener for the demo host server.
    pub listener: ListenerConfig,

    /// Audit log settings.
    pub logging: LoggingConfig,

    /// HMAC key for audit record signatures. Absent → records are marked "unsigned".
    pub integrity_key: Option<String>,

    /// Base64-encoded 32-byte AES key for PII encryption.
    pub encryption_key: Option<String>,

    /// Admission control (rate limiting, blocklist).
    pub active_defense: ActiveDefenseConfig,

    /// SIEM connectors.
    pub siem: SiemConfig,

    /// Real-time notifications.
    pub notifications: NotificationsConfig,

    /// Session fingerprint guard.
    pub session: SessionConfig,

    /// Key rotation schedule.
    pub kms: KmsConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Admin API settings.
    pub admin: AdminConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Per-request handler timeout, in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            request_timeout_secs: 30,
        }
    }
}

/// Audit record settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Emit one audit record per request.
    pub enabled: bool,

    /// Mask the last octet of IPv4 client addresses.
    pub anonymize_ip: bool,

    /// Encrypt PII fields (requires `encryption_key`).
    pub encrypt_pii: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            anonymize_ip: true,
            encrypt_pii: true,
        }
    }
}

/// Admission control configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ActiveDefenseConfig {
    /// Enable per-address rate limiting.
    pub rate_limit_enabled: bool,

    /// Requests admitted per window.
    pub rate_limit_capacity: u64,

    /// Window length in seconds.
    pub rate_limit_window_secs: u64,

    /// Enforce the blocklist.
    pub blocklist_enabled: bool,

    /// Optional file with one blocked address per line; watched for changes.
    pub blocklist_path: Option<String>,
}

impl Default for ActiveDefenseConfig {
    fn default() -> Self {
        Self {
            rate_limit_enabled: true,
            rate_limit_capacity: 100,
            rate_limit_window_secs: 60,
            blocklist_enabled: false,
            blocklist_path: None,
        }
    }
}

/// SIEM connector configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SiemConfig {
    pub splunk: SplunkConfig,
    pub datadog: DatadogConfig,
    pub qradar: QRadarConfig,
    pub graylog: GraylogConfig,

    /// Per-call timeout for inline SIEM delivery, in seconds.
    pub timeout_secs: u64,
}

impl Default for SiemConfig {
    fn default() -> Self {
        Self {
            splunk: SplunkConfig::default(),
            datadog: DatadogConfig::default(),
            qradar: QRadarConfig::default(),
            graylog: GraylogConfig::default(),
            timeout_secs: 5,
        }
    }
}

/// Splunk HTTP Event Collector.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SplunkConfig {
    pub enabled: bool,
    /// e.g. "https://splunk.example.com:8088/services/collector/event"
    pub url: Option<String>,
    pub token: Option<String>,
    pub index: String,
    pub source: String,
}

impl Default for SplunkConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            url: None,
            token: None,
            index: "main".to_string(),
            source: "request-shield".to_string(),
        }
    }
}

/// Datadog Logs intake.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DatadogConfig {
    pub enabled: bool,
    pub api_key: Option<String>,
    /// "datadoghq.com", "datadoghq.eu", ...
    pub site: String,
    pub service: String,
    pub source: String,
    /// Overrides the intake URL derived from `site`.
    pub endpoint: Option<String>,
}

impl Default for DatadogConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_key: None,
            site: "datadoghq.com".to_string(),
            service: "request-shield".to_string(),
            source: "rust".to_string(),
            endpoint: None,
        }
    }
}

/// QRadar CEF over UDP syslog.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct QRadarConfig {
    pub enabled: bool,
    pub host: Option<String>,
    pub port: u16,
    pub device_vendor: String,
    pub device_product: String,
}

impl Default for QRadarConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            host: None,
            port: 514,
            device_vendor: "RequestShield".to_string(),
            device_product: "Shield".to_string(),
        }
    }
}

/// Graylog GELF over HTTP.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GraylogConfig {
    pub enabled: bool,
    /// e.g. "http://graylog.example.com:12201/gelf"
    pub url: Option<String>,
    pub facility: String,
}

impl Default for GraylogConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            url: None,
            facility: "request-shield".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct NotificationsConfig {
    pub webhook: WebhookConfig,
}

/// Webhook notifier (Slack, Teams, Discord, ...).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WebhookConfig {
    pub enabled: bool,
    pub url: Option<String>,

    /// Event types forwarded to the webhook; everything else is dropped pre-queue.
    pub events: Vec<EventType>,

    /// Delivery attempts per event.
    pub retry_attempts: u32,

    /// Bounded queue size.
    pub queue_capacity: usize,

    /// HTTP timeout per attempt, in seconds.
    pub timeout_secs: u64,

    /// First retry delay in milliseconds; doubles per attempt.
    pub base_delay_ms: u64,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            url: None,
            events: EventType::default_webhook_events(),
            retry_attempts: 3,
            queue_capacity: 1000,
            timeout_secs: 10,
            base_delay_ms: 1000,
        }
    }
}

/// Session fingerprint guard.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SessionConfig {
    pub guard_enabled: bool,

    /// Stricter, but breaks for clients behind rotating proxies.
    pub include_ip_in_fingerprint: bool,

    /// Destroy the session on mismatch instead of only flagging it.
    pub invalidate_on_mismatch: bool,

    /// Cookie carrying the session identifier.
    pub cookie_name: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            guard_enabled: false,
            include_ip_in_fingerprint: false,
            invalidate_on_mismatch: true,
            cookie_name: "SESSIONID".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct KmsConfig {
    pub rotation_interval_days: u64,
}

impl Default for KmsConfig {
    fn default() -> Self {
        Self {
            rotation_interval_days: 90,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit logs as JSON lines.
    pub json_logs: bool,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Admin API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Enable admin API.
    pub enabled: bool,

    /// API key for authentication (Bearer token).
    pub api_key: String,

    /// Admin API bind address.
    pub bind_address: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            // WARNING: This is a placeholder! Change this in production.
            api_key: "CHANGE_ME_IN_PRODUCTION".to_string(),
            bind_address: "127.0.0.1:8081".to_string(),
        }
    }
}

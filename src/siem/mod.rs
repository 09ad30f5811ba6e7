//! SIEM connectors.
//!
//! # Data Flow
//! ```text
//! SinkEvent (from an audit record or an alert)
//!     → dispatcher.rs (enabled sinks only, concurrent, per-call timeout)
//!         → splunk.rs   HEC envelope, `Authorization: Splunk <token>`
//!         → datadog.rs  flattened fields + dd tags, `DD-API-KEY`
//!         → qradar.rs   CEF line, one UDP datagram
//!         → graylog.rs  GELF 1.1 object, `_`-prefixed fields
//! ```
//!
//! # Design Decisions
//! - Each protocol has a pure `encode_*` function; `send` only adds transport
//! - Missing or partial configuration reports `is_enabled() == false`
//! - Failures are logged and counted, never retried at this layer

pub mod datadog;
pub mod dispatcher;
pub mod graylog;
pub mod qradar;
pub mod splunk;

use async_trait::async_trait;
use thiserror::Error;

use crate::delivery::SinkEvent;

pub use datadog::{encode_datadog, DatadogSink};
pub use dispatcher::SiemDispatcher;
pub use graylog::{encode_gelf, GraylogSink};
pub use qradar::{encode_cef, QRadarSink};
pub use splunk::{encode_hec, SplunkSink};

/// Version reported in CEF headers and user agents.
pub const PRODUCT_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("failed to encode event: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("sink is not configured")]
    Disabled,
}

impl From<reqwest::Error> for SinkError {
    fn from(e: reqwest::Error) -> Self {
        SinkError::Transport(e.to_string())
    }
}

impl From<std::io::Error> for SinkError {
    fn from(e: std::io::Error) -> Self {
        SinkError::Transport(e.to_string())
    }
}

/// A destination for security events.
#[async_trait]
pub trait SecuritySink: Send + Sync {
    /// Short stable name (used in logs/metrics).
    fn name(&self) -> &'static str;

    fn is_enabled(&self) -> bool;

    async fn send(&self, event: &SinkEvent) -> Result<(), SinkError>;
}

/// Local host name, or "unknown".
pub fn local_hostname() -> String {
    hostname::get()
        .ok()
        .and_then(|h| h.into_string().ok())
        .unwrap_or_else(|| "unknown".to_string())
}

pub(crate) fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

/// Send a prepared request and map non-accepted statuses to [`SinkError::Status`].
pub(crate) async fn send_checked(
    request: reqwest::RequestBuilder,
    accept: fn(u16) -> bool,
) -> Result<(), SinkError> {
    let response = request.send().await?;
    let status = response.status().as_u16();
    if accept(status) {
        return Ok(());
    }

    // Body truncated to 200 chars.
    let body: String = response
        .text()
        .await
        .unwrap_or_default()
        .chars()
        .take(200)
        .collect();
    Err(SinkError::Status { status, body })
}

pub fn is_success(status: u16) -> bool {
    (200..300).contains(&status)
}

//! QRadar: CEF lines over UDP syslog.

use std::net::SocketAddr;

use async_trait::async_trait;
use tokio::net::{lookup_host, UdpSocket};
use tokio::sync::OnceCell;

use super::{non_empty, SecuritySink, SinkError, PRODUCT_VERSION};
use crate::config::QRadarConfig;
use crate::delivery::{EventType, SinkEvent};

/// local0
const SYSLOG_FACILITY: u8 = 16;

pub struct QRadarSink {
    config: QRadarConfig,
    socket_v4: OnceCell<UdpSocket>,
    socket_v6: OnceCell<UdpSocket>,
}

impl QRadarSink {
    pub fn new(config: QRadarConfig) -> Self {
        Self {
            config,
            socket_v4: OnceCell::new(),
            socket_v6: OnceCell::new(),
        }
    }

    /// Local socket of the same address family as `target`.
    async fn socket_for(&self, target: &SocketAddr) -> Result<&UdpSocket, SinkError> {
        let (cell, local) = if target.is_ipv6() {
            (&self.socket_v6, "[::]:0")
        } else {
            (&self.socket_v4, "0.0.0.0:0")
        };
        cell.get_or_try_init(|| UdpSocket::bind(local))
            .await
            .map_err(SinkError::from)
    }
}

/// `<PRI>CEF:0|vendor|product|version|signature|name|severity|extension`
///
/// Severity and syslog priority follow the event risk level.
pub fn encode_cef(event: &SinkEvent, vendor: &str, product: &str, version: &str) -> String {
    let risk = event.risk_level();
    let priority = SYSLOG_FACILITY * 8 + risk.syslog_severity();

    let signature = match event.event_type {
        EventType::AuditLog => match event.status_code() {
            Some(status) if status >= 400 => "HTTP_ERROR",
            _ => "HTTP_REQUEST",
        },
        other => other.as_str(),
    };
    let name = format!("{} {}", event.method, event.path);

    let mut extension = vec![
        format!("src={}", escape_extension(&event.ip)),
        format!("request={}", escape_extension(&event.path)),
        format!("requestMethod={}", escape_extension(&event.method)),
    ];
    if let Some(status) = event.status_code() {
        extension.push(format!("cs1Label=StatusCode cs1={status}"));
    }
    extension.push(format!("cs2Label=RiskScore cs2={}", event.risk_score()));
    extension.push(format!("rt={}", event.timestamp.timestamp_millis()));
    extension.push(format!("msg={}", escape_extension(&event.message)));

    format!(
        "<{}>CEF:0|{}|{}|{}|{}|{}|{}|{}",
        priority,
        escape_header(vendor),
        escape_header(product),
        escape_header(version),
        signature,
        escape_header(&name),
        risk.cef_severity(),
        extension.join(" ")
    )
}

fn escape_header(value: &str) -> String {
    value.replace('\\', "\\\\").replace('|', "\\|")
}

fn escape_extension(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('=', "\\=")
        .replace('\r', "\\r")
        .replace('\n', "\\n")
}

#[async_trait]
impl SecuritySink for QRadarSink {
    fn name(&self) -> &'static str {
        "qradar"
    }

    fn is_enabled(&self) -> bool {
        self.config.enabled && non_empty(&self.config.host).is_some() && self.config.port > 0
    }

    async fn send(&self, event: &SinkEvent) -> Result<(), SinkError> {
        let Some(host) = non_empty(&self.config.host) else {
            return Err(SinkError::Disabled);
        };

        let line = encode_cef(
            event,
            &self.config.device_vendor,
            &self.config.device_product,
            PRODUCT_VERSION,
        );
        let target = lookup_host((host, self.config.port))
            .await?
            .next()
            .ok_or_else(|| SinkError::Transport(format!("no address for {host}")))?;

        self.socket_for(&target)
            .await?
            .send_to(line.as_bytes(), target)
            .await?;
        Ok(())
    }
}

//! Metrics collection and exposition.
//!
//! # Metrics
//! - `shield_admission_denied_total` (counter): denials by reason
//! - `shield_audit_records_total` (counter): emitted records by signed/unsigned
//! - `shield_audit_failures_total` (counter): records reduced to the fallback line
//! - `shield_sink_failures_total` (counter): SIEM delivery failures by sink
//! - `shield_webhook_dropped_total` (counter): events dropped before delivery
//! - `shield_webhook_deliveries_total` (counter): delivery outcomes
//! - `shield_session_mismatch_total` (counter): fingerprint drift by policy
//! - `shield_blocklist_size` (gauge): entries in the active blocklist
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade; without an installed
//!   recorder every call is a no-op
//! - Prometheus exposition is opt-in via `observability.metrics_enabled`

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_admission_denied(reason: &'static str) {
    metrics::counter!("shield_admission_denied_total", "reason" => reason).increment(1);
}

pub fn record_audit_record(signed: bool) {
    let signed = if signed { "true" } else { "false" };
    metrics::counter!("shield_audit_records_total", "signed" => signed).increment(1);
}

pub fn record_audit_failure() {
    metrics::counter!("shield_audit_failures_total").increment(1);
}

pub fn record_sink_failure(sink: &'static str) {
    metrics::counter!("shield_sink_failures_total", "sink" => sink).increment(1);
}

pub fn record_webhook_dropped(reason: &'static str) {
    metrics::counter!("shield_webhook_dropped_total", "reason" => reason).increment(1);
}

pub fn record_webhook_delivery(outcome: &'static str) {
    metrics::counter!("shield_webhook_deliveries_total", "outcome" => outcome).increment(1);
}

pub fn record_session_mismatch(invalidated: bool) {
    let invalidated = if invalidated { "true" } else { "false" };
    metrics::counter!("shield_session_mismatch_total", "invalidated" => invalidated).increment(1);
}

pub fn record_blocklist_size(size: usize) {
    metrics::gauge!("shield_blocklist_size").set(size as f64);
}

pub fn record_webhook_dropped_many(reason: &'static str, count: u64) {
    metrics::counter!("shield_webhook_dropped_total", "reason" => reason).increment(count);
}

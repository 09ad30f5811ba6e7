//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! audit engine      → tracing target `audit_log` (one JSON line per request)
//! admission control → tracing target `active_defense`
//! every subsystem   → metrics.rs counters/gauges → Prometheus scrape
//! ```
//!
//! # Design Decisions
//! - `RUST_LOG` overrides the configured level
//! - No recorder installed means metric calls are no-ops

pub mod logging;
pub mod metrics;

pub use logging::{init_logging, AUDIT_TARGET, DEFENSE_TARGET};

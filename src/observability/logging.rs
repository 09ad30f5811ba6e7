//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber
//! - Route audit lines to the dedicated `audit_log` target
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - JSON format for production, pretty format for development
//! - `RUST_LOG` wins over the configured level

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::config::ObservabilityConfig;

/// Target carrying one signed JSON audit record per request.
pub const AUDIT_TARGET: &str = "audit_log";

/// Target carrying admission denials.
pub const DEFENSE_TARGET: &str = "active_defense";

/// Default directives when `RUST_LOG` is unset.
pub fn default_directives(level: &str) -> String {
    format!(
        "request_shield={level},{AUDIT_TARGET}=info,{DEFENSE_TARGET}={level},tower_http={level}"
    )
}

/// Install the global subscriber. Calling twice is harmless; the second call is ignored.
pub fn init_logging(config: &ObservabilityConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(&config.log_level)));

    let registry = tracing_subscriber::registry().with(filter);
    let result = if config.json_logs {
        registry.with(tracing_subscriber::fmt::layer().json()).try_init()
    } else {
        registry.with(tracing_subscriber::fmt::layer()).try_init()
    };

    if let Err(e) = result {
        eprintln!("tracing subscriber already installed: {e}");
    }
}

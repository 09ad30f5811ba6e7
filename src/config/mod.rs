//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ShieldConfig (validated, immutable)
//!     → Shield::from_config builds every component once
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; only the blocklist file is hot-reloaded
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    ActiveDefenseConfig, AdminConfig, DatadogConfig, GraylogConfig, KmsConfig, ListenerConfig,
    LoggingConfig, ObservabilityConfig, QRadarConfig, SessionConfig, ShieldConfig, SiemConfig,
    SplunkConfig, WebhookConfig,
};
pub use validation::ValidationError;

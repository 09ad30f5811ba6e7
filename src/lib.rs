//! Request-boundary security shield.
//!
//! Signed, PII-protected audit records; admission control (rate limit and
//! blocklist); SIEM fan-out with a bounded, retrying webhook queue; and a
//! session fingerprint guard.

pub mod admin;
pub mod audit;
pub mod config;
pub mod crypto;
pub mod delivery;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod resilience;
pub mod security;
pub mod session;
pub mod shield;
pub mod siem;

pub use config::schema::ShieldConfig;
pub use http::{protect, HttpServer};
pub use lifecycle::Shutdown;
pub use shield::{Shield, ShieldError};

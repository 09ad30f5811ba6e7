//! Session fingerprint guard.
//!
//! # Data Flow
//! ```text
//! request with session id
//!     → fingerprint.rs (SHA-256 over UA, Accept-Language, Accept-Encoding[, client ip])
//!     → guard.rs
//!         no stored fingerprint → register → NewSession
//!         equal                 → Valid
//!         different             → Mismatch (destroy session or flag only)
//! ```
//!
//! # Design Decisions
//! - Session state lives in a sharded map owned by the shield instance
//! - No eviction; sessions leave only via destroy or invalidation

pub mod fingerprint;
pub mod guard;

pub use fingerprint::{compute_fingerprint, resolve_client_ip};
pub use guard::{SessionGuard, SessionValidation};

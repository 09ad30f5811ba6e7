//! Audit record engine.
//!
//! # Data Flow
//! ```text
//! RequestView + ResponseView
//!     → record.rs (ordered fields, level from status)
//!     → anonymize.rs (mask client address)
//!     → pii.rs (encrypt sensitive values, pure transform)
//!     → engine.rs (canonical bytes → HMAC → integrity_hash)
//!     → one JSON line on the `audit_log` target
//! ```
//!
//! # Design Decisions
//! - Canonical form is compact JSON in insertion order
//! - `integrity_hash` is appended last and excluded from the signed bytes
//! - Emission never fails the request; errors become one fallback line

pub mod anonymize;
pub mod engine;
pub mod pii;
pub mod record;

use thiserror::Error;

pub use anonymize::anonymize_ip;
pub use engine::{verify_record, AuditEngine};
pub use pii::{protect_pii, SENSITIVE_KEYS};
pub use record::{AuditRecord, SignedAuditRecord, COMPONENT, EVENT_HTTP_ACCESS, SIGNATURE_FIELD};

#[derive(Debug, Error)]
pub enum AuditError {
    #[error("audit record serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("audit record has no integrity_hash")]
    MissingSignature,

    #[error("audit record is not a JSON object")]
    NotAnObject,
}

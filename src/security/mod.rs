//! Admission control subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request (client address):
//!     → blocklist.rs (snapshot membership; hit → 403)
//!     → rate_limit.rs (per-key token bucket; empty → 429 + retry hint)
//!     → Pass to protected handler
//! ```
//!
//! # Design Decisions
//! - State is owned by the shield instance and injected, never global
//! - Fail closed: a deny short-circuits before any handler runs
//! - Per-key atomicity comes from the sharded map, not a global lock

pub mod admission;
pub mod blocklist;
pub mod rate_limit;

pub use admission::{AdmissionControl, AdmissionDecision, Denial, DenialReason, RETRY_AFTER_HEADER};
pub use blocklist::{parse_blocklist, Blocklist, BlocklistError};
pub use rate_limit::{RateLimitDecision, RateLimiter};

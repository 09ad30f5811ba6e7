//! Resilience helpers for outbound delivery.
//!
//! # Data Flow
//! ```text
//! Webhook attempt fails:
//!     → backoff.rs (delay before the next attempt)
//!     → worker sleeps, then retries until the attempt budget is spent
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every external call has a deadline
//! - Only the webhook path retries; SIEM sinks log and drop

pub mod backoff;

pub use backoff::calculate_backoff;

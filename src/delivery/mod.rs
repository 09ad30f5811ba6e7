//! Event delivery subsystem.
//!
//! # Data Flow
//! ```text
//! Audit record / admission denial / session mismatch
//!     → event.rs (SinkEvent: type, time, actor, path, method, metadata)
//!     → siem::SiemDispatcher (inline, short timeouts, no retry)
//!     → webhook.rs (type filter → bounded queue → single worker → retry)
//! ```
//!
//! # Design Decisions
//! - The request path never waits on the webhook; a full queue drops
//! - Delivery is best-effort; queued events are lost on restart

pub mod event;
pub mod webhook;

pub use event::{EventType, RiskLevel, SinkEvent};
pub use webhook::{encode_webhook, NotifyOutcome, WebhookNotifier};

//! HTTP integration.
//!
//! # Data Flow
//! ```text
//! axum Request
//!     → view.rs (framework-neutral request/response views)
//!     → middleware.rs (audit → admission → session guard)
//!     → server.rs (demo routes, tracing, request IDs)
//!     → Send to client
//! ```

pub mod middleware;
pub mod server;
pub mod view;

pub use middleware::{protect, remote_addr};
pub use server::{build_router, HttpServer};
pub use view::{RequestView, ResponseView, UserIdentity};

//! Framework-neutral request and response views.
//!
//! The shield core only consumes these; `middleware.rs` builds them from
//! axum requests.

use std::time::Duration;

use axum::http::{HeaderMap, HeaderName, HeaderValue, Request};
use serde::{Deserialize, Serialize};

/// Authenticated principal attached by the host application.
///
/// Handlers insert it into request or response extensions; the audit
/// record then carries a `user` sub-record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub user_id: Option<String>,
    pub username: Option<String>,
    pub email: Option<String>,
}

impl UserIdentity {
    pub fn is_empty(&self) -> bool {
        self.user_id.is_none() && self.username.is_none() && self.email.is_none()
    }
}

#[derive(Debug, Clone, Default)]
pub struct RequestView {
    pub method: String,
    pub path: String,
    pub headers: HeaderMap,
    /// Raw transport address, without port.
    pub remote_addr: Option<String>,
    pub user: Option<UserIdentity>,
}

impl RequestView {
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            ..Default::default()
        }
    }

    /// Capture the parts of an axum request the shield needs.
    pub fn from_request<B>(request: &Request<B>, remote_addr: Option<String>) -> Self {
        Self {
            method: request.method().to_string(),
            path: request.uri().path().to_string(),
            headers: request.headers().clone(),
            remote_addr,
            user: request.extensions().get::<UserIdentity>().cloned(),
        }
    }

    pub fn with_remote_addr(mut self, addr: impl Into<String>) -> Self {
        self.remote_addr = Some(addr.into());
        self
    }

    /// Builder-style header insert; invalid names or values are skipped.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            self.headers.insert(name, value);
        }
        self
    }

    pub fn with_user(mut self, user: UserIdentity) -> Self {
        self.user = Some(user);
        self
    }

    /// Header value as UTF-8; non-UTF-8 values read as absent.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn user_agent(&self) -> Option<&str> {
        self.header("user-agent")
    }

    /// Address used for admission and event reporting.
    pub fn client_key(&self) -> &str {
        self.remote_addr.as_deref().unwrap_or("unknown")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseView {
    pub status: u16,
    pub duration: Duration,
}

impl ResponseView {
    pub fn new(status: u16, duration: Duration) -> Self {
        Self { status, duration }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    #[test]
    fn test_from_request() {
        let mut request = Request::builder()
            .method("POST")
            .uri("/login?next=/home")
            .header("User-Agent", "curl/8.0")
            .body(Body::empty())
            .unwrap();
        request.extensions_mut().insert(UserIdentity {
            username: Some("alice".into()),
            ..Default::default()
        });

        let view = RequestView::from_request(&request, Some("192.168.1.10".into()));
        assert_eq!(view.method, "POST");
        assert_eq!(view.path, "/login");
        assert_eq!(view.user_agent(), Some("curl/8.0"));
        assert_eq!(view.client_key(), "192.168.1.10");
        assert_eq!(view.user.unwrap().username.as_deref(), Some("alice"));
    }

    #[test]
    fn test_missing_remote_addr() {
        assert_eq!(RequestView::new("GET", "/").client_key(), "unknown");
    }
}

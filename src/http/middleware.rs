//! Axum middleware around the shield.
//!
//! Layer order, outermost first:
//! audit → admission → session guard → handler.
//! Denied requests are therefore still audited.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Body,
    extract::{ConnectInfo, Request, State},
    http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode},
    middleware::{from_fn_with_state, Next},
    response::{IntoResponse, Response},
    Router,
};

use crate::http::view::{RequestView, ResponseView, UserIdentity};
use crate::security::{AdmissionDecision, Denial};
use crate::session::SessionValidation;
use crate::shield::Shield;

/// Wrap a router with the full shield stack.
pub fn protect<S>(router: Router<S>, shield: Arc<Shield>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router
        .layer(from_fn_with_state(shield.clone(), session_middleware))
        .layer(from_fn_with_state(shield.clone(), admission_middleware))
        .layer(from_fn_with_state(shield, audit_middleware))
}

/// Peer address (without port) recorded by `into_make_service_with_connect_info`.
pub fn remote_addr<B>(request: &axum::http::Request<B>) -> Option<String> {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
}

/// Times the exchange and hands it to the shield once the response exists.
///
/// The inner stack runs on its own task, so a client disconnect does not
/// cancel the bookkeeping. Record building and delivery run on a second task.
pub async fn audit_middleware(State(shield): State<Arc<Shield>>, request: Request, next: Next) -> Response {
    let started = Instant::now();
    let mut view = RequestView::from_request(&request, remote_addr(&request));

    let exchange = tokio::spawn(async move {
        let response = next.run(request).await;

        if view.user.is_none() {
            view.user = response.extensions().get::<UserIdentity>().cloned();
        }
        let completed = ResponseView::new(response.status().as_u16(), started.elapsed());
        tokio::spawn(async move {
            shield.complete(view, completed).await;
        });
        response
    });

    match exchange.await {
        Ok(response) => response,
        Err(e) => {
            tracing::error!(error = %e, "Request task failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

pub async fn admission_middleware(State(shield): State<Arc<Shield>>, request: Request, next: Next) -> Response {
    let mut view = RequestView::new(request.method().as_str(), request.uri().path());
    view.remote_addr = remote_addr(&request);

    match shield.admit(&view) {
        AdmissionDecision::Allow => next.run(request).await,
        AdmissionDecision::Deny(denial) => denial_response(&denial),
    }
}

/// Enforces the fingerprint bound to the session cookie.
///
/// An invalidated session is answered with 401 and an expired cookie; a
/// flag-only mismatch passes through.
pub async fn session_middleware(State(shield): State<Arc<Shield>>, request: Request, next: Next) -> Response {
    let cookie_name = shield.session_cookie_name();
    let session_id = cookie_value(request.headers(), cookie_name);
    let view = RequestView::from_request(&request, remote_addr(&request));

    match shield.check_session(session_id.as_deref(), &view) {
        Some(SessionValidation::Mismatch { invalidated: true }) => {
            let mut response = (StatusCode::UNAUTHORIZED, "Session invalidated").into_response();
            if let Ok(value) = HeaderValue::from_str(&expired_cookie(cookie_name)) {
                response.headers_mut().insert(header::SET_COOKIE, value);
            }
            response
        }
        _ => next.run(request).await,
    }
}

/// Render a denial as a plain-text response.
pub fn denial_response(denial: &Denial) -> Response {
    let status = StatusCode::from_u16(denial.status).unwrap_or(StatusCode::FORBIDDEN);
    let mut response = Response::new(Body::from(denial.message));
    *response.status_mut() = status;

    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    for (name, value) in &denial.headers {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            headers.insert(name, value);
        }
    }
    response
}

/// Value of the named cookie across all `Cookie` headers.
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_string())
        .filter(|v| !v.is_empty())
}

pub fn session_cookie(name: &str, session_id: &str) -> String {
    format!("{name}={session_id}; Path=/; HttpOnly; SameSite=Strict")
}

pub fn expired_cookie(name: &str) -> String {
    format!("{name}=; Path=/; HttpOnly; SameSite=Strict; Max-Age=0")
}

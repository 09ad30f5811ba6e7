//! Demo host application.
//!
//! # Responsibilities
//! - Serve a small session-based app (login, account, logout)
//! - Wrap it in the shield stack plus tracing and request IDs
//! - Shut down gracefully on the shared shutdown signal

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tokio::net::TcpListener;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::ShieldConfig;
use crate::http::middleware::{cookie_value, expired_cookie, protect, remote_addr, session_cookie};
use crate::http::view::{RequestView, UserIdentity};
use crate::lifecycle::Shutdown;
use crate::shield::Shield;

/// HTTP server for the protected demo app.
pub struct HttpServer {
    router: Router,
    shutdown: Shutdown,
}

impl HttpServer {
    pub fn new(shield: Arc<Shield>, config: &ShieldConfig, shutdown: Shutdown) -> Self {
        let timeout = Duration::from_secs(config.listener.request_timeout_secs);
        Self {
            router: build_router(shield, timeout),
            shutdown,
        }
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(self, listener: TcpListener) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();
        let shutdown = self.shutdown;
        axum::serve(listener, app)
            .with_graceful_shutdown(async move { shutdown.wait().await })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Demo routes wrapped in the shield and the transport layers.
#[allow(deprecated)]
pub fn build_router(shield: Arc<Shield>, request_timeout: Duration) -> Router {
    let routes = Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/login", post(login))
        .route("/account", get(account))
        .route("/logout", post(logout))
        .with_state(shield.clone())
        .layer(TimeoutLayer::new(request_timeout));

    protect(routes, shield)
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}

async fn index() -> &'static str {
    "request-shield demo"
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

/// Opens a session bound to the caller's fingerprint.
///
/// `X-Username` and `X-User-Email` stand in for real credentials.
async fn login(State(shield): State<Arc<Shield>>, request: Request) -> Response {
    let view = RequestView::from_request(&request, remote_addr(&request));
    let username = view.header("x-username").unwrap_or("demo").to_string();
    let identity = UserIdentity {
        user_id: Some(uuid::Uuid::new_v4().to_string()),
        username: Some(username.clone()),
        email: view.header("x-user-email").map(str::to_string),
    };

    let session_id = shield.open_session(&view);
    let mut response = Json(json!({
        "status": "logged_in",
        "username": username,
        "session_guard": session_id.is_some(),
    }))
    .into_response();

    if let Some(session_id) = session_id {
        let cookie = session_cookie(shield.session_cookie_name(), &session_id);
        if let Ok(value) = HeaderValue::from_str(&cookie) {
            response.headers_mut().insert(header::SET_COOKIE, value);
        }
    }
    response.extensions_mut().insert(identity);
    response
}

async fn account(State(shield): State<Arc<Shield>>, request: Request) -> Response {
    let session_id = cookie_value(request.headers(), shield.session_cookie_name());
    let live = match (session_id.as_deref(), shield.session_guard()) {
        (Some(id), Some(guard)) => guard.has_session(id),
        _ => false,
    };
    if !live {
        return (StatusCode::UNAUTHORIZED, "Login required").into_response();
    }
    Json(json!({ "account": "ok" })).into_response()
}

async fn logout(State(shield): State<Arc<Shield>>, request: Request) -> Response {
    let cookie_name = shield.session_cookie_name();
    if let Some(session_id) = cookie_value(request.headers(), cookie_name) {
        shield.destroy_session(&session_id);
    }
    let mut response = StatusCode::NO_CONTENT.into_response();
    if let Ok(value) = HeaderValue::from_str(&expired_cookie(cookie_name)) {
        response.headers_mut().insert(header::SET_COOKIE, value);
    }
    response
}

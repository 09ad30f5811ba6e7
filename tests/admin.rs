//! Admin API behind bearer authentication.

use std::sync::Arc;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use request_shield::admin::{setup_admin_router, AdminState};
use request_shield::audit::AuditEngine;
use request_shield::config::SessionConfig;
use request_shield::delivery::WebhookNotifier;
use request_shield::security::{AdmissionControl, Blocklist};
use request_shield::siem::SiemDispatcher;
use request_shield::Shield;
use serde_json::Value;
use tower::ServiceExt;

const KEY: &str = "test-admin-key";

fn shield() -> Arc<Shield> {
    Shield::from_parts(
        AuditEngine::new(true, true, None, None),
        AdmissionControl::new(Arc::new(Blocklist::from_entries(["6.6.6.6"])), true, None),
        SiemDispatcher::new(Vec::new(), Duration::from_secs(1)),
        WebhookNotifier::disabled(),
        None,
        SessionConfig::default(),
    )
}

fn authed(method: &str, path: &str, body: Body) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(path)
        .header(header::AUTHORIZATION, format!("Bearer {KEY}"))
        .header(header::CONTENT_TYPE, "application/json")
        .body(body)
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_rejects_missing_or_wrong_key() {
    let app = setup_admin_router(AdminState::new(shield(), KEY));

    let anonymous = Request::builder().uri("/admin/status").body(Body::empty()).unwrap();
    let response = app.clone().oneshot(anonymous).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let wrong = Request::builder()
        .uri("/admin/status")
        .header(header::AUTHORIZATION, "Bearer nope")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(wrong).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_status_report() {
    let app = setup_admin_router(AdminState::new(shield(), KEY));

    let response = app
        .oneshot(authed("GET", "/admin/status", Body::empty()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let status = json_body(response).await;
    assert_eq!(status["admission"]["blocked_ips"], 1);
    assert_eq!(status["audit"]["signed"], false);
    assert_eq!(status["webhook"]["enabled"], false);
    assert_eq!(status["sessions"]["guard_enabled"], false);
}

#[tokio::test]
async fn test_replace_blocklist() {
    let shield = shield();
    let app = setup_admin_router(AdminState::new(shield.clone(), KEY));

    let response = app
        .clone()
        .oneshot(authed(
            "PUT",
            "/admin/blocklist",
            Body::from(r#"{"entries":["1.1.1.1"," 2.2.2.2 ",""]}"#),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["count"], 2);

    assert!(shield.blocklist().is_blocked("2.2.2.2"));
    assert!(!shield.blocklist().is_blocked("6.6.6.6"));

    let response = app
        .oneshot(authed("GET", "/admin/blocklist", Body::empty()))
        .await
        .unwrap();
    assert_eq!(
        json_body(response).await["entries"],
        serde_json::json!(["1.1.1.1", "2.2.2.2"])
    );
}

#[tokio::test]
async fn test_sessions_summary() {
    let app = setup_admin_router(AdminState::new(shield(), KEY));

    let response = app
        .oneshot(authed("GET", "/admin/sessions", Body::empty()))
        .await
        .unwrap();
    let summary = json_body(response).await;
    assert_eq!(summary["guard_enabled"], false);
    assert_eq!(summary["active_sessions"], 0);
}

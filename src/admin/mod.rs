//! Bearer-authenticated admin API.

pub mod auth;
pub mod handlers;

use std::sync::Arc;

use axum::{
    middleware,
    routing::get,
    Router,
};

use self::auth::admin_auth_middleware;
use self::handlers::*;
use crate::shield::Shield;

#[derive(Clone)]
pub struct AdminState {
    pub shield: Arc<Shield>,
    pub api_key: Arc<str>,
}

impl AdminState {
    pub fn new(shield: Arc<Shield>, api_key: &str) -> Self {
        Self {
            shield,
            api_key: Arc::from(api_key),
        }
    }
}

pub fn setup_admin_router(state: AdminState) -> Router {
    Router::new()
        .route("/admin/status", get(get_status))
        .route("/admin/blocklist", get(get_blocklist).put(put_blocklist))
        .route("/admin/sessions", get(get_sessions))
        .layer(middleware::from_fn_with_state(state.clone(), admin_auth_middleware))
        .with_state(state)
}

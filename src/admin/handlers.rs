use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};

use crate::admin::AdminState;
use crate::shield::ShieldStatus;

#[derive(Debug, Serialize, Deserialize)]
pub struct BlocklistBody {
    pub entries: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct BlocklistUpdated {
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct SessionSummary {
    pub guard_enabled: bool,
    pub active_sessions: usize,
    pub fingerprinted: usize,
}

pub async fn get_status(State(state): State<AdminState>) -> Json<ShieldStatus> {
    Json(state.shield.status_report())
}

pub async fn get_blocklist(State(state): State<AdminState>) -> Json<BlocklistBody> {
    Json(BlocklistBody {
        entries: state.shield.blocklist().sorted_entries(),
    })
}

/// Replace the whole blocklist. Blank entries are ignored.
pub async fn put_blocklist(
    State(state): State<AdminState>,
    Json(body): Json<BlocklistBody>,
) -> (StatusCode, Json<BlocklistUpdated>) {
    let entries = body
        .entries
        .into_iter()
        .map(|e| e.trim().to_string())
        .filter(|e| !e.is_empty())
        .collect();
    let count = state.shield.blocklist().replace(entries);
    tracing::info!(count, "Blocklist replaced via admin API");
    (StatusCode::OK, Json(BlocklistUpdated { count }))
}

pub async fn get_sessions(State(state): State<AdminState>) -> Json<SessionSummary> {
    let guard = state.shield.session_guard();
    Json(SessionSummary {
        guard_enabled: guard.is_some(),
        active_sessions: guard.map(|g| g.session_count()).unwrap_or(0),
        fingerprinted: guard.map(|g| g.fingerprinted_count()).unwrap_or(0),
    })
}

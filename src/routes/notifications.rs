use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;

use crate::models::Notification;
use crate::state::AppState;

const DEFAULT_LIMIT: usize = 20;

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(list_notifications).delete(clear_notifications))
}

#[derive(Debug, Deserialize)]
struct LimitParams {
    limit: Option<usize>,
}

/// Newest first.
async fn list_notifications(
    State(state): State<AppState>,
    Query(params): Query<LimitParams>,
) -> Json<Vec<Notification>> {
    Json(state.notifications.recent(params.limit.unwrap_or(DEFAULT_LIMIT)))
}

async fn clear_notifications(State(state): State<AppState>) -> StatusCode {
    state.notifications.clear();
    StatusCode::NO_CONTENT
}

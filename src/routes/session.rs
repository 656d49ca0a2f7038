use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::services::session_service::SessionStatus;
use crate::services::sync_service::SyncReport;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/sync", post(sync))
        .route("/status", get(status))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub user_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct SyncParams {
    #[serde(default)]
    pub force: bool,
}

/// Logs in and runs the first sync. The status body carries the report when a backend is configured.
async fn login(State(state): State<AppState>, Json(req): Json<LoginRequest>) -> Json<SessionStatus> {
    info!("POST /session/login - {}", req.user_id);
    state.session.login(req.user_id).await;
    Json(state.session.status(state.store.status()))
}

async fn logout(State(state): State<AppState>) -> StatusCode {
    info!("POST /session/logout");
    state.dashboard.unmount_all();
    state.session.logout();
    StatusCode::NO_CONTENT
}

async fn sync(
    State(state): State<AppState>,
    Query(params): Query<SyncParams>,
) -> Result<Json<SyncReport>, AppError> {
    info!("POST /session/sync - force: {}", params.force);
    Ok(Json(state.session.sync_now(params.force).await?))
}

/// Reading the status hands over any pending storage error, so the UI shows it once.
async fn status(State(state): State<AppState>) -> Json<SessionStatus> {
    let store = state.store.status();
    state.store.take_error();
    Json(state.session.status(store))
}

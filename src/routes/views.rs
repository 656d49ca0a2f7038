use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::AppError;
use crate::models::SentimentSnapshot;
use crate::services::dashboard_service::{MarketBoard, View};
use crate::services::polling_service::MountOutcome;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_views))
        .route("/market/board", get(market_board))
        .route("/sentiment/board", get(sentiment_board))
        .route("/:view", post(mount_view).delete(unmount_view))
}

#[derive(Debug, Deserialize)]
pub struct MountParams {
    pub key: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MountResponse {
    pub view: String,
    pub outcome: MountOutcome,
}

fn parse_view(raw: &str) -> Result<View, AppError> {
    View::from_str(raw).ok_or_else(|| AppError::Validation(format!("unknown view '{}'", raw)))
}

async fn list_views(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(state.dashboard.mounted_views())
}

async fn mount_view(
    State(state): State<AppState>,
    Path(view): Path<String>,
    Query(params): Query<MountParams>,
) -> Result<Json<MountResponse>, AppError> {
    let parsed = parse_view(&view)?;
    let outcome = state.dashboard.mount(parsed, params.key)?;
    info!("POST /views/{} - {:?}", view, outcome);
    Ok(Json(MountResponse {
        view: parsed.as_str().to_string(),
        outcome,
    }))
}

async fn unmount_view(State(state): State<AppState>, Path(view): Path<String>) -> Result<StatusCode, AppError> {
    let parsed = parse_view(&view)?;
    if state.dashboard.unmount(parsed) {
        info!("DELETE /views/{} - Stopped", view);
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound)
    }
}

async fn market_board(State(state): State<AppState>) -> Result<Json<MarketBoard>, AppError> {
    state.dashboard.market_board().map(Json).ok_or(AppError::NotFound)
}

async fn sentiment_board(State(state): State<AppState>) -> Json<Vec<SentimentSnapshot>> {
    Json(state.dashboard.sentiment_board())
}

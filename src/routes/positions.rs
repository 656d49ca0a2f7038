use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, put};
use axum::{Json, Router};
use serde::Serialize;
use tracing::{error, info};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{CreatePosition, PortfolioSummary, Position, UpdatePosition};
use crate::services::position_service;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_positions).post(create_position))
        .route("/:id", put(update_position).delete(delete_position))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioResponse {
    pub positions: Vec<Position>,
    pub summary: PortfolioSummary,
}

pub async fn list_positions(State(state): State<AppState>) -> Json<PortfolioResponse> {
    let (positions, summary) = position_service::list(&state.writer);
    Json(PortfolioResponse { positions, summary })
}

pub async fn create_position(
    State(state): State<AppState>,
    Json(input): Json<CreatePosition>,
) -> Result<(StatusCode, Json<Position>), AppError> {
    info!("POST /positions - Adding {} x {}", input.units, input.symbol);
    let position = position_service::create(&state.writer, input).await.map_err(|e| {
        error!("Failed to add position: {}", e);
        e
    })?;
    Ok((StatusCode::CREATED, Json(position)))
}

pub async fn update_position(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
    Json(input): Json<UpdatePosition>,
) -> Result<Json<Position>, AppError> {
    info!("PUT /positions/{} - Updating position", id);
    let updated = position_service::update(&state.writer, id, input).await.map_err(|e| {
        error!("Failed to update position {}: {}", id, e);
        e
    })?;
    Ok(Json(updated))
}

pub async fn delete_position(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    info!("DELETE /positions/{} - Removing position", id);
    position_service::delete(&state.writer, id).await.map_err(|e| {
        error!("Failed to delete position {}: {}", id, e);
        e
    })?;
    Ok(StatusCode::NO_CONTENT)
}

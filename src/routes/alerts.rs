use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use tracing::{error, info};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{CreateAlertRequest, PriceAlert, UpdateAlertRequest};
use crate::services::alert_service;
use crate::state::AppState;

// ==============================================================================
// Router
// ==============================================================================

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_alerts).post(create_alert))
        .route("/:id", put(update_alert).delete(delete_alert))
        .route("/:id/toggle", post(toggle_alert))
}

// ==============================================================================
// Handlers
// ==============================================================================

async fn list_alerts(State(state): State<AppState>) -> Json<Vec<PriceAlert>> {
    Json(alert_service::list(&state.writer))
}

async fn create_alert(
    State(state): State<AppState>,
    Json(req): Json<CreateAlertRequest>,
) -> Result<(StatusCode, Json<PriceAlert>), AppError> {
    info!("POST /alerts - {} {} {}", req.symbol, req.condition.as_str(), req.target_price);
    let alert = alert_service::create(&state.writer, req).await.map_err(|e| {
        error!("Failed to create alert: {}", e);
        e
    })?;
    Ok((StatusCode::CREATED, Json(alert)))
}

async fn update_alert(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateAlertRequest>,
) -> Result<Json<PriceAlert>, AppError> {
    info!("PUT /alerts/{} - Updating alert", id);
    Ok(Json(alert_service::update(&state.writer, id, req).await?))
}

async fn toggle_alert(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<PriceAlert>, AppError> {
    info!("POST /alerts/{}/toggle", id);
    Ok(Json(alert_service::toggle(&state.writer, id).await?))
}

async fn delete_alert(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    info!("DELETE /alerts/{} - Deleting alert", id);
    alert_service::delete(&state.writer, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use tracing::info;

use crate::errors::AppError;
use crate::models::{AllocationReport, Recommendation};
use crate::services::allocation_service;
use crate::state::AppState;
use crate::utils::parse_symbol;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_board))
        .route("/allocation", get(get_allocation))
        .route("/:symbol", get(get_recommendation))
}

/// The board the recommendations poller keeps fresh. Empty until it first runs.
async fn get_board(State(state): State<AppState>) -> Json<Vec<Recommendation>> {
    Json(state.dashboard.recommendation_board())
}

async fn get_recommendation(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> Result<Json<Recommendation>, AppError> {
    let symbol = parse_symbol(&symbol)?;
    info!("GET /recommendations/{} - Scoring", symbol);
    Ok(Json(state.recommendations.recommend(&symbol).await?))
}

async fn get_allocation(State(state): State<AppState>) -> Json<AllocationReport> {
    let positions = state.store.portfolio.positions();
    Json(allocation_service::analyze_allocation(&positions, &state.allocation))
}

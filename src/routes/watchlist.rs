use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{delete, get};
use axum::{Json, Router};
use tracing::{info, warn};

use crate::errors::AppError;
use crate::models::{AddWatchlistEntryRequest, WatchlistEntry, WatchlistEntryResponse};
use crate::services::watchlist_service;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_entries).post(add_entry))
        .route("/:symbol", delete(remove_entry))
}

/// Entries with fresh quotes. Falls back to the last polled prices when the provider is down.
pub async fn list_entries(State(state): State<AppState>) -> Json<Vec<WatchlistEntryResponse>> {
    let symbols = state.store.watchlist.symbols();
    let quotes = if symbols.is_empty() {
        Default::default()
    } else {
        match state.quotes.fetch_quotes(&symbols).await {
            Ok(quotes) => quotes,
            Err(e) => {
                warn!("Watchlist quotes unavailable, using last known prices: {}", e);
                state.dashboard.latest_quotes()
            }
        }
    };
    Json(watchlist_service::list(&state.writer, &quotes))
}

pub async fn add_entry(
    State(state): State<AppState>,
    Json(req): Json<AddWatchlistEntryRequest>,
) -> Result<(StatusCode, Json<WatchlistEntry>), AppError> {
    info!("POST /watchlist - Adding {}", req.symbol);
    let entry = watchlist_service::add(&state.writer, &req.symbol).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

pub async fn remove_entry(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> Result<StatusCode, AppError> {
    info!("DELETE /watchlist/{} - Removing", symbol);
    watchlist_service::remove(&state.writer, &symbol).await?;
    Ok(StatusCode::NO_CONTENT)
}

use std::collections::HashMap;

use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use tracing::info;

use crate::errors::AppError;
use crate::models::{NewsItem, NewsQueryParams, Quote};
use crate::services::news_service::DEFAULT_NEWS_LIMIT;
use crate::state::AppState;
use crate::utils::parse_symbol;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_quotes))
        .route("/:symbol/news", get(get_symbol_news))
}

#[derive(Debug, Deserialize)]
pub struct QuotesQuery {
    /// Comma-separated, e.g. `AAPL,MSFT`.
    pub symbols: String,
}

/// One entry per requested symbol; unknown ones come back with price 0.
pub async fn get_quotes(
    State(state): State<AppState>,
    Query(query): Query<QuotesQuery>,
) -> Result<Json<HashMap<String, Quote>>, AppError> {
    let symbols: Vec<&str> = query.symbols.split(',').filter(|s| !s.trim().is_empty()).collect();
    if symbols.is_empty() {
        return Err(AppError::Validation("symbols must not be empty".into()));
    }
    info!("GET /quotes - {} symbol(s)", symbols.len());
    Ok(Json(state.quotes.fetch_quotes(&symbols).await?))
}

pub async fn get_symbol_news(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
    Query(params): Query<NewsQueryParams>,
) -> Result<Json<Vec<NewsItem>>, AppError> {
    let symbol = parse_symbol(&symbol)?;
    let limit = params.limit.unwrap_or(DEFAULT_NEWS_LIMIT);
    info!("GET /quotes/{}/news - limit {}", symbol, limit);
    Ok(Json(state.news.fetch_news(&symbol, limit).await))
}

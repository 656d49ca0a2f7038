use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::routes::{alerts, health, notifications, positions, quotes, recommendations, session, views, watchlist};
use crate::state::AppState;

pub fn create_app(state: AppState) -> Router {
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

    Router::<AppState>::new()
        .nest("/health", health::router())
        .nest("/api/positions", positions::router())
        .nest("/api/watchlist", watchlist::router())
        .nest("/api/alerts", alerts::router())
        .nest("/api/quotes", quotes::router())
        .nest("/api/recommendations", recommendations::router())
        .nest("/api/notifications", notifications::router())
        .nest("/api/session", session::router())
        .nest("/api/views", views::router())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

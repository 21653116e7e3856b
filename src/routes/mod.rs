//! HTTP routes

pub mod session;

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};

use crate::cache::CacheStats;
use crate::AppState;

/// Session, health and booking routes.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/health/cache", get(cache_stats))
        .route(
            "/session",
            post(session::create).get(session::current).delete(session::end),
        )
        .merge(crate::booking::router())
}

async fn health() -> &'static str {
    "ok"
}

async fn cache_stats(State(state): State<AppState>) -> Json<CacheStats> {
    Json(state.cache.stats())
}

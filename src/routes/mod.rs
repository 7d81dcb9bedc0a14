//! Route modules for the highlighter server

pub mod health;
pub mod highlights;
pub mod pages;
pub mod preferences;

use axum::{routing::get, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the full application router
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health::health_check))
        .route("/api/v1/health", get(health::health_check))
        .nest("/api/v1/highlights", highlights::router())
        .nest("/api/v1/preferences", preferences::router())
        .nest("/api/v1/pages", pages::router())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

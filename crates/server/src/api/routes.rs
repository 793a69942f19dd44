use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::middleware::metrics_middleware;
use super::{handlers, history, sessions};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // API routes
    let api_routes = Router::new()
        // Health and config
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        // Score history
        .route("/history", get(history::get_history))
        // Sessions
        .route("/sessions", post(sessions::create_session))
        .route(
            "/sessions/{id}",
            get(sessions::get_session).delete(sessions::delete_session),
        )
        .route("/sessions/{id}/start", post(sessions::start_session))
        .route("/sessions/{id}/guess", post(sessions::submit_guess))
        .route("/sessions/{id}/skip", post(sessions::skip_round))
        .route("/sessions/{id}/clue", post(sessions::reveal_clue))
        .route("/sessions/{id}/advance", post(sessions::advance))
        .route("/sessions/{id}/preference", post(sessions::record_preference))
        .route("/sessions/{id}/reset", post(sessions::reset_session))
        .with_state(state);

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/metrics", get(handlers::metrics))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

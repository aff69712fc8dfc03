//! API route definitions

use axum::routing::delete;
use axum::routing::get;
use axum::routing::post;
use axum::Router;

use super::handlers;
use super::handlers::AppState;

/// Create RESTful API router, mounted under `/api`
pub fn api_routes(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health))
        // Question answering
        .route("/query/stream", post(handlers::query_stream))
        .route("/query/documents", post(handlers::query_documents))
        // Conversation sessions
        .route("/session/:session_id", delete(handlers::clear_session))
        .with_state(state)
}

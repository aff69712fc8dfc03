/// API request handlers
use std::sync::Arc;

use axum::Json;
use chrono::Utc;

use crate::api::types::HealthResponse;
use crate::rag::RagService;

pub mod query;
pub mod session;

pub use query::*;
pub use session::*;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub rag: Arc<RagService>,
}

impl AppState {
    pub fn new(rag: Arc<RagService>) -> Self {
        Self { rag }
    }
}

/// Health check handler
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: Utc::now().to_rfc3339(),
    })
}

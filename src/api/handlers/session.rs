/// Session handlers
use axum::extract::Path;
use axum::extract::State;
use axum::Json;
use tracing::info;

use super::AppState;
use crate::api::types::ClearSessionResponse;

/// Forget a session's history (DELETE /api/session/:session_id)
pub async fn clear_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Json<ClearSessionResponse> {
    let cleared = state.rag.sessions().clear(&session_id);
    info!("DELETE /api/session/{} (existed: {})", session_id, cleared);
    Json(ClearSessionResponse {
        success: true,
        session_id,
        cleared,
    })
}

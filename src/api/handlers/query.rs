/// Question-answering handlers
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::sse::KeepAlive;
use axum::response::sse::Sse;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::Json;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::info;
use tracing::warn;
use uuid::Uuid;

use super::AppState;
use crate::api::sse;
use crate::api::types::DocumentsRequest;
use crate::api::types::DocumentsResponse;
use crate::api::types::ErrorResponse;
use crate::api::types::StreamRequest;
use crate::errors::Result;
use crate::errors::WooError;
use crate::rag::MetadataFilterBuilder;
use crate::rag::Query;

/// Unreadable or non-JSON bodies are validation errors too
fn accept(body: std::result::Result<Json<Value>, JsonRejection>) -> Result<Value> {
    body.map(|Json(value)| value)
        .map_err(|e| WooError::Validation(format!("Invalid request: {}", e.body_text())))
}

/// Decode a body ourselves so shape errors become validation errors
fn decode<T: DeserializeOwned>(body: Value) -> Result<T> {
    serde_json::from_value(body).map_err(|e| WooError::Validation(format!("Invalid request: {e}")))
}

fn into_query(request: StreamRequest) -> Result<Query> {
    if request.query.trim().is_empty() {
        return Err(WooError::Validation("Query is required".to_string()));
    }
    let filter = request
        .filters
        .as_ref()
        .map(MetadataFilterBuilder::from_params)
        .transpose()?
        .map(|f| f.to_filter());

    Ok(Query {
        text: request.query,
        session_id: request
            .session_id
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| Uuid::new_v4().to_string()),
        filter,
    })
}

/// Streamed answer (POST /api/query/stream)
pub async fn query_stream(
    State(state): State<AppState>,
    body: std::result::Result<Json<Value>, JsonRejection>,
) -> Response {
    let query = match accept(body)
        .and_then(decode::<StreamRequest>)
        .and_then(into_query)
    {
        Ok(query) => query,
        Err(e) => {
            warn!("Rejected stream request: {}", e);
            return (StatusCode::BAD_REQUEST, Json(ErrorResponse::new(&e))).into_response();
        }
    };
    info!("POST /api/query/stream: session {}", query.session_id);

    let rx = state.rag.stream_answer(query);
    Sse::new(sse::event_stream(rx))
        .keep_alive(KeepAlive::default())
        .into_response()
}

/// Passages and documents without generation (POST /api/query/documents)
pub async fn query_documents(
    State(state): State<AppState>,
    body: std::result::Result<Json<Value>, JsonRejection>,
) -> Json<DocumentsResponse> {
    let request: DocumentsRequest = match accept(body).and_then(decode) {
        Ok(request) => request,
        Err(e) => {
            warn!("Rejected documents request: {}", e);
            return Json(DocumentsResponse::failure(&e));
        }
    };
    info!("POST /api/query/documents: {}", request.query);

    let params = request.filters.unwrap_or_default();
    match state.rag.retrieve_documents(&request.query, &params).await {
        Ok(result) => Json(DocumentsResponse::success(request.query, result)),
        Err(e) => {
            warn!("Documents query failed: {}", e);
            Json(DocumentsResponse::failure(&e))
        }
    }
}

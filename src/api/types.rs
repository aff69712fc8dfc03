//! API request and response types

use serde::Deserialize;
use serde::Serialize;

use crate::errors::WooError;
use crate::models::ChunkView;
use crate::models::DocumentView;
use crate::rag::DocumentsResult;
use crate::rag::FilterParams;

/// Body of `POST /api/query/stream`
#[derive(Debug, Clone, Deserialize)]
pub struct StreamRequest {
    pub query: String,
    /// A fresh id is assigned when absent
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub filters: Option<FilterParams>,
}

/// Body of `POST /api/query/documents`
#[derive(Debug, Clone, Deserialize)]
pub struct DocumentsRequest {
    pub query: String,
    #[serde(default)]
    pub filters: Option<FilterParams>,
}

/// Documents endpoint response. Failures keep the same shape with empty lists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentsResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub chunks: Vec<ChunkView>,
    pub documents: Vec<DocumentView>,
    pub total_chunks: usize,
    pub total_documents: usize,
}

impl DocumentsResponse {
    pub fn success(query: String, result: DocumentsResult) -> Self {
        Self {
            success: true,
            query: Some(query),
            error: None,
            total_chunks: result.chunks.len(),
            total_documents: result.documents.len(),
            chunks: result.chunks,
            documents: result.documents,
        }
    }

    pub fn failure(error: &WooError) -> Self {
        Self {
            success: false,
            query: None,
            error: Some(error.to_string()),
            chunks: Vec::new(),
            documents: Vec::new(),
            total_chunks: 0,
            total_documents: 0,
        }
    }
}

/// Structured failure for endpoints without a richer shape
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: &WooError) -> Self {
        Self {
            success: false,
            error: error.to_string(),
        }
    }
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ClearSessionResponse {
    pub success: bool,
    pub session_id: String,
    /// Whether the session existed
    pub cleared: bool,
}

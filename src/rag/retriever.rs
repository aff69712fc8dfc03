//! Threshold-gated semantic retrieval

use std::collections::HashSet;
use std::sync::Arc;

use tracing::debug;

use crate::embeddings::Embedder;
use crate::errors::Result;
use crate::errors::WooError;
use crate::models::SearchResult;
use crate::rag::filter::Filter;
use crate::vector_store::RawHit;
use crate::vector_store::VectorStore;

/// Similarity derived from cosine distance in [0, 2]
#[must_use]
pub fn distance_to_score(distance: f32) -> f32 {
    1.0 - distance / 2.0
}

/// Vector-store errors all surface as retrieval failures
fn as_retrieval_error(err: WooError) -> WooError {
    match err {
        WooError::Retrieval(_) => err,
        other => WooError::Retrieval(other.to_string()),
    }
}

/// Retriever for semantic search over the vector store
pub struct Retriever {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
}

impl Retriever {
    pub fn new(embedder: Arc<dyn Embedder>, store: Arc<dyn VectorStore>) -> Self {
        Self { embedder, store }
    }

    /// Embed `query`, fetch up to `limit` candidates matching `filter` and keep
    /// those scoring at least `min_score`, in store order.
    ///
    /// # Errors
    /// - `Embedding` when the query cannot be embedded
    /// - `Retrieval` when the vector store fails; no partial results
    pub async fn retrieve(
        &self,
        query: &str,
        filter: Option<&Filter>,
        limit: usize,
        min_score: f32,
    ) -> Result<Vec<SearchResult>> {
        debug!("Performing semantic search: {}", query);

        let embedding = self.embedder.embed(query).await?;
        let hits = self
            .store
            .query(&embedding, limit, filter)
            .await
            .map_err(as_retrieval_error)?;
        let candidates = hits.len();

        let mut seen = HashSet::new();
        let results: Vec<SearchResult> = hits
            .into_iter()
            .filter(|hit| seen.insert(hit.id.clone()))
            .map(|RawHit { id, content, metadata, distance }| SearchResult {
                id,
                content,
                metadata,
                score: distance_to_score(distance),
            })
            .filter(|result| result.score >= min_score)
            .collect();

        debug!(
            "Kept {} of {} candidates at min_score {}",
            results.len(),
            candidates,
            min_score
        );
        Ok(results)
    }

    /// Metadata-only listing; every passage is scored 1.0
    ///
    /// # Errors
    /// `Retrieval` when the vector store fails
    pub async fn lookup(&self, filter: Option<&Filter>, limit: usize) -> Result<Vec<SearchResult>> {
        let passages = self
            .store
            .get(filter, limit)
            .await
            .map_err(as_retrieval_error)?;

        Ok(passages
            .into_iter()
            .map(|passage| SearchResult {
                id: passage.id,
                content: passage.content,
                metadata: passage.metadata,
                score: 1.0,
            })
            .collect())
    }
}

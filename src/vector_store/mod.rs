//! Vector-store collaborator
//!
//! The retriever only sees [`VectorStore`]. Two backends:
//! - [`ChromaStore`]: Chroma REST API (the store the corpus is ingested into)
//! - [`MemoryStore`]: brute-force cosine search over a JSON snapshot, for
//!   local runs and tests

pub mod chroma;
pub mod memory;

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde::Serialize;

pub use chroma::ChromaStore;
pub use memory::MemoryStore;

use crate::config::AppConfig;
use crate::errors::Result;
use crate::models::Metadata;
use crate::rag::filter::Filter;

/// Supported vector-store backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VectorStoreProvider {
    Chroma,
    Memory,
}

/// Nearest-neighbour hit with its raw cosine distance in [0, 2]
#[derive(Debug, Clone, PartialEq)]
pub struct RawHit {
    pub id: String,
    pub content: String,
    pub metadata: Metadata,
    pub distance: f32,
}

/// Passage returned by a metadata-only listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredPassage {
    pub id: String,
    pub content: String,
    #[serde(default)]
    pub metadata: Metadata,
}

#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Up to `limit` nearest passages matching `filter`, closest first
    async fn query(
        &self,
        embedding: &[f32],
        limit: usize,
        filter: Option<&Filter>,
    ) -> Result<Vec<RawHit>>;

    /// Up to `limit` passages matching `filter`, in store order
    async fn get(&self, filter: Option<&Filter>, limit: usize) -> Result<Vec<StoredPassage>>;

    /// Number of passages in the collection
    async fn count(&self) -> Result<usize>;
}

/// Build the configured backend
pub fn from_config(config: &AppConfig) -> Result<Arc<dyn VectorStore>> {
    match config.vector_store.provider {
        VectorStoreProvider::Chroma => Ok(Arc::new(ChromaStore::from_config(config)?)),
        VectorStoreProvider::Memory => match &config.vector_store.snapshot_path {
            Some(path) => Ok(Arc::new(MemoryStore::load(path)?)),
            None => {
                tracing::warn!("No snapshot_path configured, starting with an empty in-memory store");
                Ok(Arc::new(MemoryStore::default()))
            }
        },
    }
}

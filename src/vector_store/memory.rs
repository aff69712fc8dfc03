//! In-memory [`VectorStore`] for local runs and tests.
//!
//! Vector search is brute-force cosine distance over every stored passage.
//! The contents are fixed at construction, either from entries or from a JSON
//! snapshot (an array of `{id, content, metadata, embedding}` objects).

use std::path::Path;

use async_trait::async_trait;
use serde::Deserialize;
use serde::Serialize;

use super::RawHit;
use super::StoredPassage;
use super::VectorStore;
use crate::errors::Result;
use crate::models::Metadata;
use crate::rag::filter::Filter;

/// One stored passage with its embedding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryEntry {
    pub id: String,
    pub content: String,
    #[serde(default)]
    pub metadata: Metadata,
    pub embedding: Vec<f32>,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Vec<MemoryEntry>,
}

/// Cosine distance in [0, 2]. Mismatched or zero vectors count as orthogonal.
pub fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 1.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < f32::EPSILON {
        return 1.0;
    }
    (1.0 - dot / denom).clamp(0.0, 2.0)
}

impl MemoryStore {
    #[must_use]
    pub fn new(entries: Vec<MemoryEntry>) -> Self {
        Self { entries }
    }

    /// Load a JSON snapshot
    ///
    /// # Errors
    /// - IO errors reading the file
    /// - JSON errors for a malformed snapshot
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let entries: Vec<MemoryEntry> = serde_json::from_str(&raw)?;
        tracing::info!("Loaded {} passages from {}", entries.len(), path.display());
        Ok(Self::new(entries))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn matching<'a>(&'a self, filter: Option<&'a Filter>) -> impl Iterator<Item = &'a MemoryEntry> {
        self.entries
            .iter()
            .filter(move |entry| filter.map_or(true, |f| f.matches(&entry.metadata)))
    }
}

#[async_trait]
impl VectorStore for MemoryStore {
    async fn query(
        &self,
        embedding: &[f32],
        limit: usize,
        filter: Option<&Filter>,
    ) -> Result<Vec<RawHit>> {
        let mut hits: Vec<RawHit> = self
            .matching(filter)
            .map(|entry| RawHit {
                id: entry.id.clone(),
                content: entry.content.clone(),
                metadata: entry.metadata.clone(),
                distance: cosine_distance(embedding, &entry.embedding),
            })
            .collect();
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits.truncate(limit);
        Ok(hits)
    }

    async fn get(&self, filter: Option<&Filter>, limit: usize) -> Result<Vec<StoredPassage>> {
        Ok(self
            .matching(filter)
            .take(limit)
            .map(|entry| StoredPassage {
                id: entry.id.clone(),
                content: entry.content.clone(),
                metadata: entry.metadata.clone(),
            })
            .collect())
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.entries.len())
    }
}

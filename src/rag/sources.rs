//! Document-level citations from passage-level results

use std::collections::HashMap;

use crate::models::SearchResult;
use crate::models::Source;

/// Collapses passages of the same document into one [`Source`]
pub struct SourceDeduplicator;

impl SourceDeduplicator {
    /// One source per identity key: first-seen metadata, maximum score,
    /// first-seen order. Results with neither title nor url are skipped.
    #[must_use]
    pub fn dedupe(results: &[SearchResult]) -> Vec<Source> {
        Self::collapse(results.iter().map(Source::from_result).collect())
    }

    /// Same collapse over already-built sources; idempotent
    #[must_use]
    pub fn collapse(sources: Vec<Source>) -> Vec<Source> {
        let mut index: HashMap<String, usize> = HashMap::new();
        let mut collapsed: Vec<Source> = Vec::new();

        for source in sources {
            let key = source.identity_key().to_string();
            if key.is_empty() {
                continue;
            }
            match index.get(&key) {
                Some(&pos) => {
                    let kept = &mut collapsed[pos];
                    kept.relevance_score = kept.relevance_score.max(source.relevance_score);
                }
                None => {
                    index.insert(key, collapsed.len());
                    collapsed.push(source);
                }
            }
        }

        collapsed
    }
}

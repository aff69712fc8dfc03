//! Context assembly from retrieved passages

use crate::models::fields;
use crate::models::SearchResult;

/// Rendered context plus how many leading results it covers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledContext {
    pub text: String,
    pub used: usize,
}

impl AssembledContext {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.used == 0
    }
}

/// Assembler for creating prompt context from search results
pub struct ContextAssembler {
    max_context_chars: usize,
}

impl ContextAssembler {
    #[must_use]
    pub const fn new(max_context_chars: usize) -> Self {
        Self { max_context_chars }
    }

    /// Render results in retrieval order until the size bound is reached.
    /// The first block is always kept.
    #[must_use]
    pub fn assemble(&self, results: &[SearchResult]) -> AssembledContext {
        let mut text = String::new();
        let mut used = 0;

        for result in results {
            let block = Self::format_block(result);
            let separator = if text.is_empty() { 0 } else { 2 };
            if used > 0 && text.len() + separator + block.len() > self.max_context_chars {
                break;
            }
            if separator > 0 {
                text.push_str("\n\n");
            }
            text.push_str(&block);
            used += 1;
        }

        AssembledContext { text, used }
    }

    /// Format a single passage as a labelled block
    fn format_block(result: &SearchResult) -> String {
        format!(
            "Titel: {}\nURL: {}\nProvincie: {}\nDatum: {}\nType: {}\nInhoud: {}",
            result.title(),
            result.url(),
            result.field(fields::REGION),
            result.field(fields::DATE),
            result.field(fields::DOC_TYPE),
            result.content
        )
    }
}

impl Default for ContextAssembler {
    fn default() -> Self {
        Self::new(12_000)
    }
}

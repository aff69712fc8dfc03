//! Core data types shared by retrieval, generation and the HTTP surface

use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

/// Metadata attached to a passage in the vector store
pub type Metadata = serde_json::Map<String, Value>;

/// Metadata keys written by the ingestion side
pub mod fields {
    pub const TITLE: &str = "titel";
    pub const URL: &str = "url";
    pub const REGION: &str = "provincie";
    pub const DATE: &str = "datum";
    pub const DOC_TYPE: &str = "type";
    pub const FILE_TYPE: &str = "file_type";
    pub const FILE_NAME: &str = "file_name";
    pub const SUMMARY: &str = "publiekssamenvatting";
}

/// Read a metadata value as display text.
///
/// Missing keys and nulls become an empty string. `datum` is stored as UTC epoch
/// seconds and is rendered as a calendar date.
#[must_use]
pub fn metadata_text(metadata: &Metadata, key: &str) -> String {
    match metadata.get(key) {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) if key == fields::DATE => n
            .as_i64()
            .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
            .map_or_else(|| n.to_string(), |dt| dt.format("%Y-%m-%d").to_string()),
        Some(other) => other.to_string(),
    }
}

/// One retrieved passage
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    pub id: String,
    pub content: String,
    pub metadata: Metadata,
    /// Similarity in [0, 1], higher is better
    pub score: f32,
}

impl SearchResult {
    #[must_use]
    pub fn field(&self, key: &str) -> String {
        metadata_text(&self.metadata, key)
    }

    #[must_use]
    pub fn title(&self) -> String {
        self.field(fields::TITLE)
    }

    #[must_use]
    pub fn url(&self) -> String {
        self.field(fields::URL)
    }
}

/// Document-level citation derived from one or more passages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    #[serde(rename = "titel")]
    pub title: String,
    pub url: String,
    #[serde(rename = "provincie")]
    pub region: String,
    #[serde(rename = "datum")]
    pub date: String,
    #[serde(rename = "type")]
    pub doc_type: String,
    pub relevance_score: f32,
    #[serde(rename = "publiekssamenvatting", default)]
    pub summary: String,
}

impl Source {
    #[must_use]
    pub fn from_result(result: &SearchResult) -> Self {
        Self {
            title: result.title(),
            url: result.url(),
            region: result.field(fields::REGION),
            date: result.field(fields::DATE),
            doc_type: result.field(fields::DOC_TYPE),
            relevance_score: result.score,
            summary: result.field(fields::SUMMARY),
        }
    }

    /// Identity key: trimmed title, or the url when the title is blank
    #[must_use]
    pub fn identity_key(&self) -> &str {
        let title = self.title.trim();
        if title.is_empty() {
            self.url.trim()
        } else {
            title
        }
    }
}

/// Provenance fields exposed by the documents endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub url: String,
    #[serde(rename = "provincie")]
    pub region: String,
    #[serde(rename = "titel")]
    pub title: String,
    #[serde(rename = "datum")]
    pub date: String,
    #[serde(rename = "type")]
    pub doc_type: String,
    pub file_type: String,
    pub file_name: String,
    #[serde(rename = "publiekssamenvatting", skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

impl DocumentMetadata {
    /// Passage-level view, without the public summary
    #[must_use]
    pub fn for_chunk(result: &SearchResult) -> Self {
        Self {
            url: result.url(),
            region: result.field(fields::REGION),
            title: result.title(),
            date: result.field(fields::DATE),
            doc_type: result.field(fields::DOC_TYPE),
            file_type: result.field(fields::FILE_TYPE),
            file_name: result.field(fields::FILE_NAME),
            summary: None,
        }
    }

    /// Document-level view, including the public summary
    #[must_use]
    pub fn for_document(result: &SearchResult) -> Self {
        Self {
            summary: Some(result.field(fields::SUMMARY)),
            ..Self::for_chunk(result)
        }
    }
}

/// Passage as returned by the documents endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkView {
    pub id: String,
    pub content: String,
    pub relevance_score: f32,
    pub metadata: DocumentMetadata,
}

impl From<&SearchResult> for ChunkView {
    fn from(result: &SearchResult) -> Self {
        Self {
            id: result.id.clone(),
            content: result.content.clone(),
            relevance_score: result.score,
            metadata: DocumentMetadata::for_chunk(result),
        }
    }
}

/// Deduplicated document as returned by the documents endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentView {
    /// The document identity key (title, or url when untitled)
    pub id: String,
    pub metadata: DocumentMetadata,
    pub relevance_score: f32,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn result_with(metadata: Value) -> SearchResult {
        SearchResult {
            id: "chunk-1".to_string(),
            content: "Windturbines bij Deventer".to_string(),
            metadata: metadata.as_object().cloned().unwrap_or_default(),
            score: 0.8,
        }
    }

    #[test]
    fn test_epoch_date_rendered_as_calendar_date() {
        let result = result_with(json!({ "datum": 1_704_067_200 }));
        assert_eq!(result.field(fields::DATE), "2024-01-01");
    }

    #[test]
    fn test_string_date_kept_verbatim() {
        let result = result_with(json!({ "datum": "2023-05-17" }));
        assert_eq!(result.field(fields::DATE), "2023-05-17");
    }

    #[test]
    fn test_missing_fields_are_empty() {
        let result = result_with(json!({ "titel": null }));
        assert_eq!(result.title(), "");
        assert_eq!(result.url(), "");
    }

    #[test]
    fn test_identity_key_falls_back_to_url() {
        let source = Source::from_result(&result_with(json!({
            "titel": "   ",
            "url": "https://example.nl/besluit/1"
        })));
        assert_eq!(source.identity_key(), "https://example.nl/besluit/1");
    }

    #[test]
    fn test_source_wire_keys() {
        let source = Source::from_result(&result_with(json!({
            "titel": "Besluit wind",
            "url": "https://example.nl/1",
            "provincie": "overijssel",
            "type": "besluit"
        })));
        let value = serde_json::to_value(&source).unwrap();
        assert_eq!(value["titel"], "Besluit wind");
        assert_eq!(value["provincie"], "overijssel");
        assert_eq!(value["type"], "besluit");
        assert!(value.get("relevance_score").is_some());
    }

    #[test]
    fn test_chunk_view_omits_summary() {
        let result = result_with(json!({ "titel": "A", "publiekssamenvatting": "Kort" }));
        let chunk = serde_json::to_value(ChunkView::from(&result)).unwrap();
        assert!(chunk["metadata"].get("publiekssamenvatting").is_none());

        let doc = DocumentMetadata::for_document(&result);
        assert_eq!(doc.summary.as_deref(), Some("Kort"));
    }
}

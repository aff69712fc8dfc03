//! Pipeline facade: streamed answers and plain document retrieval

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::debug;
use tracing::info;

use crate::config::AppConfig;
use crate::embeddings::Embedder;
use crate::embeddings::EmbeddingClient;
use crate::errors::Result;
use crate::errors::WooError;
use crate::llm::ChatModel;
use crate::llm::LlmClient;
use crate::models::ChunkView;
use crate::models::DocumentMetadata;
use crate::models::DocumentView;
use crate::models::SearchResult;
use crate::models::Source;
use crate::rag::filter::FilterParams;
use crate::rag::filter::MetadataFilterBuilder;
use crate::rag::generator::GeneratorSettings;
use crate::rag::generator::StreamEvent;
use crate::rag::generator::StreamingAnswerGenerator;
use crate::rag::ContextAssembler;
use crate::rag::Query;
use crate::rag::Retriever;
use crate::rag::SessionStore;
use crate::vector_store;
use crate::vector_store::VectorStore;

/// Passages and their documents for one documents request
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentsResult {
    pub chunks: Vec<ChunkView>,
    pub documents: Vec<DocumentView>,
}

/// Complete RAG service
pub struct RagService {
    retriever: Arc<Retriever>,
    generator: Arc<StreamingAnswerGenerator>,
    sessions: Arc<SessionStore>,
    documents_limit: usize,
    min_score: f32,
}

impl RagService {
    /// Create a new RAG service with HTTP collaborators from the config
    ///
    /// # Errors
    /// - Embedding client configuration errors
    /// - Vector store configuration errors (unreadable snapshot)
    /// - LLM client configuration errors
    pub fn new(config: &AppConfig) -> Result<Self> {
        let embedder: Arc<dyn Embedder> = Arc::new(EmbeddingClient::from_config(config)?);
        let store = vector_store::from_config(config)?;
        let chat: Arc<dyn ChatModel> = Arc::new(LlmClient::from_config(config)?);
        Ok(Self::from_services(config, embedder, store, chat))
    }

    /// Create from existing collaborators
    #[must_use]
    pub fn from_services(
        config: &AppConfig,
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn VectorStore>,
        chat: Arc<dyn ChatModel>,
    ) -> Self {
        let retriever = Arc::new(Retriever::new(embedder, store));
        let sessions = Arc::new(SessionStore::new(
            config.conversation.max_turns,
            Duration::from_secs(config.conversation.session_timeout_secs),
        ));
        let generator = Arc::new(StreamingAnswerGenerator::new(
            Arc::clone(&retriever),
            chat,
            Arc::clone(&sessions),
            ContextAssembler::new(config.retrieval.max_context_chars),
            GeneratorSettings {
                retrieval_limit: config.retrieval.conversation_limit,
                min_score: config.retrieval.min_score,
                temperature: config.llm.temperature,
                max_tokens: config.llm.max_tokens,
                channel_capacity: config.conversation.channel_capacity,
            },
        ));

        info!(
            "RAG service ready (conversation_limit={}, documents_limit={}, min_score={})",
            config.retrieval.conversation_limit,
            config.retrieval.documents_limit,
            config.retrieval.min_score
        );

        Self {
            retriever,
            generator,
            sessions,
            documents_limit: config.retrieval.documents_limit,
            min_score: config.retrieval.min_score,
        }
    }

    /// Answer a question as an ordered event stream
    pub fn stream_answer(&self, query: Query) -> mpsc::Receiver<StreamEvent> {
        info!("Processing streamed query for session {}", query.session_id);
        self.generator.spawn(query)
    }

    /// Retrieve passages and their deduplicated documents without generation
    ///
    /// # Errors
    /// - `Validation` for an empty query, missing dates or a malformed filter
    /// - `Embedding` / `Retrieval` from the collaborators
    pub async fn retrieve_documents(
        &self,
        query: &str,
        params: &FilterParams,
    ) -> Result<DocumentsResult> {
        if query.trim().is_empty() {
            return Err(WooError::Validation("Query is required".to_string()));
        }
        params.require_dates()?;
        let filter = MetadataFilterBuilder::from_params(params)?.to_filter();

        let results = self
            .retriever
            .retrieve(query, Some(&filter), self.documents_limit, self.min_score)
            .await?;
        debug!("Documents query matched {} passages", results.len());

        Ok(DocumentsResult {
            chunks: results.iter().map(ChunkView::from).collect(),
            documents: group_documents(&results),
        })
    }

    #[must_use]
    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.sessions
    }

    #[must_use]
    pub fn retriever(&self) -> &Arc<Retriever> {
        &self.retriever
    }
}

/// One entry per document identity, first-seen metadata, best passage score
fn group_documents(results: &[SearchResult]) -> Vec<DocumentView> {
    let mut documents: Vec<DocumentView> = Vec::new();
    for result in results {
        let key = Source::from_result(result).identity_key().to_string();
        if key.is_empty() {
            continue;
        }

        match documents.iter_mut().find(|d| d.id == key) {
            Some(existing) => {
                existing.relevance_score = existing.relevance_score.max(result.score);
            }
            None => documents.push(DocumentView {
                id: key,
                metadata: DocumentMetadata::for_document(result),
                relevance_score: result.score,
            }),
        }
    }
    documents
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use serde_json::json;

    use super::*;
    use crate::llm::ChatMessage;
    use crate::llm::StreamingResponse;
    use crate::vector_store::memory::MemoryEntry;
    use crate::vector_store::MemoryStore;

    struct UnitEmbedder;

    #[async_trait]
    impl Embedder for UnitEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Ok(vec![1.0, 0.0])
        }
    }

    struct SilentChat;

    #[async_trait]
    impl ChatModel for SilentChat {
        async fn stream_chat(
            &self,
            _messages: &[ChatMessage],
            _temperature: f32,
            _max_tokens: u32,
        ) -> Result<StreamingResponse> {
            Ok(StreamingResponse::from_fragments(Vec::new()))
        }
    }

    fn entry(id: &str, title: &str, region: &str, datum: i64) -> MemoryEntry {
        MemoryEntry {
            id: id.to_string(),
            content: format!("inhoud {id}"),
            metadata: json!({
                "titel": title,
                "url": format!("https://woo.example.nl/{title}"),
                "provincie": region,
                "datum": datum,
                "publiekssamenvatting": format!("samenvatting {title}")
            })
            .as_object()
            .cloned()
            .unwrap(),
            embedding: vec![1.0, 0.0],
        }
    }

    fn service() -> RagService {
        let store = MemoryStore::new(vec![
            entry("c1", "Besluit wind", "Gelderland", 1_704_067_200),
            entry("c2", "Besluit wind", "Gelderland", 1_704_153_600),
            entry("c3", "Besluit water", "Utrecht", 1_704_067_200),
            entry("c4", "Oud besluit", "Gelderland", 946_684_800),
        ]);
        RagService::from_services(
            &AppConfig::default(),
            Arc::new(UnitEmbedder),
            Arc::new(store),
            Arc::new(SilentChat),
        )
    }

    fn params(provinces: Option<Vec<&str>>, start: &str, end: &str) -> FilterParams {
        FilterParams {
            provinces: provinces.map(|p| p.into_iter().map(String::from).collect()),
            start_date: Some(start.to_string()),
            end_date: Some(end.to_string()),
        }
    }

    #[tokio::test]
    async fn test_documents_grouped_by_title() {
        let result = service()
            .retrieve_documents("wind", &params(Some(vec!["Gelderland"]), "2024-01-01", "2024-12-31"))
            .await
            .unwrap();

        assert_eq!(result.chunks.len(), 2);
        assert_eq!(result.documents.len(), 1);
        assert_eq!(result.documents[0].id, "Besluit wind");
        assert_eq!(
            result.documents[0].metadata.summary.as_deref(),
            Some("samenvatting Besluit wind")
        );
        assert!(result.chunks[0].metadata.summary.is_none());
    }

    #[tokio::test]
    async fn test_end_date_is_inclusive() {
        // c2 is dated 2024-01-02 00:00 UTC
        let result = service()
            .retrieve_documents("wind", &params(None, "2024-01-02", "2024-01-02"))
            .await
            .unwrap();
        let ids: Vec<_> = result.chunks.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["c2"]);
    }

    #[tokio::test]
    async fn test_documents_validation() {
        let svc = service();
        let err = svc
            .retrieve_documents("  ", &params(None, "2024-01-01", "2024-12-31"))
            .await
            .unwrap_err();
        assert!(err.is_validation());

        let missing_end = FilterParams {
            end_date: None,
            ..params(None, "2024-01-01", "2024-12-31")
        };
        let err = svc.retrieve_documents("wind", &missing_end).await.unwrap_err();
        assert!(matches!(err, WooError::Validation(msg) if msg.contains("endDate")));

        let err = svc
            .retrieve_documents("wind", &params(None, "2024/01/01", "2024-12-31"))
            .await
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn test_stream_answer_with_empty_generation() {
        let mut rx = service().stream_answer(Query {
            text: "vraag".to_string(),
            session_id: "s".to_string(),
            filter: None,
        });
        let mut names = Vec::new();
        while let Some(event) = rx.recv().await {
            names.push(match event {
                StreamEvent::Chunk(_) => "chunk",
                StreamEvent::Sources { .. } => "sources",
                StreamEvent::Complete(_) => "complete",
                StreamEvent::Error(_) => "error",
            });
        }
        assert_eq!(names, vec!["sources", "complete"]);
    }
}

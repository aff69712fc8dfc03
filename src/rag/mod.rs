//! Cited question answering over the Woo corpus
//!
//! - Metadata filters lowered to the vector store's query language
//! - Threshold-gated semantic retrieval
//! - Context assembly and static Dutch prompts
//! - Bounded per-session conversation history
//! - Streaming generation with document-level citations
//!
//! # Examples
//!
//! ```rust,no_run
//! use wooverzicht::config::AppConfig;
//! use wooverzicht::rag::Query;
//! use wooverzicht::rag::RagService;
//! use wooverzicht::rag::StreamEvent;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AppConfig::load()?;
//!     let service = RagService::new(&config)?;
//!
//!     let mut events = service.stream_answer(Query {
//!         text: "Welke besluiten gaan over windenergie?".to_string(),
//!         session_id: "demo".to_string(),
//!         filter: None,
//!     });
//!     while let Some(event) = events.recv().await {
//!         if let StreamEvent::Chunk(text) = event {
//!             print!("{text}");
//!         }
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod context;
pub mod filter;
pub mod generator;
pub mod pipeline;
pub mod prompts;
pub mod retriever;
pub mod session;
pub mod sources;

pub use context::ContextAssembler;
pub use filter::Filter;
pub use filter::FilterParams;
pub use filter::MetadataFilter;
pub use filter::MetadataFilterBuilder;
pub use generator::CompletionMetadata;
pub use generator::GenerationState;
pub use generator::StreamEvent;
pub use generator::StreamingAnswerGenerator;
pub use pipeline::DocumentsResult;
pub use pipeline::RagService;
pub use retriever::Retriever;
pub use session::SessionStore;
pub use sources::SourceDeduplicator;

/// One streamed question
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub text: String,
    pub session_id: String,
    pub filter: Option<Filter>,
}

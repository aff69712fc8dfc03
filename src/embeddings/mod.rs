//! Query embedding
//!
//! Queries are embedded with the same model the ingestion side used to embed
//! the corpus. Two providers are supported:
//! - OpenAI (text-embedding-3-small, text-embedding-ada-002, etc.)
//! - Ollama (local models)
//!
//! # Examples
//!
//! ```rust,no_run
//! use wooverzicht::config::AppConfig;
//! use wooverzicht::embeddings::Embedder;
//! use wooverzicht::embeddings::EmbeddingClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AppConfig::load()?;
//!     let client = EmbeddingClient::from_config(&config)?;
//!
//!     let embedding = client.embed("Windturbines in Overijssel").await?;
//!     println!("Generated embedding with {} dimensions", embedding.len());
//!
//!     Ok(())
//! }
//! ```

pub mod client;

use async_trait::async_trait;
use serde::Deserialize;
use serde::Serialize;

pub use client::EmbeddingClient;

use crate::errors::Result;

/// Supported embedding providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProvider {
    /// `OpenAI` embeddings API
    #[serde(alias = "open_ai")]
    OpenAI,
    /// Ollama local embeddings
    Ollama,
}

/// Text to fixed-dimension vector
#[async_trait]
pub trait Embedder: Send + Sync {
    /// # Errors
    /// `WooError::Embedding` on transport, quota or response-shape failures
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

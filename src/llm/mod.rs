//! Chat-model collaborator: message types, the streaming trait and HTTP clients
//!
//! Two wire dialects are supported:
//! - OpenAI-compatible `/chat/completions` with server-sent `data:` frames
//! - Ollama `/api/chat` with newline-delimited JSON

pub mod client;
pub mod streaming;

use async_trait::async_trait;
use serde::Deserialize;
use serde::Serialize;

pub use client::LlmClient;
pub use streaming::StreamingResponse;

use crate::errors::Result;

/// Supported chat providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    #[serde(alias = "open_ai")]
    OpenAI,
    Ollama,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }
}

/// Token-streaming chat completion
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Start a streaming completion. Fragments arrive in order; the stream ends
    /// normally at end-of-generation or yields a `Generation` error.
    async fn stream_chat(
        &self,
        messages: &[ChatMessage],
        temperature: f32,
        max_tokens: u32,
    ) -> Result<StreamingResponse>;
}

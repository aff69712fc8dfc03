//! HTTP chat clients for OpenAI-compatible and Ollama endpoints

use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;
use tracing::info;

use super::streaming::body_lines;
use super::ChatMessage;
use super::ChatModel;
use super::LlmProvider;
use super::StreamingResponse;
use crate::config::AppConfig;
use crate::errors::Result;
use crate::errors::WooError;

/// One decoded line of a streaming response
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Text(String),
    Done,
    /// Keep-alives, role-only deltas and other frames without text
    Skip,
}

/// Decode one line of an OpenAI-compatible SSE stream
pub fn parse_openai_line(line: &str) -> Result<Frame> {
    let Some(payload) = line.strip_prefix("data:") else {
        return Ok(Frame::Skip);
    };
    let payload = payload.trim();
    if payload == "[DONE]" {
        return Ok(Frame::Done);
    }

    let value: Value = serde_json::from_str(payload)
        .map_err(|e| WooError::Generation(format!("Failed to parse chunk: {e}")))?;
    if let Some(error) = value.get("error") {
        let message = error
            .get("message")
            .and_then(Value::as_str)
            .map_or_else(|| error.to_string(), str::to_string);
        return Err(WooError::Generation(message));
    }

    let content = value
        .pointer("/choices/0/delta/content")
        .and_then(Value::as_str)
        .unwrap_or_default();
    if content.is_empty() {
        Ok(Frame::Skip)
    } else {
        Ok(Frame::Text(content.to_string()))
    }
}

/// Decode one line of an Ollama NDJSON stream. The closing `done` frame carries no text.
pub fn parse_ollama_line(line: &str) -> Result<Frame> {
    #[derive(Deserialize)]
    struct OllamaChunk {
        #[serde(default)]
        message: Option<OllamaMessage>,
        #[serde(default)]
        done: bool,
        #[serde(default)]
        error: Option<String>,
    }

    #[derive(Deserialize)]
    struct OllamaMessage {
        #[serde(default)]
        content: String,
    }

    let chunk: OllamaChunk = serde_json::from_str(line)
        .map_err(|e| WooError::Generation(format!("Failed to parse chunk: {e}")))?;
    if let Some(error) = chunk.error {
        return Err(WooError::Generation(error));
    }
    if chunk.done {
        return Ok(Frame::Done);
    }
    match chunk.message {
        Some(message) if !message.content.is_empty() => Ok(Frame::Text(message.content)),
        _ => Ok(Frame::Skip),
    }
}

/// Client for streaming chat completions
pub struct LlmClient {
    provider: LlmProvider,
    endpoint: String,
    model: String,
    api_key: Option<String>,
    /// Bound on connecting, on waiting for response headers and on each gap between fragments
    timeout: Duration,
    client: Client,
}

impl LlmClient {
    /// Create a new chat client
    ///
    /// # Errors
    /// - HTTP client build errors (invalid configuration)
    pub fn new(
        provider: LlmProvider,
        endpoint: String,
        model: String,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(timeout)
            .pool_idle_timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| WooError::HttpError(e.to_string()))?;

        Ok(Self {
            provider,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            model,
            api_key,
            timeout,
            client,
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Self::new(
            config.llm.provider,
            config.llm.endpoint.clone(),
            config.llm.model.clone(),
            config.llm_api_key(),
            Duration::from_secs(config.llm.timeout_secs),
        )
    }

    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    async fn send_openai(
        &self,
        messages: &[ChatMessage],
        temperature: f32,
        max_tokens: u32,
    ) -> Result<reqwest::Response> {
        #[derive(Serialize)]
        struct OpenAIRequest<'a> {
            model: &'a str,
            messages: &'a [ChatMessage],
            temperature: f32,
            max_tokens: u32,
            stream: bool,
        }

        let api_key = self
            .api_key
            .as_ref()
            .ok_or_else(|| WooError::ConfigError("OpenAI API key not provided".to_string()))?;

        let url = format!("{}/chat/completions", self.endpoint);
        debug!("Calling OpenAI chat completions API: {}", url);

        self.client
            .post(&url)
            .header("Authorization", format!("Bearer {api_key}"))
            .json(&OpenAIRequest {
                model: &self.model,
                messages,
                temperature,
                max_tokens,
                stream: true,
            })
            .send()
            .await
            .map_err(|e| WooError::Generation(format!("Failed to send request: {e}")))
    }

    async fn send_ollama(
        &self,
        messages: &[ChatMessage],
        temperature: f32,
        max_tokens: u32,
    ) -> Result<reqwest::Response> {
        #[derive(Serialize)]
        struct OllamaOptions {
            temperature: f32,
            num_predict: u32,
        }

        #[derive(Serialize)]
        struct OllamaRequest<'a> {
            model: &'a str,
            messages: &'a [ChatMessage],
            stream: bool,
            options: OllamaOptions,
        }

        let url = format!("{}/api/chat", self.endpoint);
        debug!("Calling Ollama chat API: {}", url);

        self.client
            .post(&url)
            .json(&OllamaRequest {
                model: &self.model,
                messages,
                stream: true,
                options: OllamaOptions {
                    temperature,
                    num_predict: max_tokens,
                },
            })
            .send()
            .await
            .map_err(|e| WooError::Generation(format!("Failed to send request: {e}")))
    }
}

#[async_trait]
impl ChatModel for LlmClient {
    async fn stream_chat(
        &self,
        messages: &[ChatMessage],
        temperature: f32,
        max_tokens: u32,
    ) -> Result<StreamingResponse> {
        info!(
            "Starting streaming chat ({:?}, model {}, {} messages)",
            self.provider,
            self.model,
            messages.len()
        );

        let waiting = async {
            match self.provider {
                LlmProvider::OpenAI => self.send_openai(messages, temperature, max_tokens).await,
                LlmProvider::Ollama => self.send_ollama(messages, temperature, max_tokens).await,
            }
        };
        let response = tokio::time::timeout(self.timeout, waiting)
            .await
            .map_err(|_| {
                WooError::Generation(format!(
                    "{:?} did not respond within {}s",
                    self.provider,
                    self.timeout.as_secs()
                ))
            })??;
        let parse: fn(&str) -> Result<Frame> = match self.provider {
            LlmProvider::OpenAI => parse_openai_line,
            LlmProvider::Ollama => parse_ollama_line,
        };

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(WooError::Generation(format!(
                "{:?} API error ({status}): {error_text}",
                self.provider
            )));
        }

        let fragments = body_lines(response.bytes_stream())
            .map(move |line| line.and_then(|l| parse(&l)))
            .take_while(|frame| futures::future::ready(!matches!(frame, Ok(Frame::Done))))
            .filter_map(|frame| {
                futures::future::ready(match frame {
                    Ok(Frame::Text(text)) => Some(Ok(text)),
                    Ok(Frame::Done | Frame::Skip) => None,
                    Err(e) => Some(Err(e)),
                })
            });

        Ok(StreamingResponse::new(Box::pin(fragments)).with_idle_timeout(self.timeout))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openai_delta_frame() {
        let line = r#"data: {"id":"x","choices":[{"index":0,"delta":{"content":"Hallo"},"finish_reason":null}]}"#;
        assert_eq!(parse_openai_line(line).unwrap(), Frame::Text("Hallo".to_string()));
    }

    #[test]
    fn test_openai_role_only_and_keepalive_frames_skipped() {
        let role = r#"data: {"choices":[{"index":0,"delta":{"role":"assistant"}}]}"#;
        assert_eq!(parse_openai_line(role).unwrap(), Frame::Skip);
        assert_eq!(parse_openai_line(": keep-alive").unwrap(), Frame::Skip);
    }

    #[test]
    fn test_openai_done_and_error() {
        assert_eq!(parse_openai_line("data: [DONE]").unwrap(), Frame::Done);
        let err = parse_openai_line(r#"data: {"error":{"message":"rate limited"}}"#).unwrap_err();
        assert!(matches!(err, WooError::Generation(msg) if msg == "rate limited"));
        assert!(parse_openai_line("data: {not json").is_err());
    }

    #[test]
    fn test_ollama_frames() {
        let text = r#"{"model":"llama3","message":{"role":"assistant","content":"Goed"},"done":false}"#;
        assert_eq!(parse_ollama_line(text).unwrap(), Frame::Text("Goed".to_string()));

        let done = r#"{"model":"llama3","message":{"role":"assistant","content":""},"done":true}"#;
        assert_eq!(parse_ollama_line(done).unwrap(), Frame::Done);

        let err = parse_ollama_line(r#"{"error":"model not found"}"#).unwrap_err();
        assert!(matches!(err, WooError::Generation(_)));
    }

    #[test]
    fn test_client_creation_trims_endpoint() {
        let client = LlmClient::new(
            LlmProvider::Ollama,
            "http://localhost:11434/".to_string(),
            "llama3".to_string(),
            None,
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(client.endpoint, "http://localhost:11434");
        assert_eq!(client.model(), "llama3");
    }

    #[test]
    fn test_message_wire_format() {
        let value = serde_json::to_value(ChatMessage::system("Je bent een assistent")).unwrap();
        assert_eq!(value["role"], "system");
        assert_eq!(value["content"], "Je bent een assistent");
    }

    #[tokio::test]
    #[ignore = "Requires a running Ollama instance"]
    async fn test_ollama_streaming() {
        let client = LlmClient::new(
            LlmProvider::Ollama,
            "http://localhost:11434".to_string(),
            "llama3".to_string(),
            None,
            Duration::from_secs(60),
        )
        .unwrap();
        let response = client
            .stream_chat(&[ChatMessage::user("Zeg hallo")], 0.1, 20)
            .await
            .unwrap();
        assert!(!response.collect_all().await.unwrap().is_empty());
    }
}

//! Streaming answer generation
//!
//! Every request runs on its own task and reports through a bounded channel:
//!
//! ```text
//! Idle ──▶ Streaming ──▶ Sourcing ──▶ Complete
//!   └──────────┴─────────────┴──────▶ Failed
//! ```
//!
//! A successful request yields `Chunk*`, one `Sources`, one `Complete`. A failed
//! one yields `Chunk(apology)` and an empty `Sources`. If the receiver goes away
//! the task stops without touching the session.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use futures::FutureExt;
use serde::Deserialize;
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::warn;

use super::context::ContextAssembler;
use super::prompts;
use super::retriever::Retriever;
use super::session::ConversationHistory;
use super::session::SessionStore;
use super::sources::SourceDeduplicator;
use super::Query;
use crate::errors::Result;
use crate::errors::WooError;
use crate::llm::ChatMessage;
use crate::llm::ChatModel;
use crate::models::Source;

/// Response metadata carried by the `Complete` event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionMetadata {
    pub sources: Vec<Source>,
    /// Seconds from request start to completion
    pub response_time: f64,
    /// Passage ids the answer was grounded on
    pub chunks_used: Vec<String>,
    /// RFC 3339 completion time
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    Chunk(String),
    Sources {
        sources: Vec<Source>,
        passage_ids: Vec<String>,
    },
    Complete(CompletionMetadata),
    Error(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationState {
    Idle,
    Streaming,
    Sourcing,
    Complete,
    Failed,
}

/// Knobs shared by every request
#[derive(Debug, Clone)]
pub struct GeneratorSettings {
    pub retrieval_limit: usize,
    pub min_score: f32,
    pub temperature: f32,
    pub max_tokens: u32,
    pub channel_capacity: usize,
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        Self {
            retrieval_limit: 5,
            min_score: 0.52,
            temperature: 0.1,
            max_tokens: 1000,
            channel_capacity: 64,
        }
    }
}

pub struct StreamingAnswerGenerator {
    retriever: Arc<Retriever>,
    chat: Arc<dyn ChatModel>,
    sessions: Arc<SessionStore>,
    assembler: ContextAssembler,
    settings: GeneratorSettings,
}

fn disconnected() -> WooError {
    WooError::Transport("client disconnected".to_string())
}

async fn emit(tx: &mpsc::Sender<StreamEvent>, event: StreamEvent) -> Result<()> {
    tx.send(event).await.map_err(|_| disconnected())
}

impl StreamingAnswerGenerator {
    pub fn new(
        retriever: Arc<Retriever>,
        chat: Arc<dyn ChatModel>,
        sessions: Arc<SessionStore>,
        assembler: ContextAssembler,
        settings: GeneratorSettings,
    ) -> Self {
        Self {
            retriever,
            chat,
            sessions,
            assembler,
            settings,
        }
    }

    /// Start answering `query` on a new task and return the event receiver.
    /// Dropping the receiver cancels the request.
    pub fn spawn(self: &Arc<Self>, query: Query) -> mpsc::Receiver<StreamEvent> {
        let (tx, rx) = mpsc::channel(self.settings.channel_capacity.max(1));
        let generator = Arc::clone(self);

        tokio::spawn(async move {
            let panic_tx = tx.clone();
            let outcome = AssertUnwindSafe(generator.run(query, tx)).catch_unwind().await;
            if outcome.is_err() {
                error!("Answer generation panicked");
                let _ = panic_tx
                    .send(StreamEvent::Error("internal error while generating the answer".to_string()))
                    .await;
            }
        });

        rx
    }

    /// Drive one request to completion under its session lock
    pub async fn run(&self, query: Query, tx: mpsc::Sender<StreamEvent>) -> GenerationState {
        let started = Instant::now();
        let mut session = self.sessions.acquire(&query.session_id).await;
        let mut state = GenerationState::Idle;

        match self
            .answer(&query, &session.history, &tx, started, &mut state)
            .await
        {
            Ok(answer) => {
                session.history.record_exchange(&query.text, &answer);
                state = GenerationState::Complete;
                info!(
                    "Answered query for session {} in {:.2}s",
                    query.session_id,
                    started.elapsed().as_secs_f64()
                );
            }
            Err(WooError::Transport(reason)) => {
                warn!(
                    "Stopped generation for session {} while {:?}: {}",
                    query.session_id, state, reason
                );
                state = GenerationState::Failed;
            }
            Err(e) => {
                error!(
                    "Generation failed for session {} while {:?}: {}",
                    query.session_id, state, e
                );
                state = GenerationState::Failed;
                // A gone receiver makes these fail too; nothing left to do then.
                let _ = emit(&tx, StreamEvent::Chunk(prompts::ERROR_MESSAGE.to_string())).await;
                let _ = emit(
                    &tx,
                    StreamEvent::Sources {
                        sources: Vec::new(),
                        passage_ids: Vec::new(),
                    },
                )
                .await;
            }
        }

        state
    }

    async fn answer(
        &self,
        query: &Query,
        history: &ConversationHistory,
        tx: &mpsc::Sender<StreamEvent>,
        started: Instant,
        state: &mut GenerationState,
    ) -> Result<String> {
        let retrieval = self.retriever.retrieve(
            &query.text,
            query.filter.as_ref(),
            self.settings.retrieval_limit,
            self.settings.min_score,
        );
        let results = tokio::select! {
            biased;
            () = tx.closed() => return Err(disconnected()),
            results = retrieval => results?,
        };

        let context = self.assembler.assemble(&results);
        let used = &results[..context.used];
        debug!("Using {} of {} retrieved passages", used.len(), results.len());

        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(ChatMessage::system(prompts::SYSTEM_PROMPT));
        messages.extend(history.to_messages());
        messages.push(ChatMessage::user(prompts::build_user_prompt(
            &query.text,
            &context.text,
        )));

        // No upstream generation for a receiver that is already gone.
        if tx.is_closed() {
            return Err(disconnected());
        }
        let mut stream = self
            .chat
            .stream_chat(&messages, self.settings.temperature, self.settings.max_tokens)
            .await?;

        *state = GenerationState::Streaming;
        let mut answer = String::new();
        loop {
            let next = tokio::select! {
                biased;
                () = tx.closed() => return Err(disconnected()),
                next = stream.next_fragment() => next,
            };
            let Some(fragment) = next else {
                break;
            };
            let fragment = fragment?;
            answer.push_str(&fragment);
            emit(tx, StreamEvent::Chunk(fragment)).await?;
        }

        *state = GenerationState::Sourcing;
        let sources = SourceDeduplicator::dedupe(used);
        let passage_ids: Vec<String> = used.iter().map(|r| r.id.clone()).collect();
        emit(
            tx,
            StreamEvent::Sources {
                sources: sources.clone(),
                passage_ids: passage_ids.clone(),
            },
        )
        .await?;

        let metadata = CompletionMetadata {
            sources,
            response_time: started.elapsed().as_secs_f64(),
            chunks_used: passage_ids,
            timestamp: Utc::now().to_rfc3339(),
        };
        emit(tx, StreamEvent::Complete(metadata)).await?;

        Ok(answer)
    }
}

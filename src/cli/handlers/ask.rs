//! Streamed question answering on the terminal

use std::io::Write;

use crate::cli::commands::FilterArgs;
use crate::cli::output::*;
use crate::rag::MetadataFilterBuilder;
use crate::rag::Query;
use crate::rag::RagService;
use crate::rag::StreamEvent;
use crate::AppConfig;
use crate::Result;
use crate::WooError;

/// Build the query the CLI submits
pub fn build_query(question: String, session: String, filters: &FilterArgs) -> Result<Query> {
    if question.trim().is_empty() {
        return Err(WooError::Validation("Query is required".to_string()));
    }
    let filter = if filters.is_empty() {
        None
    } else {
        Some(MetadataFilterBuilder::from_params(&filters.to_params())?.to_filter())
    };
    Ok(Query {
        text: question,
        session_id: session,
        filter,
    })
}

pub async fn handle_ask(
    config: &AppConfig,
    question: String,
    session: String,
    filters: FilterArgs,
) -> Result<()> {
    let query = build_query(question, session, &filters)?;
    let rag = RagService::new(config)?;
    let mut rx = rag.stream_answer(query);

    let mut stdout = std::io::stdout();
    while let Some(event) = rx.recv().await {
        match event {
            StreamEvent::Chunk(text) => {
                write!(stdout, "{text}")?;
                stdout.flush()?;
            }
            StreamEvent::Sources { sources, .. } => {
                println!();
                print_sources(&sources);
            }
            StreamEvent::Complete(metadata) => {
                println!(
                    "\n⏱️  {:.2}s, {} passages used",
                    metadata.response_time,
                    metadata.chunks_used.len()
                );
            }
            StreamEvent::Error(message) => {
                print_error(&message);
                return Err(WooError::Generation(message));
            }
        }
    }

    Ok(())
}

//! Server-sent event framing for answer streams

use std::convert::Infallible;

use axum::response::sse::Event;
use futures::Stream;
use serde_json::json;
use tokio::sync::mpsc;

use crate::rag::StreamEvent;

pub const CHUNK: &str = "chunk";
pub const SOURCES: &str = "sources";
pub const COMPLETE: &str = "complete";
pub const ERROR: &str = "error";

/// Named event with its serialized payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireEvent {
    pub name: &'static str,
    pub data: String,
}

/// SSE treats a bare carriage return as a line break; keep lines on `\n` only
fn normalize_newlines(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

#[must_use]
pub fn encode(event: &StreamEvent) -> WireEvent {
    match event {
        StreamEvent::Chunk(text) => WireEvent {
            name: CHUNK,
            data: normalize_newlines(text),
        },
        StreamEvent::Sources { sources, .. } => WireEvent {
            name: SOURCES,
            data: json!({ "sources": sources }).to_string(),
        },
        // The misspelt key is what existing clients read.
        StreamEvent::Complete(metadata) => WireEvent {
            name: COMPLETE,
            data: json!({ "metada": metadata }).to_string(),
        },
        StreamEvent::Error(message) => WireEvent {
            name: ERROR,
            data: json!({ "error": message }).to_string(),
        },
    }
}

impl From<WireEvent> for Event {
    fn from(wire: WireEvent) -> Self {
        Event::default().event(wire.name).data(wire.data)
    }
}

/// Adapt a generator receiver to an SSE body. Dropping the stream drops the
/// receiver, which cancels the generator.
pub fn event_stream(
    rx: mpsc::Receiver<StreamEvent>,
) -> impl Stream<Item = Result<Event, Infallible>> + Send {
    futures::stream::unfold(rx, |mut rx| async move {
        let event = rx.recv().await?;
        Some((Ok(Event::from(encode(&event))), rx))
    })
}

#[cfg(test)]
mod tests {
    use serde_json::Value;

    use super::*;
    use crate::models::Source;
    use crate::rag::CompletionMetadata;

    fn source() -> Source {
        Source {
            title: "Besluit A".to_string(),
            url: "https://woo.example.nl/a".to_string(),
            region: "Utrecht".to_string(),
            date: "2024-01-01".to_string(),
            doc_type: "besluit".to_string(),
            relevance_score: 0.8,
            summary: String::new(),
        }
    }

    #[test]
    fn test_chunk_is_raw_text() {
        let wire = encode(&StreamEvent::Chunk("Hallo\r\nwereld".to_string()));
        assert_eq!(wire.name, "chunk");
        assert_eq!(wire.data, "Hallo\nwereld");
    }

    #[test]
    fn test_sources_payload() {
        let wire = encode(&StreamEvent::Sources {
            sources: vec![source()],
            passage_ids: vec!["p1".to_string()],
        });
        assert_eq!(wire.name, "sources");
        let value: Value = serde_json::from_str(&wire.data).unwrap();
        assert_eq!(value["sources"][0]["titel"], "Besluit A");
        assert!(value.get("passage_ids").is_none());
    }

    #[test]
    fn test_complete_payload_key() {
        let wire = encode(&StreamEvent::Complete(CompletionMetadata {
            sources: vec![source()],
            response_time: 1.5,
            chunks_used: vec!["p1".to_string(), "p2".to_string()],
            timestamp: "2024-01-01T00:00:00+00:00".to_string(),
        }));
        assert_eq!(wire.name, "complete");
        let value: Value = serde_json::from_str(&wire.data).unwrap();
        let metadata = &value["metada"];
        assert_eq!(metadata["chunks_used"][1], "p2");
        assert_eq!(metadata["response_time"], 1.5);
        assert_eq!(metadata["sources"][0]["url"], "https://woo.example.nl/a");
        assert!(metadata["timestamp"].is_string());
    }

    #[test]
    fn test_error_payload() {
        let wire = encode(&StreamEvent::Error("boom".to_string()));
        assert_eq!(wire.name, "error");
        assert_eq!(wire.data, r#"{"error":"boom"}"#);
    }

    #[tokio::test]
    async fn test_event_stream_ends_with_channel() {
        use futures::StreamExt;

        let (tx, rx) = mpsc::channel(4);
        tx.send(StreamEvent::Chunk("a".to_string())).await.unwrap();
        drop(tx);
        let events: Vec<_> = event_stream(rx).collect().await;
        assert_eq!(events.len(), 1);
    }
}

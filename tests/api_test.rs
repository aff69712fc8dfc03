//! HTTP-level tests: the full router over stub embeddings, an in-memory
//! vector store and a scripted chat model.

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::Method;
use axum::http::Request;
use axum::http::StatusCode;
use axum::Router;
use serde_json::json;
use serde_json::Value;
use tower::ServiceExt;
use wooverzicht::api::build_router;
use wooverzicht::api::AppState;
use wooverzicht::embeddings::Embedder;
use wooverzicht::llm::streaming::StreamingResponse;
use wooverzicht::llm::ChatMessage;
use wooverzicht::llm::ChatModel;
use wooverzicht::rag::RagService;
use wooverzicht::vector_store::memory::MemoryEntry;
use wooverzicht::vector_store::MemoryStore;
use wooverzicht::AppConfig;
use wooverzicht::Result;

struct FixedEmbedder;

#[async_trait]
impl Embedder for FixedEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Ok(vec![1.0, 0.0])
    }
}

struct ScriptedChat;

#[async_trait]
impl ChatModel for ScriptedChat {
    async fn stream_chat(
        &self,
        _messages: &[ChatMessage],
        _temperature: f32,
        _max_tokens: u32,
    ) -> Result<StreamingResponse> {
        Ok(StreamingResponse::from_fragments(vec![
            Ok("De provincie ".to_string()),
            Ok("besloot [Bron: Besluit wind(https://woo.example/1)]".to_string()),
        ]))
    }
}

fn passage(id: &str, title: &str, url: &str, region: &str, embedding: Vec<f32>) -> MemoryEntry {
    MemoryEntry {
        id: id.to_string(),
        content: format!("Inhoud van {id}"),
        metadata: json!({
            "titel": title,
            "url": url,
            "provincie": region,
            "datum": 1_700_000_000,
            "type": "besluit",
        })
        .as_object()
        .cloned()
        .unwrap(),
        embedding,
    }
}

fn app() -> Router {
    let store = MemoryStore::new(vec![
        passage("wind-0", "Besluit wind", "https://woo.example/1", "Gelderland", vec![1.0, 0.0]),
        passage("wind-1", "Besluit wind", "https://woo.example/1", "Gelderland", vec![0.9, 0.1]),
        passage("water-0", "Waterplan", "https://woo.example/2", "Utrecht", vec![0.95, 0.05]),
        passage("ver-0", "Ver weg", "https://woo.example/3", "Utrecht", vec![0.0, 1.0]),
    ]);
    let rag = RagService::from_services(
        &AppConfig::default(),
        Arc::new(FixedEmbedder),
        Arc::new(store),
        Arc::new(ScriptedChat),
    );
    build_router(AppState::new(Arc::new(rag)), false)
}

fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    serde_json::from_str(&body_text(response).await).unwrap()
}

/// (event name, data) pairs of an SSE body
fn sse_events(body: &str) -> Vec<(String, String)> {
    body.split("\n\n")
        .filter_map(|frame| {
            let mut name = None;
            let mut data = Vec::new();
            for line in frame.lines() {
                if let Some(rest) = line.strip_prefix("event:") {
                    name = Some(rest.trim().to_string());
                } else if let Some(rest) = line.strip_prefix("data:") {
                    data.push(rest.strip_prefix(' ').unwrap_or(rest).to_string());
                }
            }
            name.map(|n| (n, data.join("\n")))
        })
        .collect()
}

#[tokio::test]
async fn test_health() {
    let request = Request::builder()
        .uri("/api/health")
        .body(Body::empty())
        .unwrap();
    let response = app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "healthy");
    assert!(body["timestamp"].as_str().is_some());
}

#[tokio::test]
async fn test_documents_groups_passages_by_document() {
    let body = json!({
        "query": "windenergie",
        "filters": { "startDate": "2023-01-01", "endDate": "2023-12-31" }
    });
    let response = app()
        .oneshot(post_json("/api/query/documents", &body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["query"], "windenergie");
    assert_eq!(body["total_chunks"], 3);
    assert_eq!(body["total_documents"], 2);
    assert_eq!(body["chunks"][0]["id"], "wind-0");
}

#[tokio::test]
async fn test_documents_province_and_date_filters() {
    let body = json!({
        "query": "windenergie",
        "filters": {
            "provinces": ["Utrecht"],
            "startDate": "2023-01-01",
            "endDate": "2023-12-31"
        }
    });
    let response = app()
        .oneshot(post_json("/api/query/documents", &body))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["total_chunks"], 1);
    assert_eq!(body["chunks"][0]["id"], "water-0");

    let body = json!({
        "query": "windenergie",
        "filters": { "startDate": "2024-01-01", "endDate": "2024-12-31" }
    });
    let response = app()
        .oneshot(post_json("/api/query/documents", &body))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["total_chunks"], 0);
    assert_eq!(body["total_documents"], 0);
}

#[tokio::test]
async fn test_documents_failures_keep_shape() {
    let cases = [
        json!({ "query": "", "filters": { "startDate": "2023-01-01", "endDate": "2023-12-31" } }),
        json!({ "query": "wind", "filters": { "startDate": "2023-01-01" } }),
        json!({ "query": "wind", "filters": { "startDate": "2023/01/01", "endDate": "2023-12-31" } }),
        json!({ "filters": {} }),
    ];

    for case in cases {
        let response = app()
            .oneshot(post_json("/api/query/documents", &case))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["success"], false, "case {case}");
        assert!(body["error"].as_str().is_some());
        assert_eq!(body["chunks"], json!([]));
        assert_eq!(body["documents"], json!([]));
        assert_eq!(body["total_chunks"], 0);
    }
}

#[tokio::test]
async fn test_documents_missing_start_date() {
    let body = json!({ "query": "wind", "filters": { "endDate": "2024-01-01" } });
    let response = app()
        .oneshot(post_json("/api/query/documents", &body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("required"));
    assert_eq!(body["chunks"], json!([]));
    assert_eq!(body["documents"], json!([]));
}

fn raw_post(uri: &str, content_type: Option<&str>, body: &'static str) -> Request<Body> {
    let mut builder = Request::builder().method(Method::POST).uri(uri);
    if let Some(content_type) = content_type {
        builder = builder.header("content-type", content_type);
    }
    builder.body(Body::from(body)).unwrap()
}

#[tokio::test]
async fn test_documents_unreadable_body_keeps_shape() {
    let requests = [
        raw_post("/api/query/documents", Some("application/json"), "{not json"),
        raw_post("/api/query/documents", None, r#"{"query": "wind"}"#),
    ];

    for request in requests {
        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert!(body["error"].as_str().is_some());
        assert_eq!(body["chunks"], json!([]));
        assert_eq!(body["documents"], json!([]));
        assert_eq!(body["total_chunks"], 0);
        assert_eq!(body["total_documents"], 0);
    }
}

#[tokio::test]
async fn test_stream_unreadable_body_is_structured_error() {
    let requests = [
        raw_post("/api/query/stream", Some("application/json"), "{not json"),
        raw_post("/api/query/stream", None, r#"{"query": "wind"}"#),
    ];

    for request in requests {
        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert!(body["error"].as_str().unwrap().starts_with("Validation error"));
    }
}

#[tokio::test]
async fn test_stream_event_order() {
    let body = json!({ "query": "Wat is besloten over wind?", "session_id": "s1" });
    let response = app()
        .oneshot(post_json("/api/query/stream", &body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(content_type.starts_with("text/event-stream"));

    let events = sse_events(&body_text(response).await);
    let names: Vec<&str> = events.iter().map(|(name, _)| name.as_str()).collect();
    assert_eq!(names, ["chunk", "chunk", "sources", "complete"]);

    let answer: String = events[..2].iter().map(|(_, data)| data.as_str()).collect();
    assert!(answer.starts_with("De provincie besloot"));

    let sources: Value = serde_json::from_str(&events[2].1).unwrap();
    let sources = sources["sources"].as_array().unwrap();
    assert_eq!(sources.len(), 2);

    let complete: Value = serde_json::from_str(&events[3].1).unwrap();
    assert_eq!(complete["metada"]["chunks_used"].as_array().unwrap().len(), 3);
    assert!(complete["metada"]["response_time"].as_f64().is_some());
}

#[tokio::test]
async fn test_stream_rejects_blank_query() {
    let response = app()
        .oneshot(post_json("/api/query/stream", &json!({ "query": "   " })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_clear_session() {
    let app = app();

    let delete = |id: &str| {
        Request::builder()
            .method(Method::DELETE)
            .uri(format!("/api/session/{id}"))
            .body(Body::empty())
            .unwrap()
    };

    let response = app.clone().oneshot(delete("onbekend")).await.unwrap();
    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["cleared"], false);

    let stream = json!({ "query": "wind", "session_id": "s2" });
    let response = app
        .clone()
        .oneshot(post_json("/api/query/stream", &stream))
        .await
        .unwrap();
    body_text(response).await;

    let response = app.oneshot(delete("s2")).await.unwrap();
    let body = body_json(response).await;
    assert_eq!(body["session_id"], "s2");
    assert_eq!(body["cleared"], true);
}

//! Chroma REST client

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::OnceCell;
use tracing::debug;
use tracing::info;

use super::RawHit;
use super::StoredPassage;
use super::VectorStore;
use crate::config::AppConfig;
use crate::errors::Result;
use crate::errors::WooError;
use crate::models::Metadata;
use crate::rag::filter::Filter;

const QUERY_INCLUDE: [&str; 3] = ["metadatas", "documents", "distances"];
const GET_INCLUDE: [&str; 2] = ["metadatas", "documents"];

/// `/query` response: one inner list per query embedding
#[derive(Debug, Default, Deserialize)]
pub struct QueryResponse {
    #[serde(default)]
    pub ids: Vec<Vec<String>>,
    #[serde(default)]
    pub documents: Option<Vec<Vec<Option<String>>>>,
    #[serde(default)]
    pub metadatas: Option<Vec<Vec<Option<Metadata>>>>,
    #[serde(default)]
    pub distances: Option<Vec<Vec<Option<f32>>>>,
}

impl QueryResponse {
    /// Flatten the first query's columns into hits. Hits without a distance are dropped.
    pub fn into_hits(self) -> Vec<RawHit> {
        let ids = self.ids.into_iter().next().unwrap_or_default();
        let mut documents = first_column(self.documents);
        let mut metadatas = first_column(self.metadatas);
        let distances = first_column(self.distances);

        ids.into_iter()
            .enumerate()
            .filter_map(|(i, id)| {
                let distance = distances.get(i).copied().flatten()?;
                Some(RawHit {
                    id,
                    content: take_at(&mut documents, i).unwrap_or_default(),
                    metadata: take_at(&mut metadatas, i).unwrap_or_default(),
                    distance,
                })
            })
            .collect()
    }
}

/// `/get` response: flat columns
#[derive(Debug, Default, Deserialize)]
pub struct GetResponse {
    #[serde(default)]
    pub ids: Vec<String>,
    #[serde(default)]
    pub documents: Option<Vec<Option<String>>>,
    #[serde(default)]
    pub metadatas: Option<Vec<Option<Metadata>>>,
}

impl GetResponse {
    pub fn into_passages(self) -> Vec<StoredPassage> {
        let mut documents = self.documents.unwrap_or_default();
        let mut metadatas = self.metadatas.unwrap_or_default();
        self.ids
            .into_iter()
            .enumerate()
            .map(|(i, id)| StoredPassage {
                id,
                content: take_at(&mut documents, i).unwrap_or_default(),
                metadata: take_at(&mut metadatas, i).unwrap_or_default(),
            })
            .collect()
    }
}

fn first_column<T>(column: Option<Vec<Vec<Option<T>>>>) -> Vec<Option<T>> {
    column.and_then(|c| c.into_iter().next()).unwrap_or_default()
}

fn take_at<T>(column: &mut [Option<T>], i: usize) -> Option<T> {
    column.get_mut(i).and_then(Option::take)
}

#[derive(Serialize)]
struct QueryRequest<'a> {
    query_embeddings: [&'a [f32]; 1],
    n_results: usize,
    #[serde(rename = "where", skip_serializing_if = "Option::is_none")]
    filter: Option<Value>,
    include: &'a [&'a str],
}

#[derive(Serialize)]
struct GetRequest<'a> {
    #[serde(rename = "where", skip_serializing_if = "Option::is_none")]
    filter: Option<Value>,
    limit: usize,
    include: &'a [&'a str],
}

/// Collection handle on a Chroma server
pub struct ChromaStore {
    endpoint: String,
    collection: String,
    collection_id: OnceCell<String>,
    client: Client,
}

impl ChromaStore {
    /// # Errors
    /// - HTTP client build errors (invalid configuration)
    pub fn new(endpoint: String, collection: String, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .pool_idle_timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| WooError::HttpError(e.to_string()))?;

        Ok(Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            collection,
            collection_id: OnceCell::new(),
            client,
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Self::new(
            config.vector_store.endpoint.clone(),
            config.vector_store.collection.clone(),
            Duration::from_secs(config.vector_store.timeout_secs),
        )
    }

    /// Resolve the collection name to its id once, then reuse it
    async fn collection_id(&self) -> Result<&str> {
        let id = self
            .collection_id
            .get_or_try_init(|| async {
                #[derive(Deserialize)]
                struct CollectionInfo {
                    id: String,
                }

                let url = format!("{}/api/v1/collections/{}", self.endpoint, self.collection);
                debug!("Resolving Chroma collection: {}", url);
                let info: CollectionInfo = self.send(self.client.get(&url)).await?;
                info!("Connected to collection {} ({})", self.collection, info.id);
                Ok::<_, WooError>(info.id)
            })
            .await?;
        Ok(id.as_str())
    }

    async fn send<T: serde::de::DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T> {
        let response = request
            .send()
            .await
            .map_err(|e| WooError::Retrieval(format!("Chroma request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(WooError::Retrieval(format!(
                "Chroma API error ({status}): {error_text}"
            )));
        }

        response
            .json()
            .await
            .map_err(|e| WooError::Retrieval(format!("Failed to parse Chroma response: {e}")))
    }
}

#[async_trait]
impl VectorStore for ChromaStore {
    async fn query(
        &self,
        embedding: &[f32],
        limit: usize,
        filter: Option<&Filter>,
    ) -> Result<Vec<RawHit>> {
        let id = self.collection_id().await?;
        let url = format!("{}/api/v1/collections/{id}/query", self.endpoint);
        let request = QueryRequest {
            query_embeddings: [embedding],
            n_results: limit,
            filter: filter.map(Filter::to_where),
            include: &QUERY_INCLUDE,
        };

        let response: QueryResponse = self.send(self.client.post(&url).json(&request)).await?;
        let hits = response.into_hits();
        debug!("Chroma returned {} hits", hits.len());
        Ok(hits)
    }

    async fn get(&self, filter: Option<&Filter>, limit: usize) -> Result<Vec<StoredPassage>> {
        let id = self.collection_id().await?;
        let url = format!("{}/api/v1/collections/{id}/get", self.endpoint);
        let request = GetRequest {
            filter: filter.map(Filter::to_where),
            limit,
            include: &GET_INCLUDE,
        };

        let response: GetResponse = self.send(self.client.post(&url).json(&request)).await?;
        Ok(response.into_passages())
    }

    async fn count(&self) -> Result<usize> {
        let id = self.collection_id().await?;
        let url = format!("{}/api/v1/collections/{id}/count", self.endpoint);
        self.send(self.client.get(&url)).await
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_query_response_flattening() {
        let response: QueryResponse = serde_json::from_value(json!({
            "ids": [["a", "b"]],
            "documents": [["eerste", null]],
            "metadatas": [[{ "titel": "A" }, null]],
            "distances": [[0.2, 0.9]],
            "embeddings": null
        }))
        .unwrap();

        let hits = response.into_hits();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].id, "a");
        assert_eq!(hits[0].content, "eerste");
        assert_eq!(hits[0].metadata["titel"], "A");
        assert!((hits[0].distance - 0.2).abs() < f32::EPSILON);
        assert_eq!(hits[1].content, "");
        assert!(hits[1].metadata.is_empty());
    }

    #[test]
    fn test_empty_query_response() {
        let response: QueryResponse = serde_json::from_value(json!({ "ids": [[]] })).unwrap();
        assert!(response.into_hits().is_empty());
    }

    #[test]
    fn test_get_response() {
        let response: GetResponse = serde_json::from_value(json!({
            "ids": ["x"],
            "documents": ["tekst"],
            "metadatas": [{ "provincie": "Utrecht" }]
        }))
        .unwrap();
        let passages = response.into_passages();
        assert_eq!(passages.len(), 1);
        assert_eq!(passages[0].metadata["provincie"], "Utrecht");
    }

    #[test]
    fn test_query_request_shape() {
        let filter = Filter::Range {
            field: "datum".to_string(),
            low: 0,
            high: 10,
        };
        let embedding = [0.5_f32, 0.5];
        let request = QueryRequest {
            query_embeddings: [&embedding[..]],
            n_results: 5,
            filter: Some(filter.to_where()),
            include: &QUERY_INCLUDE,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["n_results"], 5);
        assert_eq!(value["query_embeddings"], json!([[0.5, 0.5]]));
        assert!(value["where"]["$and"].is_array());
        assert_eq!(value["include"], json!(["metadatas", "documents", "distances"]));

        let unfiltered = QueryRequest {
            filter: None,
            ..request
        };
        assert!(serde_json::to_value(&unfiltered).unwrap().get("where").is_none());
    }

    #[tokio::test]
    async fn test_unreachable_server_is_retrieval_error() {
        let store = ChromaStore::new(
            "http://127.0.0.1:9".to_string(),
            "document_chunks".to_string(),
            Duration::from_secs(2),
        )
        .unwrap();
        let err = store.query(&[0.1, 0.2], 3, None).await.unwrap_err();
        assert!(matches!(err, WooError::Retrieval(_)));
    }
}

//! Similarity-store collaborator.
//!
//! Append-only from the pipeline's perspective: evidence documents are
//! upserted after each research pass and retrieved by nearest-neighbor text
//! similarity. The daemon never deletes.

use crate::config::StoreConfig;
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// A document as the similarity store sees it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredDocument {
    pub content: String,
    /// Source metadata carried alongside the text so retrieved neighbors can
    /// be mapped back to evidence documents.
    #[serde(default)]
    pub metadata: serde_json::Value,
}

/// Nearest-neighbor text retrieval consumed by the researcher.
#[async_trait]
pub trait SimilarityStore: Send + Sync {
    async fn add_documents(&self, documents: Vec<StoredDocument>) -> Result<()>;
    async fn nearest(&self, query: &str, k: usize) -> Result<Vec<StoredDocument>>;
}

#[derive(Debug, Serialize)]
struct UpsertRequest<'a> {
    documents: &'a [StoredDocument],
}

#[derive(Debug, Serialize)]
struct QueryRequest<'a> {
    text: &'a str,
    k: usize,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    documents: Vec<StoredDocument>,
}

/// HTTP client for a vector store exposing a minimal upsert/query JSON API.
pub struct VectorHttpClient {
    http: reqwest::Client,
    base_url: String,
    collection: String,
}

impl VectorHttpClient {
    pub fn new(config: &StoreConfig) -> Self {
        Self {
            http: reqwest::Client::builder()
                .timeout(Duration::from_secs(config.timeout_secs))
                .build()
                .unwrap_or_default(),
            base_url: config.url.trim_end_matches('/').to_string(),
            collection: config.collection.clone(),
        }
    }
}

#[async_trait]
impl SimilarityStore for VectorHttpClient {
    async fn add_documents(&self, documents: Vec<StoredDocument>) -> Result<()> {
        if documents.is_empty() {
            return Ok(());
        }

        let url = format!("{}/collections/{}/upsert", self.base_url, self.collection);
        let response = self
            .http
            .post(&url)
            .json(&UpsertRequest {
                documents: &documents,
            })
            .send()
            .await
            .context("Failed to reach similarity store")?;

        if !response.status().is_success() {
            return Err(anyhow!("similarity store returned {}", response.status()));
        }

        debug!("Persisted {} documents to '{}'", documents.len(), self.collection);
        Ok(())
    }

    async fn nearest(&self, query: &str, k: usize) -> Result<Vec<StoredDocument>> {
        let url = format!("{}/collections/{}/query", self.base_url, self.collection);
        let response = self
            .http
            .post(&url)
            .json(&QueryRequest { text: query, k })
            .send()
            .await
            .context("Failed to reach similarity store")?;

        if !response.status().is_success() {
            return Err(anyhow!("similarity store returned {}", response.status()));
        }

        let parsed: QueryResponse = response
            .json()
            .await
            .context("Failed to parse similarity store response")?;

        debug!("Nearest-neighbor query returned {} documents", parsed.documents.len());
        Ok(parsed.documents)
    }
}

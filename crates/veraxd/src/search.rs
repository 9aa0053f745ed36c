//! Web-search collaborator.
//!
//! Queries a SearxNG instance over its JSON API and caps results per query.
//! Responses are small, so repeated queries within a process hit an LRU cache
//! instead of the network.

use crate::config::SearchConfig;
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use lru::LruCache;
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::sync::Mutex;
use std::time::Duration;
use tracing::debug;

/// One result row from the search collaborator, in collaborator-native
/// relevance order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub snippet: String,
    pub link: String,
    /// Publication date if the engine reported one, unparsed.
    pub date: Option<String>,
    /// Engine or outlet name.
    pub source: String,
}

/// Search service consumed by the researcher.
#[async_trait]
pub trait WebSearch: Send + Sync {
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>>;
}

/// SearxNG JSON-API response subset.
#[derive(Debug, Deserialize)]
struct SearxResponse {
    #[serde(default)]
    results: Vec<SearxResult>,
}

#[derive(Debug, Deserialize)]
struct SearxResult {
    #[serde(default)]
    title: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    url: String,
    #[serde(rename = "publishedDate")]
    published_date: Option<String>,
    #[serde(default)]
    engine: String,
}

/// SearxNG client with an in-process response cache.
pub struct SearxClient {
    http: reqwest::Client,
    base_url: String,
    max_results: usize,
    cache: Mutex<LruCache<String, Vec<SearchHit>>>,
}

impl SearxClient {
    pub fn new(config: &SearchConfig) -> Self {
        let capacity =
            NonZeroUsize::new(config.cache_entries.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            http: reqwest::Client::builder()
                .timeout(Duration::from_secs(config.timeout_secs))
                .build()
                .unwrap_or_default(),
            base_url: config.url.trim_end_matches('/').to_string(),
            max_results: config.results_per_query,
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    fn cache_get(&self, query: &str) -> Option<Vec<SearchHit>> {
        self.cache.lock().ok()?.get(query).cloned()
    }

    fn cache_put(&self, query: &str, hits: &[SearchHit]) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.put(query.to_string(), hits.to_vec());
        }
    }
}

#[async_trait]
impl WebSearch for SearxClient {
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>> {
        if let Some(hits) = self.cache_get(query) {
            debug!("Search cache hit for '{}'", query);
            return Ok(hits);
        }

        let response = self
            .http
            .get(format!("{}/search", self.base_url))
            .query(&[("q", query), ("format", "json")])
            .send()
            .await
            .context("Failed to reach search service")?;

        if !response.status().is_success() {
            return Err(anyhow!("search service returned {}", response.status()));
        }

        let parsed: SearxResponse = response
            .json()
            .await
            .context("Failed to parse search response")?;

        let hits: Vec<SearchHit> = parsed
            .results
            .into_iter()
            .filter(|r| !r.url.is_empty())
            .take(self.max_results)
            .map(|r| SearchHit {
                title: r.title,
                snippet: r.content,
                link: r.url,
                date: r.published_date,
                source: if r.engine.is_empty() {
                    "web".to_string()
                } else {
                    r.engine
                },
            })
            .collect();

        debug!("Search '{}' returned {} hits", query, hits.len());
        self.cache_put(query, &hits);
        Ok(hits)
    }
}

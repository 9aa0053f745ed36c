//! Configuration management for veraxd.
//!
//! Loads settings from /etc/verax/config.toml (or `VERAX_CONFIG`), falls back
//! to defaults, then applies environment overrides for the collaborator URLs.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// Config file path
pub const CONFIG_PATH: &str = "/etc/verax/config.toml";

/// Language-model collaborator settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Base URL of the completion service.
    #[serde(default = "default_llm_url")]
    pub url: String,

    /// Model used for all pipeline stages.
    #[serde(default = "default_model")]
    pub model: String,

    /// Per-call timeout in seconds.
    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,
}

fn default_llm_url() -> String {
    "http://127.0.0.1:11434".to_string()
}

fn default_model() -> String {
    "qwen3:8b".to_string()
}

fn default_llm_timeout() -> u64 {
    30
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            url: default_llm_url(),
            model: default_model(),
            timeout_secs: default_llm_timeout(),
        }
    }
}

/// Web-search collaborator settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Base URL of the SearxNG instance.
    #[serde(default = "default_search_url")]
    pub url: String,

    /// Per-query result cap.
    #[serde(default = "default_results_per_query")]
    pub results_per_query: usize,

    /// Per-query timeout in seconds.
    #[serde(default = "default_search_timeout")]
    pub timeout_secs: u64,

    /// Entries kept in the in-process response cache.
    #[serde(default = "default_cache_entries")]
    pub cache_entries: usize,
}

fn default_search_url() -> String {
    "http://127.0.0.1:8888".to_string()
}

fn default_results_per_query() -> usize {
    4
}

fn default_search_timeout() -> u64 {
    10
}

fn default_cache_entries() -> usize {
    256
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            url: default_search_url(),
            results_per_query: default_results_per_query(),
            timeout_secs: default_search_timeout(),
            cache_entries: default_cache_entries(),
        }
    }
}

/// Similarity-store collaborator settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Base URL of the vector store.
    #[serde(default = "default_store_url")]
    pub url: String,

    /// Collection evidence documents are persisted into.
    #[serde(default = "default_collection")]
    pub collection: String,

    /// Documents retrieved per nearest-neighbor query.
    #[serde(default = "default_nearest_k")]
    pub nearest_k: usize,

    /// Per-call timeout in seconds.
    #[serde(default = "default_store_timeout")]
    pub timeout_secs: u64,
}

fn default_store_url() -> String {
    "http://127.0.0.1:8000".to_string()
}

fn default_collection() -> String {
    "evidence".to_string()
}

fn default_nearest_k() -> usize {
    20
}

fn default_store_timeout() -> u64 {
    10
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: default_store_url(),
            collection: default_collection(),
            nearest_k: default_nearest_k(),
            timeout_secs: default_store_timeout(),
        }
    }
}

/// Pipeline-level settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Global deadline for one verification run, in seconds.
    #[serde(default = "default_deadline")]
    pub deadline_secs: u64,
}

fn default_deadline() -> u64 {
    120
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            deadline_secs: default_deadline(),
        }
    }
}

/// Top-level daemon configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VeraxConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub search: SearchConfig,

    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub pipeline: PipelineConfig,
}

fn default_bind_addr() -> String {
    "127.0.0.1:7791".to_string()
}

impl Default for VeraxConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            llm: LlmConfig::default(),
            search: SearchConfig::default(),
            store: StoreConfig::default(),
            pipeline: PipelineConfig::default(),
        }
    }
}

impl VeraxConfig {
    /// Load from the config file, falling back to defaults when absent or
    /// unreadable, then apply environment overrides.
    pub fn load() -> Self {
        let path = std::env::var("VERAX_CONFIG").unwrap_or_else(|_| CONFIG_PATH.to_string());
        let mut config = match Self::load_from(Path::new(&path)) {
            Ok(config) => {
                info!("Loaded config from {}", path);
                config
            }
            Err(e) => {
                warn!("Could not load {}: {} - using defaults", path, e);
                Self::default()
            }
        };
        config.apply_env_overrides();
        config
    }

    fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("VERAX_LLM_URL") {
            self.llm.url = url;
        }
        if let Ok(model) = std::env::var("VERAX_LLM_MODEL") {
            self.llm.model = model;
        }
        if let Ok(url) = std::env::var("VERAX_SEARCH_URL") {
            self.search.url = url;
        }
        if let Ok(url) = std::env::var("VERAX_STORE_URL") {
            self.store.url = url;
        }
        if let Ok(secs) = std::env::var("VERAX_DEADLINE_SECS") {
            match secs.parse() {
                Ok(parsed) => self.pipeline.deadline_secs = parsed,
                Err(_) => warn!("Ignoring unparseable VERAX_DEADLINE_SECS={}", secs),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = VeraxConfig::default();
        assert_eq!(config.pipeline.deadline_secs, 120);
        assert_eq!(config.search.results_per_query, 4);
        assert_eq!(config.store.nearest_k, 20);
        assert_eq!(config.bind_addr, "127.0.0.1:7791");
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let toml = r#"
            bind_addr = "0.0.0.0:9000"

            [llm]
            model = "llama3.1:8b"
        "#;
        let config: VeraxConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.bind_addr, "0.0.0.0:9000");
        assert_eq!(config.llm.model, "llama3.1:8b");
        assert_eq!(config.llm.timeout_secs, 30);
        assert_eq!(config.pipeline.deadline_secs, 120);
    }

    #[test]
    fn test_empty_toml_is_all_defaults() {
        let config: VeraxConfig = toml::from_str("").unwrap();
        assert_eq!(config.llm.model, default_model());
        assert_eq!(config.store.collection, "evidence");
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
            [pipeline]
            deadline_secs = 45

            [search]
            results_per_query = 2
            "#,
        )
        .unwrap();

        let config = VeraxConfig::load_from(&path).unwrap();
        assert_eq!(config.pipeline.deadline_secs, 45);
        assert_eq!(config.search.results_per_query, 2);
        assert_eq!(config.llm.timeout_secs, 30);
    }

    #[test]
    fn test_load_from_missing_file_errors() {
        assert!(VeraxConfig::load_from(Path::new("/nonexistent/verax.toml")).is_err());
    }
}

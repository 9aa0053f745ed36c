//! Language-model collaborator.
//!
//! One trait at the seam, one production client speaking the Ollama API.
//! The client is shared read-only across concurrent runs; prompts that need
//! structured output carry their own "JSON only" instructions and are parsed
//! through the recovery chain, never trusted to be clean.

use crate::config::LlmConfig;
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, info};

/// Completion service consumed by every pipeline stage that reasons.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn complete(&self, prompt: &str, max_tokens: u32, temperature: f32) -> Result<String>;

    /// Liveness probe for the health endpoint.
    async fn is_available(&self) -> bool {
        true
    }
}

/// Ollama-backed completion client.
pub struct OllamaClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
}

impl OllamaClient {
    pub fn new(config: &LlmConfig) -> Self {
        Self {
            http: reqwest::Client::builder()
                .timeout(Duration::from_secs(config.timeout_secs))
                .build()
                .unwrap_or_default(),
            base_url: config.url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
        }
    }
}

#[async_trait]
impl LanguageModel for OllamaClient {
    async fn is_available(&self) -> bool {
        self.http
            .get(format!("{}/api/tags", self.base_url))
            .send()
            .await
            .map(|r| r.status().is_success())
            .unwrap_or(false)
    }

    async fn complete(&self, prompt: &str, max_tokens: u32, temperature: f32) -> Result<String> {
        let body = serde_json::json!({
            "model": self.model,
            "prompt": prompt,
            "stream": false,
            "options": {
                "num_predict": max_tokens,
                "temperature": temperature,
            }
        });

        debug!(
            "[>] LLM call [{}] ({} prompt chars, temp {})",
            self.model,
            prompt.len(),
            temperature
        );

        let response = self
            .http
            .post(format!("{}/api/generate", self.base_url))
            .json(&body)
            .send()
            .await
            .context("Failed to send request to completion service")?;

        if !response.status().is_success() {
            return Err(anyhow!("completion service returned {}", response.status()));
        }

        let json: serde_json::Value = response
            .json()
            .await
            .context("Failed to parse completion response")?;

        let text = json
            .get("response")
            .and_then(|r| r.as_str())
            .unwrap_or("")
            .to_string();

        info!("[<] LLM response ({} chars)", text.len());
        Ok(text)
    }
}

//! HTTP server bootstrap.

use crate::config::VeraxConfig;
use crate::llm::{LanguageModel, OllamaClient};
use crate::routes;
use crate::search::{SearxClient, WebSearch};
use crate::store::{SimilarityStore, VectorHttpClient};
use anyhow::{Context, Result};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Shared, read-only collaborators plus configuration. Cloned cheaply into
/// every request; per-run state lives in the engine, never here.
pub struct AppState {
    pub config: VeraxConfig,
    pub llm: Arc<dyn LanguageModel>,
    pub search: Arc<dyn WebSearch>,
    pub store: Arc<dyn SimilarityStore>,
}

impl AppState {
    /// Wire up the production collaborators from config.
    pub fn from_config(config: VeraxConfig) -> Self {
        let llm = Arc::new(OllamaClient::new(&config.llm));
        let search = Arc::new(SearxClient::new(&config.search));
        let store = Arc::new(VectorHttpClient::new(&config.store));
        Self {
            config,
            llm,
            search,
            store,
        }
    }
}

/// Bind and serve until shutdown.
pub async fn run(config: VeraxConfig) -> Result<()> {
    let bind_addr = config.bind_addr.clone();
    let state = Arc::new(AppState::from_config(config));

    let app = routes::router(state).layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", bind_addr))?;

    info!("veraxd listening on {}", bind_addr);
    axum::serve(listener, app)
        .await
        .context("HTTP server exited with an error")?;

    Ok(())
}

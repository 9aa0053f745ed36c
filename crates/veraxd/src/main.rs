//! Verax daemon - claim verification service.
//!
//! Classifies, decomposes, researches, scores, and adjudicates factual claims
//! against retrieved evidence, under a global deadline.

use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;
use veraxd::config::VeraxConfig;
use veraxd::server;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("veraxd v{} starting", env!("CARGO_PKG_VERSION"));

    let config = VeraxConfig::load();
    server::run(config).await
}

//! API routes for veraxd.
//!
//! Thin surface: request-contract validation, one engine per request, and the
//! streaming channel. Everything interesting happens inside the pipeline.

use crate::llm::LanguageModel;
use crate::pipeline::{ClaimVerifier, PipelineEngine};
use crate::server::AppState;
use axum::{
    body::Body,
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::{error, info};
use verax_common::{
    create_channel_emitter, Claim, NullEmitter, StreamEvent, VerificationContext,
    VerificationResult, VerifyError,
};

type AppStateArc = Arc<AppState>;

/// Inbound verification request.
#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    pub claim: String,
    #[serde(rename = "userId")]
    pub user_id: Option<String>,
    #[serde(rename = "conversationId")]
    pub conversation_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub llm_available: bool,
}

pub fn router(state: AppStateArc) -> Router {
    Router::new()
        .route("/v1/verify", post(verify))
        .route("/v1/verify/stream", post(verify_stream))
        .route("/v1/health", get(health))
        .with_state(state)
}

/// One engine per inbound request; concurrent requests never share run state.
fn build_engine(state: &AppState) -> PipelineEngine {
    PipelineEngine::new(
        Arc::clone(&state.llm),
        Arc::clone(&state.search),
        Arc::clone(&state.store),
        state.config.store.nearest_k,
        Duration::from_secs(state.config.pipeline.deadline_secs),
    )
}

async fn verify(
    State(state): State<AppStateArc>,
    Json(req): Json<VerifyRequest>,
) -> Result<Json<VerificationResult>, (StatusCode, String)> {
    let claim = Claim::new(req.claim).map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;
    let context = VerificationContext::new(req.user_id, req.conversation_id);
    info!(request_id = %context.request_id, "Verify request accepted");

    let engine = build_engine(&state);
    match engine.verify(&claim, &context, &NullEmitter).await {
        Ok(result) => Ok(Json(result)),
        Err(VerifyError::AlreadyRunning) => {
            Err((StatusCode::CONFLICT, VerifyError::AlreadyRunning.to_string()))
        }
        Err(e) => Err((StatusCode::BAD_REQUEST, e.to_string())),
    }
}

/// Streaming variant: step events per stage, then one terminal result or
/// error event, as newline-delimited JSON. The run continues to completion
/// even if the consumer disconnects mid-stream.
async fn verify_stream(
    State(state): State<AppStateArc>,
    Json(req): Json<VerifyRequest>,
) -> Response {
    let claim = match Claim::new(req.claim) {
        Ok(claim) => claim,
        Err(e) => return (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
    };
    let context = VerificationContext::new(req.user_id, req.conversation_id);
    info!(request_id = %context.request_id, "Streaming verify request accepted");

    let (emitter, rx) = create_channel_emitter();
    let engine = build_engine(&state);

    tokio::spawn(async move {
        match engine.verify(&claim, &context, &emitter).await {
            Ok(result) => emitter.send(StreamEvent::Result { result }),
            Err(e) => {
                error!(request_id = %context.request_id, "Run rejected: {}", e);
                emitter.send(StreamEvent::Error {
                    message: e.to_string(),
                });
            }
        }
    });

    let lines = UnboundedReceiverStream::new(rx).map(|event| {
        let line = serde_json::to_string(&event).unwrap_or_default();
        Ok::<_, Infallible>(format!("{}\n", line))
    });

    (
        [(header::CONTENT_TYPE, "application/x-ndjson")],
        Body::from_stream(lines),
    )
        .into_response()
}

async fn health(State(state): State<AppStateArc>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        llm_available: state.llm.is_available().await,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verify_request_field_names() {
        let json = r#"{"claim": "x", "userId": "u1", "conversationId": "c1"}"#;
        let req: VerifyRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.claim, "x");
        assert_eq!(req.user_id.as_deref(), Some("u1"));
        assert_eq!(req.conversation_id.as_deref(), Some("c1"));
    }

    #[test]
    fn test_verify_request_optionals_absent() {
        let req: VerifyRequest = serde_json::from_str(r#"{"claim": "x"}"#).unwrap();
        assert!(req.user_id.is_none());
        assert!(req.conversation_id.is_none());
    }
}

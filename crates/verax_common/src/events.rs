//! Progress streaming for pipeline runs.
//!
//! The orchestrator emits one step event after every stage transition, in
//! strict stage order. Delivery is synchronous relative to stage completion;
//! a hung-up consumer is ignored so the run can finish in the background.

use crate::types::VerificationResult;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// An event on the streaming channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// Human-readable progress marker, one per completed stage.
    Step { message: String },
    /// Terminal event carrying the structured result.
    Result { result: VerificationResult },
    /// Terminal event on unrecoverable failure.
    Error { message: String },
}

/// Observer callback injected into the orchestrator.
pub trait ProgressEmitter: Send + Sync {
    fn step(&self, message: &str);
}

/// Emitter that drops everything. Used by the synchronous endpoint.
pub struct NullEmitter;

impl ProgressEmitter for NullEmitter {
    fn step(&self, _message: &str) {}
}

/// Emitter backed by an unbounded channel, for the streaming endpoint.
///
/// Send failures mean the consumer disconnected; events are silently dropped
/// and the run continues to completion.
pub struct ChannelEmitter {
    tx: mpsc::UnboundedSender<StreamEvent>,
}

impl ChannelEmitter {
    pub fn new(tx: mpsc::UnboundedSender<StreamEvent>) -> Self {
        Self { tx }
    }

    /// Forward a terminal event. Same drop-on-disconnect semantics as steps.
    pub fn send(&self, event: StreamEvent) {
        let _ = self.tx.send(event);
    }
}

impl ProgressEmitter for ChannelEmitter {
    fn step(&self, message: &str) {
        let _ = self.tx.send(StreamEvent::Step {
            message: message.to_string(),
        });
    }
}

/// Create a channel emitter and its receiving half.
pub fn create_channel_emitter() -> (ChannelEmitter, mpsc::UnboundedReceiver<StreamEvent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (ChannelEmitter::new(tx), rx)
}

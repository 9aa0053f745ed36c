//! Verax Common - Shared types and utilities for the claim verification pipeline.
//!
//! Everything here is collaborator-agnostic: domain types, the JSON recovery
//! chain for model output, the bounded retry policy, and progress streaming.

pub mod error;
pub mod events;
pub mod extract;
pub mod retry;
pub mod types;

pub use error::*;
pub use events::*;
pub use extract::extract_json;
pub use retry::*;
pub use types::*;

//! Caller-visible errors.
//!
//! Everything else that can go wrong inside a run is absorbed into a degraded
//! but valid result; these two are the only hard failures a caller sees.

use thiserror::Error;

/// Maximum accepted claim length in characters.
pub const MAX_CLAIM_CHARS: usize = 1000;

/// Errors surfaced to the caller of a verification run.
#[derive(Debug, Error)]
pub enum VerifyError {
    /// The request failed the input contract before any pipeline work started.
    #[error("invalid claim: {0}")]
    InvalidClaim(String),

    /// A second run was issued on an engine that is still verifying.
    #[error("a verification run is already active on this engine")]
    AlreadyRunning,
}

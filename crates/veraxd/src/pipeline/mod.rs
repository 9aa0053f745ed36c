//! The claim verification pipeline.
//!
//! Stage order: classify -> analyze -> research -> curate -> fact-check ->
//! synthesize, orchestrated by [`engine::PipelineEngine`] under a global
//! deadline. Casual queries short-circuit after classification.

pub mod analyzer;
pub mod classifier;
pub mod curator;
pub mod engine;
pub mod fact_checker;
pub mod researcher;
pub mod synthesizer;

pub use engine::{ClaimVerifier, PipelineEngine, PipelineState};

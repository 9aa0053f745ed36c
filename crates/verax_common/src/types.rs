//! Domain types for claim verification.
//!
//! The serialized field names of [`VerificationResult`] and
//! [`EvidenceDocument`] are the consumer contract; renames here are
//! load-bearing.

use crate::error::{VerifyError, MAX_CLAIM_CHARS};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Claim
// ============================================================================

/// A factual statement submitted for verification.
///
/// Construction enforces the request contract: non-empty after trimming,
/// at most [`MAX_CLAIM_CHARS`] characters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Claim(String);

impl Claim {
    pub fn new(text: impl Into<String>) -> Result<Self, VerifyError> {
        let text = text.into();
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(VerifyError::InvalidClaim("claim is empty".to_string()));
        }
        if trimmed.chars().count() > MAX_CLAIM_CHARS {
            return Err(VerifyError::InvalidClaim(format!(
                "claim exceeds {} characters",
                MAX_CLAIM_CHARS
            )));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Claim {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// Classification
// ============================================================================

/// Routing decision for an incoming query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryKind {
    /// Small talk or opinion - answered conversationally, no pipeline.
    Casual,
    /// A factual claim that must go through the full pipeline.
    VerificationRequired,
}

impl QueryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Casual => "casual",
            Self::VerificationRequired => "verification_required",
        }
    }
}

// ============================================================================
// Claim analysis
// ============================================================================

/// Decomposition of a claim produced once per run, read-only afterward.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaimAnalysis {
    /// Atomic factual assertions extracted from the claim.
    pub sub_claims: Vec<String>,
    /// Salient search terms.
    pub keywords: Vec<String>,
    /// One-sentence description of what the claim is about.
    pub context: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub entities: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub locations: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dates: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub numbers: Vec<String>,
}

// ============================================================================
// Evidence
// ============================================================================

/// A retrieved text fragment with source metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvidenceDocument {
    pub title: String,
    pub snippet: String,
    pub source_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Publication date as reported by the collaborator, unparsed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<String>,
}

/// An evidence document with curation scores attached.
///
/// Derived per run, never serialized to the consumer.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredEvidence {
    pub document: EvidenceDocument,
    /// Fraction of salient claim tokens found in the document text.
    pub keyword_score: f64,
    /// Decayed publication-age weight in [0, 1].
    pub recency_weight: f64,
    /// Weighted blend used for ranking and the inclusion threshold.
    pub combined_score: f64,
}

// ============================================================================
// Run correlation
// ============================================================================

/// Correlation metadata for one pipeline run. Not business state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationContext {
    pub request_id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl VerificationContext {
    pub fn new(user_id: Option<String>, conversation_id: Option<String>) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            user_id,
            conversation_id,
            timestamp: Utc::now(),
        }
    }
}

// ============================================================================
// Verdict and risk
// ============================================================================

/// Tri-state adjudication outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verdict {
    Supported,
    Refuted,
    Inconclusive,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Supported => "SUPPORTED",
            Self::Refuted => "REFUTED",
            Self::Inconclusive => "INCONCLUSIVE",
        }
    }
}

/// Coarse uncertainty classification attached to the final result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
        }
    }
}

// ============================================================================
// Final result
// ============================================================================

/// The terminal, structured outcome of one verification run.
///
/// Exactly one of these (or a fallback substitute) is produced per run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationResult {
    pub is_verified: bool,
    /// Confidence in the verdict, 0-100.
    pub confidence: u8,
    pub risk_level: RiskLevel,
    /// Structural description of the claim decomposition.
    pub analysis: String,
    /// User-facing summary of the adjudication.
    pub fact_check_summary: String,
    /// Deduplicated, ranked evidence; every entry carries an absolute link.
    pub evidence: Vec<EvidenceDocument>,
    /// Queries issued against the web-search collaborator.
    pub search_queries: Vec<String>,
    /// Number of distinct sources behind the surfaced evidence.
    pub evidence_sources: u32,
}

//! Result synthesis.
//!
//! Maps the adjudication and curated evidence onto the consumer contract:
//! confidence band per verdict, risk level, user-facing summary. The summary
//! gets at most one refinement pass, and only when it cites no recent
//! evidence; otherwise it passes through untouched.

use crate::llm::LanguageModel;
use crate::pipeline::fact_checker::Adjudication;
use crate::prompts;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};
use verax_common::{
    Claim, ClaimAnalysis, EvidenceDocument, RiskLevel, ScoredEvidence, VerificationResult, Verdict,
};

const SUMMARY_MAX_TOKENS: u32 = 300;
const SUMMARY_TEMPERATURE: f32 = 0.3;

/// Evidence below this mean combined score, or with fewer than this many
/// items, is treated as weak and caps confidence at the inconclusive band.
const WEAK_EVIDENCE_MIN_ITEMS: usize = 2;
const WEAK_EVIDENCE_MIN_SCORE: f64 = 0.45;

/// Recency weight at or above which an item counts as recent for citation.
const RECENT_WEIGHT_FLOOR: f64 = 0.6;

/// Confidence ceiling for anything not squarely decided.
const INCONCLUSIVE_MAX_CONFIDENCE: u8 = 60;

/// Builds the final structured result.
pub struct Synthesizer {
    llm: Arc<dyn LanguageModel>,
}

impl Synthesizer {
    pub fn new(llm: Arc<dyn LanguageModel>) -> Self {
        Self { llm }
    }

    pub async fn synthesize(
        &self,
        claim: &Claim,
        analysis: &ClaimAnalysis,
        evidence: &[ScoredEvidence],
        adjudication: &Adjudication,
        search_queries: Vec<String>,
    ) -> VerificationResult {
        let (is_verified, mut confidence, mut risk_level) =
            map_verdict(adjudication.verdict, evidence);

        if evidence_is_weak(evidence) {
            confidence = confidence.min(INCONCLUSIVE_MAX_CONFIDENCE);
            risk_level = risk_level.max(RiskLevel::Medium);
        }

        let summary = if evidence.is_empty() {
            format!(
                "There is insufficient evidence to verify this claim: \"{}\". \
                 No relevant sources were found.",
                claim.as_str()
            )
        } else {
            let draft = self.draft_summary(claim, adjudication, evidence).await;
            self.refine_summary(draft, evidence).await
        };

        let surfaced: Vec<EvidenceDocument> =
            evidence.iter().map(|s| s.document.clone()).collect();
        let sources: HashSet<String> = surfaced
            .iter()
            .map(|d| d.source_name.trim().to_lowercase())
            .collect();

        VerificationResult {
            is_verified,
            confidence,
            risk_level,
            analysis: describe_analysis(analysis),
            fact_check_summary: summary,
            evidence: surfaced,
            search_queries,
            evidence_sources: sources.len() as u32,
        }
    }

    async fn draft_summary(
        &self,
        claim: &Claim,
        adjudication: &Adjudication,
        evidence: &[ScoredEvidence],
    ) -> String {
        let prompt = prompts::summary_prompt(
            claim.as_str(),
            adjudication.verdict.as_str(),
            &adjudication.reasoning,
            evidence,
        );
        match self
            .llm
            .complete(&prompt, SUMMARY_MAX_TOKENS, SUMMARY_TEMPERATURE)
            .await
        {
            Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
            Ok(_) => deterministic_summary(adjudication),
            Err(e) => {
                warn!("Summary call failed: {} - using adjudicator reasoning", e);
                deterministic_summary(adjudication)
            }
        }
    }

    /// One refinement pass, and only when the summary cites no recent item.
    /// A compliant summary passes through unchanged.
    async fn refine_summary(&self, summary: String, evidence: &[ScoredEvidence]) -> String {
        if cites_recent_evidence(&summary, evidence) {
            return summary;
        }
        debug!("Summary cites no recent evidence - running one refinement pass");
        let prompt = prompts::refine_summary_prompt(&summary, evidence);
        match self
            .llm
            .complete(&prompt, SUMMARY_MAX_TOKENS, SUMMARY_TEMPERATURE)
            .await
        {
            Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
            _ => summary,
        }
    }
}

/// Verdict-to-contract mapping.
fn map_verdict(verdict: Verdict, evidence: &[ScoredEvidence]) -> (bool, u8, RiskLevel) {
    let strength = mean_combined_score(evidence);
    match verdict {
        Verdict::Supported => (true, decided_confidence(strength), RiskLevel::Low),
        Verdict::Refuted => (false, decided_confidence(strength), RiskLevel::Medium),
        Verdict::Inconclusive => {
            let confidence = (30.0 + strength * 30.0).round() as u8;
            (
                false,
                confidence.min(INCONCLUSIVE_MAX_CONFIDENCE),
                RiskLevel::Medium,
            )
        }
    }
}

/// Confidence for a decided verdict: 70-95, scaled by evidence strength.
fn decided_confidence(strength: f64) -> u8 {
    let confidence = (70.0 + strength * 25.0).round() as u8;
    confidence.clamp(70, 95)
}

fn mean_combined_score(evidence: &[ScoredEvidence]) -> f64 {
    if evidence.is_empty() {
        return 0.0;
    }
    evidence.iter().map(|s| s.combined_score).sum::<f64>() / evidence.len() as f64
}

fn evidence_is_weak(evidence: &[ScoredEvidence]) -> bool {
    evidence.len() < WEAK_EVIDENCE_MIN_ITEMS
        || mean_combined_score(evidence) < WEAK_EVIDENCE_MIN_SCORE
}

/// Does the summary reference at least one recent item by index or date?
fn cites_recent_evidence(summary: &str, evidence: &[ScoredEvidence]) -> bool {
    let recent: Vec<(usize, &ScoredEvidence)> = evidence
        .iter()
        .enumerate()
        .filter(|(_, s)| s.recency_weight >= RECENT_WEIGHT_FLOOR)
        .collect();
    if recent.is_empty() {
        // Nothing recent to cite; the summary cannot be faulted for it.
        return true;
    }
    recent.iter().any(|(index, s)| {
        summary.contains(&format!("[{}]", index))
            || s.document
                .published_at
                .as_deref()
                .map(|d| !d.is_empty() && summary.contains(d))
                .unwrap_or(false)
    })
}

fn deterministic_summary(adjudication: &Adjudication) -> String {
    format!(
        "Verdict: {}. {}",
        adjudication.verdict.as_str(),
        adjudication.reasoning
    )
}

fn describe_analysis(analysis: &ClaimAnalysis) -> String {
    format!(
        "{} (decomposed into {} sub-claim(s); key terms: {})",
        analysis.context,
        analysis.sub_claims.len(),
        if analysis.keywords.is_empty() {
            "none".to_string()
        } else {
            analysis.keywords.join(", ")
        }
    )
}

/// Deterministic substitute when synthesis itself fails: a valid, clearly
/// cautious result.
pub fn degraded_result(
    claim: &Claim,
    search_queries: Vec<String>,
) -> VerificationResult {
    VerificationResult {
        is_verified: false,
        confidence: 50,
        risk_level: RiskLevel::Medium,
        analysis: "The claim could not be fully analyzed.".to_string(),
        fact_check_summary: format!(
            "Verification of \"{}\" did not complete normally. \
             Treat this claim with caution until it can be re-checked.",
            claim.as_str()
        ),
        evidence: Vec::new(),
        search_queries,
        evidence_sources: 0,
    }
}

//! Verdict adjudication.
//!
//! One reasoning call over the curated evidence, parsed through the recovery
//! chain. Unknown or unparseable verdicts are never promoted to a stronger
//! claim than the evidence supports: everything broken collapses to
//! INCONCLUSIVE.

use crate::llm::LanguageModel;
use crate::prompts;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};
use verax_common::{extract_json, Claim, ScoredEvidence, Verdict};

const FACT_CHECK_MAX_TOKENS: u32 = 600;
const FACT_CHECK_TEMPERATURE: f32 = 0.1;

/// Neutral reasoning used whenever adjudication cannot complete.
pub const NEUTRAL_REASONING: &str =
    "The available evidence was not sufficient to either support or refute the claim.";

/// Adjudication outcome.
#[derive(Debug, Clone)]
pub struct Adjudication {
    pub verdict: Verdict,
    pub reasoning: String,
}

/// Adjudicates a verdict from curated evidence.
pub struct FactChecker {
    llm: Arc<dyn LanguageModel>,
}

impl FactChecker {
    pub fn new(llm: Arc<dyn LanguageModel>) -> Self {
        Self { llm }
    }

    /// Never fails; every failure mode yields INCONCLUSIVE with neutral
    /// reasoning.
    pub async fn adjudicate(&self, claim: &Claim, evidence: &[ScoredEvidence]) -> Adjudication {
        if evidence.is_empty() {
            debug!("No curated evidence - adjudication is inconclusive by construction");
            return Adjudication {
                verdict: Verdict::Inconclusive,
                reasoning: NEUTRAL_REASONING.to_string(),
            };
        }

        let prompt = prompts::fact_check_prompt(claim.as_str(), evidence);
        match self
            .llm
            .complete(&prompt, FACT_CHECK_MAX_TOKENS, FACT_CHECK_TEMPERATURE)
            .await
        {
            Ok(text) => match extract_json(&text) {
                Some(value) => value_to_adjudication(&value),
                None => {
                    warn!("Adjudication output beyond recovery - inconclusive");
                    Adjudication {
                        verdict: Verdict::Inconclusive,
                        reasoning: NEUTRAL_REASONING.to_string(),
                    }
                }
            },
            Err(e) => {
                warn!("Adjudication call failed: {} - inconclusive", e);
                Adjudication {
                    verdict: Verdict::Inconclusive,
                    reasoning: NEUTRAL_REASONING.to_string(),
                }
            }
        }
    }
}

/// Map a recovered JSON value to an adjudication. Unknown verdicts are not
/// rubber-stamped into support.
fn value_to_adjudication(v: &Value) -> Adjudication {
    let verdict = match v
        .get("verdict")
        .and_then(|x| x.as_str())
        .map(|s| s.trim().to_uppercase())
        .as_deref()
    {
        Some("SUPPORTED") => Verdict::Supported,
        Some("REFUTED") => Verdict::Refuted,
        Some("INCONCLUSIVE") => Verdict::Inconclusive,
        other => {
            warn!("Unknown verdict {:?} - refusing to rubber-stamp", other);
            Verdict::Inconclusive
        }
    };

    let reasoning = v
        .get("reasoning")
        .and_then(|x| x.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(NEUTRAL_REASONING)
        .to_string();

    Adjudication { verdict, reasoning }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verdict_mapping() {
        let v = serde_json::json!({"verdict": "supported", "reasoning": "per [0] (2025-01-02)"});
        let adj = value_to_adjudication(&v);
        assert_eq!(adj.verdict, Verdict::Supported);
        assert!(adj.reasoning.contains("[0]"));
    }

    #[test]
    fn test_unknown_verdict_is_inconclusive() {
        let v = serde_json::json!({"verdict": "PROBABLY", "reasoning": "eh"});
        assert_eq!(value_to_adjudication(&v).verdict, Verdict::Inconclusive);
    }

    #[test]
    fn test_missing_reasoning_gets_neutral_text() {
        let v = serde_json::json!({"verdict": "REFUTED"});
        let adj = value_to_adjudication(&v);
        assert_eq!(adj.verdict, Verdict::Refuted);
        assert_eq!(adj.reasoning, NEUTRAL_REASONING);
    }

    #[test]
    fn test_blank_reasoning_gets_neutral_text() {
        let v = serde_json::json!({"verdict": "SUPPORTED", "reasoning": "   "});
        assert_eq!(value_to_adjudication(&v).reasoning, NEUTRAL_REASONING);
    }
}

//! Claim decomposition.
//!
//! One extraction call with a strict-JSON contract, parsed through the
//! recovery chain. When the model output is beyond recovery the analyzer
//! degrades to a deterministic heuristic rather than failing the run.

use crate::llm::LanguageModel;
use crate::prompts;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};
use verax_common::{extract_json, Claim, ClaimAnalysis, RetryPolicy};

const ANALYZER_MAX_TOKENS: u32 = 700;
const ANALYZER_TEMPERATURE: f32 = 0.2;

/// Heuristic keyword budget when the model gives us nothing.
const FALLBACK_KEYWORDS: usize = 5;

/// Decomposes a claim into sub-claims, keywords, and context.
pub struct ClaimAnalyzer {
    llm: Arc<dyn LanguageModel>,
    retry: RetryPolicy,
}

impl ClaimAnalyzer {
    pub fn new(llm: Arc<dyn LanguageModel>) -> Self {
        Self {
            llm,
            retry: RetryPolicy::default(),
        }
    }

    /// Analyze the claim. Never fails; the heuristic substitute covers every
    /// collaborator failure mode.
    pub async fn analyze(&self, claim: &Claim) -> ClaimAnalysis {
        let prompt = prompts::analyzer_prompt(claim.as_str());
        let llm = Arc::clone(&self.llm);

        let outcome = self
            .retry
            .run(
                || {
                    let llm = Arc::clone(&llm);
                    let prompt = prompt.clone();
                    async move {
                        llm.complete(&prompt, ANALYZER_MAX_TOKENS, ANALYZER_TEMPERATURE)
                            .await
                    }
                },
                |text| extract_json(text).is_some(),
            )
            .await;

        match outcome {
            Ok(text) => match extract_json(&text) {
                Some(value) => {
                    let analysis = value_to_analysis(&value, claim);
                    debug!(
                        "Claim decomposed into {} sub-claims, {} keywords",
                        analysis.sub_claims.len(),
                        analysis.keywords.len()
                    );
                    analysis
                }
                None => {
                    warn!("Extraction failed after validation - using heuristic");
                    heuristic_analysis(claim)
                }
            },
            Err(e) => {
                warn!("Claim analysis failed ({}) - using heuristic", e);
                heuristic_analysis(claim)
            }
        }
    }
}

/// Map a recovered JSON value to a ClaimAnalysis, tolerating nulls and
/// missing fields the way models actually misbehave.
fn value_to_analysis(v: &Value, claim: &Claim) -> ClaimAnalysis {
    let sub_claims = string_list(v.get("sub_claims"));
    let sub_claims = if sub_claims.is_empty() {
        vec![claim.as_str().to_string()]
    } else {
        sub_claims
    };

    ClaimAnalysis {
        sub_claims,
        keywords: string_list(v.get("keywords")),
        context: v
            .get("context")
            .and_then(|x| x.as_str())
            .filter(|s| !s.trim().is_empty())
            .unwrap_or("General factual claim")
            .to_string(),
        entities: string_list(v.get("entities")),
        locations: string_list(v.get("locations")),
        dates: string_list(v.get("dates")),
        numbers: string_list(v.get("numbers")),
    }
}

fn string_list(v: Option<&Value>) -> Vec<String> {
    v.and_then(|x| x.as_array())
        .map(|arr| {
            arr.iter()
                .filter_map(|x| x.as_str())
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

/// Deterministic substitute when every extraction tier fails: the claim is
/// its own sub-claim, keywords are its first few long tokens.
pub fn heuristic_analysis(claim: &Claim) -> ClaimAnalysis {
    let keywords: Vec<String> = claim
        .as_str()
        .split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()))
        .filter(|w| w.chars().count() > 3)
        .take(FALLBACK_KEYWORDS)
        .map(|w| w.to_lowercase())
        .collect();

    ClaimAnalysis {
        sub_claims: vec![claim.as_str().to_string()],
        keywords,
        context: "General factual claim".to_string(),
        entities: Vec::new(),
        locations: Vec::new(),
        dates: Vec::new(),
        numbers: Vec::new(),
    }
}

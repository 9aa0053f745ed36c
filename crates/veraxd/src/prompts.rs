//! Prompt building for the pipeline stages.
//!
//! Every prompt that expects structured output says "JSON only" explicitly;
//! the recovery chain in verax_common handles the models that ignore it.

use verax_common::ScoredEvidence;

/// Snippet budget for the adjudication prompt.
pub const FACT_CHECK_SNIPPETS: usize = 6;

/// Cap on snippet text forwarded to the adjudicator.
const SNIPPET_CHARS: usize = 400;

/// Binary routing prompt. Low temperature, tiny output.
pub fn classifier_prompt(claim: &str) -> String {
    format!(
        r#"Decide whether the following message is casual conversation or a factual claim that needs verification.

Message: "{}"

Reply with exactly one word: CASUAL or VERIFICATION.
No explanation, no punctuation."#,
        claim
    )
}

/// Claim decomposition prompt, strict JSON contract.
pub fn analyzer_prompt(claim: &str) -> String {
    format!(
        r#"Decompose the following factual claim for verification.

Claim: "{}"

Respond with JSON only, no prose, in exactly this shape:
{{
  "sub_claims": ["each atomic factual assertion"],
  "keywords": ["salient search terms"],
  "context": "one sentence on what the claim is about",
  "entities": ["named people or organizations"],
  "locations": ["place names"],
  "dates": ["dates or time references"],
  "numbers": ["quantities or statistics"]
}}"#,
        claim
    )
}

/// Adjudication prompt over indexed, dated evidence snippets.
pub fn fact_check_prompt(claim: &str, evidence: &[ScoredEvidence]) -> String {
    let mut snippets = String::new();
    for (index, item) in evidence.iter().take(FACT_CHECK_SNIPPETS).enumerate() {
        let date = item.document.published_at.as_deref().unwrap_or("undated");
        let mut text = item.document.snippet.clone();
        if text.chars().count() > SNIPPET_CHARS {
            text = text.chars().take(SNIPPET_CHARS).collect();
        }
        snippets.push_str(&format!(
            "[{}] ({}) {} - {}\n   {}\n",
            index, date, item.document.source_name, item.document.title, text
        ));
    }

    format!(
        r#"You are adjudicating a factual claim against retrieved evidence.

Claim: "{}"

Evidence (indexed, with publication dates):
{}
Rules:
- Favor the majority of strong, RECENT evidence.
- When older and newer evidence conflict, the newer evidence is authoritative unless clearly unreliable.
- Reference evidence by index and date in your reasoning.

Respond with JSON only:
{{"verdict": "SUPPORTED" | "REFUTED" | "INCONCLUSIVE", "reasoning": "cite evidence like [0] (2025-01-02)"}}"#,
        claim, snippets
    )
}

/// User-facing summary prompt.
pub fn summary_prompt(claim: &str, verdict: &str, reasoning: &str, evidence: &[ScoredEvidence]) -> String {
    let mut dated = String::new();
    for (index, item) in evidence.iter().take(FACT_CHECK_SNIPPETS).enumerate() {
        let date = item.document.published_at.as_deref().unwrap_or("undated");
        dated.push_str(&format!("[{}] ({}) {}\n", index, date, item.document.title));
    }

    format!(
        r#"Write a 2-3 sentence plain-language summary of this fact-check for an end user.

Claim: "{}"
Verdict: {}
Adjudicator reasoning: {}

Evidence items:
{}
Cite at least one evidence item by its index and date, like "[0] (2025-01-02)".
Reply with the summary text only."#,
        claim, verdict, reasoning, dated
    )
}

/// One-shot refinement prompt used only when the summary cites no recent item.
pub fn refine_summary_prompt(summary: &str, evidence: &[ScoredEvidence]) -> String {
    let mut recent = String::new();
    for (index, item) in evidence.iter().take(FACT_CHECK_SNIPPETS).enumerate() {
        let date = item.document.published_at.as_deref().unwrap_or("undated");
        recent.push_str(&format!("[{}] ({}) {}\n", index, date, item.document.title));
    }

    format!(
        r#"Rewrite this fact-check summary so it cites at least one of the evidence items below by index and date, like "[1] (2025-01-02)". Keep the meaning unchanged and the length to 2-3 sentences.

Summary: {}

Evidence items:
{}
Reply with the rewritten summary only."#,
        summary, recent
    )
}

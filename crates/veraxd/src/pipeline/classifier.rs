//! Casual-vs-verification routing.
//!
//! One low-temperature call with a binary-output instruction. Fail-closed:
//! anything ambiguous or broken routes to the full pipeline, never to the
//! casual path.

use crate::llm::LanguageModel;
use crate::prompts;
use std::sync::Arc;
use tracing::{debug, warn};
use verax_common::{Claim, QueryKind, RetryPolicy};

const CLASSIFIER_MAX_TOKENS: u32 = 8;
const CLASSIFIER_TEMPERATURE: f32 = 0.0;

/// Single-shot query router.
pub struct QueryClassifier {
    llm: Arc<dyn LanguageModel>,
    retry: RetryPolicy,
}

impl QueryClassifier {
    pub fn new(llm: Arc<dyn LanguageModel>) -> Self {
        Self {
            llm,
            retry: RetryPolicy::default(),
        }
    }

    /// Classify the query. Every failure mode collapses to
    /// [`QueryKind::VerificationRequired`].
    pub async fn classify(&self, claim: &Claim) -> QueryKind {
        let prompt = prompts::classifier_prompt(claim.as_str());
        let llm = Arc::clone(&self.llm);

        let outcome = self
            .retry
            .run(
                || {
                    let llm = Arc::clone(&llm);
                    let prompt = prompt.clone();
                    async move {
                        llm.complete(&prompt, CLASSIFIER_MAX_TOKENS, CLASSIFIER_TEMPERATURE)
                            .await
                    }
                },
                |text| parse_decision(text).is_some(),
            )
            .await;

        match outcome {
            Ok(text) => {
                let kind = parse_decision(&text).unwrap_or(QueryKind::VerificationRequired);
                debug!("Query classified as {}", kind.as_str());
                kind
            }
            Err(e) => {
                warn!("Classification failed ({}) - treating as verification", e);
                QueryKind::VerificationRequired
            }
        }
    }
}

/// Parse the binary marker out of the model output. `None` means the output
/// carried neither marker.
pub fn parse_decision(text: &str) -> Option<QueryKind> {
    let upper = text.to_uppercase();
    // Checked first so "CASUAL, NOT VERIFICATION-WORTHY" still routes safely.
    if upper.contains("VERIFICATION") {
        Some(QueryKind::VerificationRequired)
    } else if upper.contains("CASUAL") {
        Some(QueryKind::Casual)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_clean_markers() {
        assert_eq!(parse_decision("CASUAL"), Some(QueryKind::Casual));
        assert_eq!(
            parse_decision("VERIFICATION"),
            Some(QueryKind::VerificationRequired)
        );
    }

    #[test]
    fn test_parse_tolerates_prose_and_case() {
        assert_eq!(parse_decision("casual\n"), Some(QueryKind::Casual));
        assert_eq!(
            parse_decision("I think this needs Verification."),
            Some(QueryKind::VerificationRequired)
        );
    }

    #[test]
    fn test_parse_ambiguous_prefers_verification() {
        assert_eq!(
            parse_decision("CASUAL or VERIFICATION? Hard to say, VERIFICATION"),
            Some(QueryKind::VerificationRequired)
        );
    }

    #[test]
    fn test_parse_garbage_is_none() {
        assert_eq!(parse_decision("maybe?"), None);
        assert_eq!(parse_decision(""), None);
    }
}

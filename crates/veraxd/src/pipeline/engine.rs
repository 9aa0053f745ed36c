//! Pipeline orchestration.
//!
//! One engine instance owns one run at a time. The state machine is
//! forward-only, the whole run races a global deadline, and a progress event
//! is emitted after every stage transition before the next stage begins.
//! Internal stage failures degrade; only reentrancy is a hard error here.

use crate::llm::LanguageModel;
use crate::pipeline::analyzer::ClaimAnalyzer;
use crate::pipeline::classifier::QueryClassifier;
use crate::pipeline::curator::EvidenceCurator;
use crate::pipeline::fact_checker::FactChecker;
use crate::pipeline::researcher::EvidenceResearcher;
use crate::pipeline::synthesizer::{self, Synthesizer};
use crate::search::WebSearch;
use crate::store::SimilarityStore;
use anyhow::Result;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};
use verax_common::{
    Claim, ClaimAnalysis, ProgressEmitter, QueryKind, RiskLevel, ScoredEvidence,
    VerificationContext, VerificationResult, VerifyError,
};

/// Run states. Transitions are forward-only; no state is revisited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Classifying,
    CasualHandling,
    Analyzing,
    Researching,
    Curating,
    FactChecking,
    Synthesizing,
    Completed,
    Failed,
    TimedOut,
}

impl PipelineState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Classifying => "classifying",
            Self::CasualHandling => "casual_handling",
            Self::Analyzing => "analyzing",
            Self::Researching => "researching",
            Self::Curating => "curating",
            Self::FactChecking => "fact_checking",
            Self::Synthesizing => "synthesizing",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::TimedOut => "timed_out",
        }
    }
}

/// Public contract for a verification strategy. The staged pipeline below is
/// the canonical implementation; alternate execution engines implement this
/// same trait instead of duplicating the business logic.
#[async_trait]
pub trait ClaimVerifier: Send + Sync {
    async fn verify(
        &self,
        claim: &Claim,
        context: &VerificationContext,
        emitter: &dyn ProgressEmitter,
    ) -> Result<VerificationResult, VerifyError>;
}

/// What a run has gathered so far, for the deadline fallback.
#[derive(Default)]
struct PartialRun {
    analysis: Option<ClaimAnalysis>,
    queries: Vec<String>,
    evidence: Vec<ScoredEvidence>,
}

/// The hand-written staged pipeline.
pub struct PipelineEngine {
    classifier: QueryClassifier,
    analyzer: ClaimAnalyzer,
    researcher: EvidenceResearcher,
    curator: EvidenceCurator,
    fact_checker: FactChecker,
    synthesizer: Synthesizer,
    deadline: Duration,
    running: AtomicBool,
    state: Mutex<PipelineState>,
}

/// Releases the reentrancy guard when the run ends, however it ends.
struct RunGuard<'a>(&'a AtomicBool);

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl PipelineEngine {
    pub fn new(
        llm: Arc<dyn LanguageModel>,
        search: Arc<dyn WebSearch>,
        store: Arc<dyn SimilarityStore>,
        nearest_k: usize,
        deadline: Duration,
    ) -> Self {
        Self {
            classifier: QueryClassifier::new(Arc::clone(&llm)),
            analyzer: ClaimAnalyzer::new(Arc::clone(&llm)),
            researcher: EvidenceResearcher::new(search, store, nearest_k),
            curator: EvidenceCurator::new(),
            fact_checker: FactChecker::new(Arc::clone(&llm)),
            synthesizer: Synthesizer::new(llm),
            deadline,
            running: AtomicBool::new(false),
            state: Mutex::new(PipelineState::Idle),
        }
    }

    /// Current state, for observability.
    pub fn state(&self) -> PipelineState {
        self.state
            .lock()
            .map(|s| *s)
            .unwrap_or(PipelineState::Failed)
    }

    fn transition(&self, next: PipelineState) {
        if let Ok(mut state) = self.state.lock() {
            debug!("Pipeline {} -> {}", state.as_str(), next.as_str());
            *state = next;
        }
    }

    async fn run_pipeline(
        &self,
        claim: &Claim,
        emitter: &dyn ProgressEmitter,
        partial: &Mutex<PartialRun>,
    ) -> Result<VerificationResult> {
        self.transition(PipelineState::Classifying);
        let kind = self.classifier.classify(claim).await;
        emitter.step(&format!("Query classified as {}", kind.as_str()));

        if kind == QueryKind::Casual {
            self.transition(PipelineState::CasualHandling);
            let result = casual_result(claim);
            emitter.step("Answered conversationally without verification");
            return Ok(result);
        }

        self.transition(PipelineState::Analyzing);
        let analysis = self.analyzer.analyze(claim).await;
        if let Ok(mut p) = partial.lock() {
            p.analysis = Some(analysis.clone());
        }
        emitter.step(&format!(
            "Claim decomposed into {} sub-claim(s)",
            analysis.sub_claims.len()
        ));

        self.transition(PipelineState::Researching);
        let research = self.researcher.research(claim, &analysis).await;
        if let Ok(mut p) = partial.lock() {
            p.queries = research.queries.clone();
        }
        emitter.step(&format!(
            "Gathered {} candidate document(s) from {} search queries",
            research.candidates.len(),
            research.queries.len()
        ));

        self.transition(PipelineState::Curating);
        let curated = self.curator.curate(claim.as_str(), research.candidates);
        if let Ok(mut p) = partial.lock() {
            p.evidence = curated.clone();
        }
        emitter.step(&format!("Curated {} evidence item(s)", curated.len()));

        self.transition(PipelineState::FactChecking);
        let adjudication = self.fact_checker.adjudicate(claim, &curated).await;
        emitter.step(&format!("Adjudicated: {}", adjudication.verdict.as_str()));

        self.transition(PipelineState::Synthesizing);
        let result = self
            .synthesizer
            .synthesize(claim, &analysis, &curated, &adjudication, research.queries)
            .await;
        emitter.step("Verification result ready");

        Ok(result)
    }

    /// Best-effort result from whatever the run gathered before the deadline.
    fn timeout_result(&self, claim: &Claim, partial: &Mutex<PartialRun>) -> VerificationResult {
        let (analysis, queries, evidence) = match partial.lock() {
            Ok(p) => (
                p.analysis.clone(),
                p.queries.clone(),
                p.evidence.clone(),
            ),
            Err(_) => (None, Vec::new(), Vec::new()),
        };

        let surfaced: Vec<_> = evidence.iter().map(|s| s.document.clone()).collect();
        let sources: std::collections::HashSet<String> = surfaced
            .iter()
            .map(|d| d.source_name.trim().to_lowercase())
            .collect();

        VerificationResult {
            is_verified: false,
            confidence: 30,
            risk_level: RiskLevel::High,
            analysis: analysis
                .map(|a| a.context)
                .unwrap_or_else(|| "The claim could not be fully analyzed in time.".to_string()),
            fact_check_summary: format!(
                "Verification of \"{}\" hit its time limit before completing. \
                 The partial evidence gathered so far is included, but no verdict was reached.",
                claim.as_str()
            ),
            evidence: surfaced,
            search_queries: queries,
            evidence_sources: sources.len() as u32,
        }
    }
}

#[async_trait]
impl ClaimVerifier for PipelineEngine {
    async fn verify(
        &self,
        claim: &Claim,
        context: &VerificationContext,
        emitter: &dyn ProgressEmitter,
    ) -> Result<VerificationResult, VerifyError> {
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            warn!(
                request_id = %context.request_id,
                "Rejected verify call: a run is already active"
            );
            return Err(VerifyError::AlreadyRunning);
        }
        let _guard = RunGuard(&self.running);

        info!(request_id = %context.request_id, "Verification run started");
        let partial = Mutex::new(PartialRun::default());

        let result = match timeout(
            self.deadline,
            self.run_pipeline(claim, emitter, &partial),
        )
        .await
        {
            Ok(Ok(result)) => {
                self.transition(PipelineState::Completed);
                info!(request_id = %context.request_id, "Verification run completed");
                result
            }
            Ok(Err(e)) => {
                error!(request_id = %context.request_id, "Synthesis failed: {}", e);
                self.transition(PipelineState::Failed);
                let queries = partial
                    .lock()
                    .map(|p| p.queries.clone())
                    .unwrap_or_default();
                synthesizer::degraded_result(claim, queries)
            }
            Err(_) => {
                warn!(
                    request_id = %context.request_id,
                    "Deadline of {:?} exceeded - returning best-effort result",
                    self.deadline
                );
                self.transition(PipelineState::TimedOut);
                self.timeout_result(claim, &partial)
            }
        };

        Ok(result)
    }
}

/// Short-circuit response for casual queries: a valid result that clearly
/// says nothing was verified.
fn casual_result(claim: &Claim) -> VerificationResult {
    VerificationResult {
        is_verified: false,
        confidence: 0,
        risk_level: RiskLevel::Low,
        analysis: "Casual conversation - no factual claim detected.".to_string(),
        fact_check_summary: format!(
            "\"{}\" reads as conversation rather than a factual claim, so no verification was run.",
            claim.as_str()
        ),
        evidence: Vec::new(),
        search_queries: Vec::new(),
        evidence_sources: 0,
    }
}

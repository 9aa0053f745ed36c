//! Evidence acquisition.
//!
//! Derives a small set of complementary queries, fans them out concurrently
//! against the search collaborator with per-branch failure isolation, persists
//! what came back into the similarity store, and retrieves nearest neighbors
//! for the claim text. A failed branch contributes an empty set, never an
//! abort.

use crate::search::{SearchHit, WebSearch};
use crate::store::{SimilarityStore, StoredDocument};
use futures::future::join_all;
use std::sync::Arc;
use tracing::{debug, warn};
use verax_common::{Claim, ClaimAnalysis, EvidenceDocument};

/// Queries derived per run.
const MAX_QUERIES: usize = 3;

/// Raw candidates plus the queries that produced them.
#[derive(Debug, Clone)]
pub struct ResearchOutput {
    pub candidates: Vec<EvidenceDocument>,
    pub queries: Vec<String>,
}

/// Gathers candidate evidence from search and the similarity store.
pub struct EvidenceResearcher {
    search: Arc<dyn WebSearch>,
    store: Arc<dyn SimilarityStore>,
    nearest_k: usize,
}

impl EvidenceResearcher {
    pub fn new(
        search: Arc<dyn WebSearch>,
        store: Arc<dyn SimilarityStore>,
        nearest_k: usize,
    ) -> Self {
        Self {
            search,
            store,
            nearest_k,
        }
    }

    pub async fn research(&self, claim: &Claim, analysis: &ClaimAnalysis) -> ResearchOutput {
        let queries = derive_queries(claim, analysis);

        // Fan out, settle all branches, discard rejections.
        let fetches = queries.iter().map(|query| {
            let search = Arc::clone(&self.search);
            let query = query.clone();
            async move {
                match search.search(&query).await {
                    Ok(hits) => hits,
                    Err(e) => {
                        warn!("Search query '{}' failed: {} - continuing without it", query, e);
                        Vec::new()
                    }
                }
            }
        });
        let fetched: Vec<EvidenceDocument> = join_all(fetches)
            .await
            .into_iter()
            .flatten()
            .map(hit_to_document)
            .collect();

        debug!("Search fan-out produced {} raw documents", fetched.len());

        // Persist the batch; storage failures never fail the run.
        if !fetched.is_empty() {
            let batch: Vec<StoredDocument> = fetched.iter().map(document_to_stored).collect();
            if let Err(e) = self.store.add_documents(batch).await {
                warn!("Evidence persistence failed: {} - continuing", e);
            }
        }

        // Nearest neighbors for the claim itself, independent of this run's
        // search results.
        let neighbors = match self.store.nearest(claim.as_str(), self.nearest_k).await {
            Ok(documents) => documents.iter().filter_map(stored_to_document).collect(),
            Err(e) => {
                warn!("Nearest-neighbor retrieval failed: {} - continuing", e);
                Vec::new()
            }
        };

        let mut candidates = fetched;
        candidates.extend(neighbors);

        ResearchOutput { candidates, queries }
    }
}

/// Derive up to three complementary queries: one narrow, one broad, one
/// explicitly fact-check flavored.
pub fn derive_queries(claim: &Claim, analysis: &ClaimAnalysis) -> Vec<String> {
    let mut queries = Vec::with_capacity(MAX_QUERIES);

    // Narrow: the most specific sub-claim, falling back to the claim itself.
    let narrow = analysis
        .sub_claims
        .first()
        .map(String::as_str)
        .unwrap_or(claim.as_str())
        .trim()
        .to_string();
    if !narrow.is_empty() {
        queries.push(narrow);
    }

    // Broad: salient keywords plus context, for surrounding coverage.
    let broad = if analysis.keywords.is_empty() {
        claim.as_str().to_string()
    } else {
        analysis.keywords.join(" ")
    };
    let broad = broad.trim().to_string();
    if !broad.is_empty() && !queries.contains(&broad) {
        queries.push(broad);
    }

    // Fact-check flavored, on the claim text.
    let fact_check = format!("{} fact check", claim.as_str());
    if !queries.contains(&fact_check) {
        queries.push(fact_check);
    }

    queries.truncate(MAX_QUERIES);
    queries
}

fn hit_to_document(hit: SearchHit) -> EvidenceDocument {
    EvidenceDocument {
        title: hit.title,
        snippet: hit.snippet,
        source_name: hit.source,
        url: Some(hit.link),
        published_at: hit.date,
    }
}

fn document_to_stored(doc: &EvidenceDocument) -> StoredDocument {
    StoredDocument {
        content: format!("{}\n{}", doc.title, doc.snippet),
        metadata: serde_json::json!({
            "title": doc.title,
            "source": doc.source_name,
            "url": doc.url,
            "published_at": doc.published_at,
        }),
    }
}

/// Map a stored neighbor back to an evidence document. Neighbors without the
/// expected metadata are dropped rather than surfaced half-formed.
fn stored_to_document(stored: &StoredDocument) -> Option<EvidenceDocument> {
    let title = stored.metadata.get("title")?.as_str()?.to_string();
    let source_name = stored
        .metadata
        .get("source")
        .and_then(|s| s.as_str())
        .unwrap_or("archive")
        .to_string();
    let snippet = stored
        .content
        .split_once('\n')
        .map(|(_, body)| body.to_string())
        .unwrap_or_else(|| stored.content.clone());

    Some(EvidenceDocument {
        title,
        snippet,
        source_name,
        url: stored
            .metadata
            .get("url")
            .and_then(|u| u.as_str())
            .map(String::from),
        published_at: stored
            .metadata
            .get("published_at")
            .and_then(|d| d.as_str())
            .map(String::from),
    })
}

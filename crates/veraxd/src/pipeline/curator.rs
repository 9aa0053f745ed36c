//! Evidence curation.
//!
//! Turns the noisy, duplicate-laden candidate list from the researcher into a
//! small, ranked, deduplicated evidence set. Scoring is deterministic:
//! keyword coverage and publication recency, nothing else.

use chrono::{DateTime, NaiveDate, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use tracing::debug;
use verax_common::{EvidenceDocument, ScoredEvidence};

/// Canonical scoring weights, applied uniformly.
pub const KEYWORD_WEIGHT: f64 = 0.7;
pub const RECENCY_WEIGHT: f64 = 0.3;

/// Documents scoring below this are discarded.
pub const MIN_COMBINED_SCORE: f64 = 0.2;

/// Final evidence cap. Matches the adjudicator's snippet window so the
/// adjudicated set and the surfaced set coincide.
pub const MAX_EVIDENCE_ITEMS: usize = 6;

/// Recency weight when the date is absent or unparseable.
const UNKNOWN_RECENCY: f64 = 0.3;

/// Coverage when the claim yields no qualifying tokens.
const DEFAULT_COVERAGE: f64 = 0.4;

/// Minimum token length considered salient.
const MIN_TOKEN_LEN: usize = 4;

/// Cap on distinct claim tokens used for coverage.
const MAX_CLAIM_TOKENS: usize = 25;

static TOKEN_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[a-z0-9]+").expect("token regex"));

/// Deduplicates and scores candidate evidence documents.
pub struct EvidenceCurator;

impl EvidenceCurator {
    pub fn new() -> Self {
        Self
    }

    /// Curate candidates against the claim, scoring ages relative to now.
    pub fn curate(&self, claim: &str, candidates: Vec<EvidenceDocument>) -> Vec<ScoredEvidence> {
        self.curate_at(claim, candidates, Utc::now())
    }

    /// Deterministic entry point: ages are computed against `now`.
    pub fn curate_at(
        &self,
        claim: &str,
        candidates: Vec<EvidenceDocument>,
        now: DateTime<Utc>,
    ) -> Vec<ScoredEvidence> {
        let total = candidates.len();
        let tokens = claim_tokens(claim);

        // First dedup pass at raw-document granularity, before any scoring work.
        let mut seen = HashSet::new();
        let unique: Vec<EvidenceDocument> = candidates
            .into_iter()
            .filter(|doc| seen.insert(dedup_key(doc)))
            .collect();

        let mut scored: Vec<ScoredEvidence> = unique
            .into_iter()
            .map(|doc| {
                let keyword_score = keyword_coverage(&tokens, &doc);
                let recency_weight = recency_weight(doc.published_at.as_deref(), now);
                let combined_score =
                    keyword_score * KEYWORD_WEIGHT + recency_weight * RECENCY_WEIGHT;
                ScoredEvidence {
                    document: doc,
                    keyword_score,
                    recency_weight,
                    combined_score,
                }
            })
            .filter(|item| item.combined_score >= MIN_COMBINED_SCORE)
            .filter(|item| has_absolute_url(&item.document))
            .collect();

        scored.sort_by(|a, b| {
            b.combined_score
                .partial_cmp(&a.combined_score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(
                    b.recency_weight
                        .partial_cmp(&a.recency_weight)
                        .unwrap_or(std::cmp::Ordering::Equal),
                )
        });

        // Second dedup pass on the output shape, in case normalization of the
        // mapped documents produced new collisions. First seen wins.
        let mut seen = HashSet::new();
        scored.retain(|item| seen.insert(dedup_key(&item.document)));
        scored.truncate(MAX_EVIDENCE_ITEMS);

        debug!("Curated {} of {} candidates", scored.len(), total);
        scored
    }
}

impl Default for EvidenceCurator {
    fn default() -> Self {
        Self::new()
    }
}

/// Normalize a URL for identity comparison: lowercase, no scheme, no leading
/// `www.`, no query string or fragment, no trailing slash.
pub fn normalize_url(url: &str) -> String {
    let mut s = url.trim().to_lowercase();
    for prefix in ["https://", "http://"] {
        if let Some(rest) = s.strip_prefix(prefix) {
            s = rest.to_string();
            break;
        }
    }
    if let Some(rest) = s.strip_prefix("www.") {
        s = rest.to_string();
    }
    if let Some(cut) = s.find(['?', '#']) {
        s.truncate(cut);
    }
    while s.ends_with('/') {
        s.pop();
    }
    s
}

/// Identity key for a document: normalized URL, or normalized
/// (title, source) when no usable URL exists.
pub fn dedup_key(doc: &EvidenceDocument) -> String {
    match doc.url.as_deref().map(str::trim) {
        Some(url) if !url.is_empty() => normalize_url(url),
        _ => {
            let title = doc.title.to_lowercase();
            let title = title.split_whitespace().collect::<Vec<_>>().join(" ");
            let source = doc.source_name.to_lowercase();
            let source = source.split_whitespace().collect::<Vec<_>>().join(" ");
            format!("{}|{}", title, source)
        }
    }
}

/// Step-function recency weight from publication age in days.
pub fn recency_weight(published_at: Option<&str>, now: DateTime<Utc>) -> f64 {
    let Some(date) = published_at.and_then(parse_date) else {
        return UNKNOWN_RECENCY;
    };
    let age_days = (now - date).num_days().max(0);
    match age_days {
        0..=1 => 1.0,
        2..=3 => 0.9,
        4..=7 => 0.75,
        8..=14 => 0.6,
        15..=30 => 0.45,
        _ => 0.25,
    }
}

/// Parse the formats search collaborators actually emit.
fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
    }
    // Date with a time tail but no zone, e.g. "2025-01-02 15:04:05".
    if raw.len() >= 10 {
        if let Ok(date) = NaiveDate::parse_from_str(&raw[..10], "%Y-%m-%d") {
            return date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
        }
    }
    None
}

/// Salient claim tokens: lowercased alphanumeric runs of length >= 4, first
/// occurrence order, capped.
pub fn claim_tokens(claim: &str) -> Vec<String> {
    let lower = claim.to_lowercase();
    let mut seen = HashSet::new();
    let mut tokens = Vec::new();
    for token in TOKEN_RUNS.find_iter(&lower) {
        let token = token.as_str();
        if token.len() >= MIN_TOKEN_LEN && seen.insert(token.to_string()) {
            tokens.push(token.to_string());
            if tokens.len() == MAX_CLAIM_TOKENS {
                break;
            }
        }
    }
    tokens
}

/// Fraction of claim tokens found as case-insensitive substrings in the
/// document's title and snippet.
pub fn keyword_coverage(tokens: &[String], doc: &EvidenceDocument) -> f64 {
    if tokens.is_empty() {
        return DEFAULT_COVERAGE;
    }
    let haystack = format!("{} {}", doc.title, doc.snippet).to_lowercase();
    let found = tokens.iter().filter(|t| haystack.contains(t.as_str())).count();
    found as f64 / tokens.len() as f64
}

fn has_absolute_url(doc: &EvidenceDocument) -> bool {
    doc.url
        .as_deref()
        .map(|u| u.starts_with("http://") || u.starts_with("https://"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn doc(title: &str, snippet: &str, url: Option<&str>, date: Option<&str>) -> EvidenceDocument {
        EvidenceDocument {
            title: title.to_string(),
            snippet: snippet.to_string(),
            source_name: "reuters".to_string(),
            url: url.map(String::from),
            published_at: date.map(String::from),
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 10, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_normalize_url_strips_scheme_www_query_fragment() {
        assert_eq!(
            normalize_url("https://www.Example.com/News/Item/?utm=x#top"),
            "example.com/news/item"
        );
        assert_eq!(normalize_url("http://example.com"), "example.com");
        assert_eq!(normalize_url("  https://example.com/a/  "), "example.com/a");
    }

    #[test]
    fn test_trailing_slash_and_query_collide() {
        let a = doc("A", "s", Some("https://example.com/story/"), None);
        let b = doc("B", "s", Some("https://example.com/story?ref=rss"), None);
        assert_eq!(dedup_key(&a), dedup_key(&b));

        let curated =
            EvidenceCurator::new().curate_at("flood warning issued today", vec![a, b], now());
        assert_eq!(curated.len(), 1);
        assert_eq!(curated[0].document.title, "A"); // first seen wins
    }

    #[test]
    fn test_linkless_dedup_by_title_and_source() {
        let a = doc("Major  Flood Warning", "s", None, None);
        let mut b = doc("major flood warning", "s", None, None);
        b.source_name = "Reuters".to_string();
        assert_eq!(dedup_key(&a), dedup_key(&b));
    }

    #[test]
    fn test_recency_weight_step_function() {
        let n = now();
        assert_eq!(recency_weight(Some("2025-01-10"), n), 1.0);
        assert_eq!(recency_weight(Some("2025-01-09"), n), 1.0);
        assert_eq!(recency_weight(Some("2025-01-08"), n), 0.9);
        assert_eq!(recency_weight(Some("2025-01-05"), n), 0.75);
        assert_eq!(recency_weight(Some("2024-12-30"), n), 0.6);
        assert_eq!(recency_weight(Some("2024-12-15"), n), 0.45);
        assert_eq!(recency_weight(Some("2024-06-01"), n), 0.25);
    }

    #[test]
    fn test_recency_weight_unparseable_defaults() {
        assert_eq!(recency_weight(None, now()), UNKNOWN_RECENCY);
        assert_eq!(recency_weight(Some("last tuesday"), now()), UNKNOWN_RECENCY);
        assert_eq!(recency_weight(Some(""), now()), UNKNOWN_RECENCY);
    }

    #[test]
    fn test_recency_weight_non_increasing() {
        let n = now();
        let dates = [
            "2025-01-10",
            "2025-01-08",
            "2025-01-04",
            "2024-12-29",
            "2024-12-12",
            "2024-01-01",
        ];
        let weights: Vec<f64> = dates.iter().map(|d| recency_weight(Some(d), n)).collect();
        for pair in weights.windows(2) {
            assert!(pair[0] >= pair[1]);
        }
    }

    #[test]
    fn test_recency_weight_rfc3339_and_time_tail() {
        let n = now();
        assert_eq!(recency_weight(Some("2025-01-09T08:00:00Z"), n), 1.0);
        assert_eq!(recency_weight(Some("2025-01-08 15:04:05"), n), 0.9);
    }

    #[test]
    fn test_claim_tokens_length_and_cap() {
        let tokens = claim_tokens("The cat sat on a mat in Birmingham on 2025-01-01");
        assert!(tokens.contains(&"birmingham".to_string()));
        assert!(tokens.contains(&"2025".to_string()));
        assert!(!tokens.contains(&"cat".to_string())); // too short
        assert!(!tokens.contains(&"the".to_string()));

        let many: String = (0..40).map(|i| format!("word{:04} ", i)).collect();
        assert_eq!(claim_tokens(&many).len(), MAX_CLAIM_TOKENS);
    }

    #[test]
    fn test_keyword_coverage_fraction() {
        let tokens = claim_tokens("volcanic eruption iceland village evacuated");
        let full = doc(
            "Volcanic eruption in Iceland",
            "A village was evacuated after the volcanic eruption",
            Some("https://x.example"),
            None,
        );
        let none = doc("Stock markets rally", "Shares rose", Some("https://y.example"), None);
        assert!(keyword_coverage(&tokens, &full) > 0.9);
        assert_eq!(keyword_coverage(&tokens, &none), 0.0);
    }

    #[test]
    fn test_keyword_coverage_default_when_no_tokens() {
        let tokens = claim_tokens("it is so");
        assert!(tokens.is_empty());
        let d = doc("Anything", "at all", Some("https://x.example"), None);
        assert_eq!(keyword_coverage(&tokens, &d), DEFAULT_COVERAGE);
    }

    #[test]
    fn test_newer_duplicate_content_outranks_older() {
        let newer = doc(
            "Flood warning issued",
            "flood warning issued for the coast",
            Some("https://a.example/new"),
            Some("2025-01-09"),
        );
        let older = doc(
            "Flood warning issued",
            "flood warning issued for the coast",
            Some("https://b.example/old"),
            Some("2024-06-01"),
        );
        let curated = EvidenceCurator::new().curate_at(
            "flood warning issued coast",
            vec![older, newer.clone()],
            now(),
        );
        assert_eq!(curated[0].document, newer);
        assert!(curated[0].combined_score > curated[1].combined_score);
    }

    #[test]
    fn test_low_scores_discarded() {
        // No keyword overlap and ancient date: 0.0 * 0.7 + 0.25 * 0.3 = 0.075.
        let junk = doc("Unrelated", "nothing here", Some("https://z.example"), Some("2020-01-01"));
        let curated =
            EvidenceCurator::new().curate_at("volcanic eruption iceland", vec![junk], now());
        assert!(curated.is_empty());
    }

    #[test]
    fn test_relative_and_missing_urls_filtered() {
        let relative = doc(
            "Volcanic eruption iceland",
            "volcanic eruption iceland coverage",
            Some("/news/item"),
            Some("2025-01-09"),
        );
        let linkless = doc(
            "Volcanic eruption iceland report",
            "volcanic eruption iceland coverage",
            None,
            Some("2025-01-09"),
        );
        let curated = EvidenceCurator::new().curate_at(
            "volcanic eruption iceland",
            vec![relative, linkless],
            now(),
        );
        assert!(curated.is_empty());
    }

    #[test]
    fn test_output_capped() {
        let docs: Vec<_> = (0..12)
            .map(|i| {
                doc(
                    "Volcanic eruption iceland",
                    "volcanic eruption iceland update",
                    Some(&format!("https://site{}.example/a", i)),
                    Some("2025-01-09"),
                )
            })
            .collect();
        let curated =
            EvidenceCurator::new().curate_at("volcanic eruption iceland", docs, now());
        assert_eq!(curated.len(), MAX_EVIDENCE_ITEMS);
    }

    #[test]
    fn test_curation_idempotent_on_own_output() {
        let docs = vec![
            doc(
                "Volcanic eruption iceland",
                "volcanic eruption iceland update",
                Some("https://a.example/one"),
                Some("2025-01-09"),
            ),
            doc(
                "Iceland eruption continues",
                "the eruption in iceland continues",
                Some("https://b.example/two"),
                Some("2025-01-04"),
            ),
            doc(
                "Eruption archive",
                "volcanic eruption iceland archive",
                Some("https://c.example/three"),
                Some("2024-11-01"),
            ),
        ];
        let curator = EvidenceCurator::new();
        let first = curator.curate_at("volcanic eruption iceland", docs, now());
        let docs_again: Vec<_> = first.iter().map(|s| s.document.clone()).collect();
        let second = curator.curate_at("volcanic eruption iceland", docs_again, now());
        assert_eq!(first, second);
    }
}

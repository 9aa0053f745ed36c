//! JSON recovery for language-model output.
//!
//! Models asked for strict JSON still return prose, code fences, or trailing
//! commentary. Recovery is a fixed three-tier chain, tried in order:
//!
//! 1. direct parse of the whole response
//! 2. parse of the first fenced code block
//! 3. balanced-brace scan from the first `{` to the last `}`, with trailing
//!    commas stripped
//!
//! Every stage that consumes structured model output goes through
//! [`extract_json`]; no stage parses model text on its own.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

static FENCED_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)```(?:json)?\s*\n?(.*?)```").expect("fenced block regex")
});

static TRAILING_COMMA: Lazy<Regex> =
    Lazy::new(|| Regex::new(r",\s*([}\]])").expect("trailing comma regex"));

/// Recover a JSON value from free-form model output.
///
/// Returns `None` only when all three tiers fail; callers then fall back to
/// their stage-specific heuristic.
pub fn extract_json(text: &str) -> Option<Value> {
    direct_parse(text)
        .or_else(|| fenced_block_parse(text))
        .or_else(|| brace_scan_parse(text))
}

/// Tier 1: the whole response is already valid JSON.
fn direct_parse(text: &str) -> Option<Value> {
    serde_json::from_str(text.trim()).ok()
}

/// Tier 2: the first fenced code block contains the JSON.
fn fenced_block_parse(text: &str) -> Option<Value> {
    let captures = FENCED_BLOCK.captures(text)?;
    serde_json::from_str(captures.get(1)?.as_str().trim()).ok()
}

/// Tier 3: scan for the outermost braces and repair trailing commas.
fn brace_scan_parse(text: &str) -> Option<Value> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end <= start {
        return None;
    }
    let candidate = &text[start..=end];
    let repaired = TRAILING_COMMA.replace_all(candidate, "$1");
    serde_json::from_str(&repaired).ok()
}

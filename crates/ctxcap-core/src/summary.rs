//! Extract the context usage summary from sanitized `/context` output.

use once_cell::sync::Lazy;
use regex::Regex;

/// `<model> · <used>/<limit> tokens (<percent>)`
static CONTEXT_USAGE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?P<model>[^\s·]+.*?)\s*·\s*(?P<usage>[\d.,]+[kM]?/\d+(?:\.\d+)?[kM]?\s+tokens\s+\([\d.,]+%?\))",
    )
    .expect("Invalid CONTEXT_USAGE_RE regex")
});

/// The summary line found in `/context` output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextSummary {
    /// Full trimmed line (e.g. "claude-sonnet-4-5-20250929 · 66k/200k tokens (33%)")
    pub line: String,
    /// Text before the `·` separator
    pub model: String,
    /// Usage portion (e.g. "66k/200k tokens (33%)")
    pub usage: Option<String>,
}

impl ContextSummary {
    /// Find the first summary line in sanitized text
    pub fn find(clean_text: &str) -> Option<Self> {
        let line = extract_context_summary(clean_text)?;
        let caps = CONTEXT_USAGE_RE.captures(&line)?;
        let model = caps
            .name("model")
            .map(|m| m.as_str().trim().to_string())
            .unwrap_or_default();
        let usage = caps.name("usage").map(|m| m.as_str().to_string());

        Some(Self { line, model, usage })
    }
}

/// Return the first non-blank line carrying a token usage summary, trimmed.
///
/// Expected format:
/// ```text
///  ⛁ ⛀ ⛁ ⛁   claude-sonnet-4-5-20250929 · 66k/200k tokens (33%)
/// ```
pub fn extract_context_summary(clean_text: &str) -> Option<String> {
    clean_text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .find(|line| CONTEXT_USAGE_RE.is_match(line))
        .map(str::to_string)
}

/// Extract just the "66k/200k tokens (33%)" portion from a summary line
pub fn extract_usage_only(summary_line: Option<&str>) -> Option<String> {
    let line = summary_line.filter(|l| !l.is_empty())?;
    CONTEXT_USAGE_RE
        .captures(line)
        .and_then(|caps| caps.name("usage"))
        .map(|m| m.as_str().to_string())
}

use std::sync::OnceLock;

use regex::Regex;

fn fenced_block_regex() -> &'static Regex {
    static CACHED: OnceLock<Regex> = OnceLock::new();
    CACHED.get_or_init(|| {
        Regex::new(r"```(?:python|py)?\r?\n([\s\S]*?)```").expect("fence regex must compile")
    })
}

/// Returns the trimmed body of the first fenced code block in `text`, or
/// `text` verbatim when no block is present.
///
/// Only untagged, `python` and `py` fences are recognized.
#[must_use]
pub fn extract_code_block(text: &str) -> String {
    fenced_block_regex()
        .captures(text)
        .and_then(|captures| captures.get(1))
        .map(|body| body.as_str().trim().to_string())
        .unwrap_or_else(|| text.to_string())
}

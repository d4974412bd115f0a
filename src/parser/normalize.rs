use regex::Regex;
use unicode_normalization::UnicodeNormalization;

/// Aggregate functions whose call spacing is canonicalized before clause
/// extraction. `count_distinct` tolerates either separator since the two
/// dataset tokenization levels disagree on it.
pub const AGGREGATE_FUNCTIONS: &[&str] = &["count_distinct", "count", "sum", "avg", "min", "max"];

/// Canonicalize raw SQL text for comparison.
///
/// Applies, in order: Unicode canonical composition (NFC), lowercasing,
/// whitespace collapsing, trailing-semicolon removal, and aggregate-call
/// spacing collapse (`COUNT ( x )` becomes `count(x)`).
///
/// Idempotent. Empty or whitespace-only input yields an empty string.
pub fn normalize(text: &str) -> String {
    if text.trim().is_empty() {
        return String::new();
    }
    let composed: String = text.nfc().collect();
    let collapsed = collapse_whitespace(&composed.to_lowercase());
    let trimmed = collapsed.trim_end_matches(';').trim_end();
    collapse_call_spacing(trimmed)
}

/// Comparison form for a single component token: `normalize` plus
/// underscore/space unification. Spaces are the canonical separator, so
/// `ten_hoc_sinh` and `ten hoc sinh` collapse to the same token.
pub fn canonical_token(token: &str) -> String {
    collapse_whitespace(&normalize(token).replace('_', " "))
}

/// If `expr` is a single aggregate call, return the expression inside the
/// parentheses (`sum(t.tuoi)` yields `t.tuoi`).
pub fn aggregate_inner(expr: &str) -> Option<String> {
    let call = Regex::new(&format!(
        r"(?i)^\s*(?:{})\s*\(\s*(.*?)\s*\)\s*$",
        aggregate_alternation()
    ))
    .unwrap();
    call.captures(expr).map(|caps| caps[1].to_string())
}

/// True when the text contains an aggregate function call.
pub fn contains_aggregate(text: &str) -> bool {
    Regex::new(&format!(r"(?i)\b(?:{})\s*\(", aggregate_alternation()))
        .unwrap()
        .is_match(text)
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn collapse_call_spacing(text: &str) -> String {
    let call = Regex::new(&format!(
        r"(?i)\b({})\s*\(\s*([^()]*?)\s*\)",
        aggregate_alternation()
    ))
    .unwrap();
    call.replace_all(text, |caps: &regex::Captures| {
        format!("{}({})", caps[1].replace(' ', "_"), &caps[2])
    })
    .into_owned()
}

fn aggregate_alternation() -> String {
    AGGREGATE_FUNCTIONS
        .iter()
        .map(|name| name.replace('_', "[ _]"))
        .collect::<Vec<_>>()
        .join("|")
}

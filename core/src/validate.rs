use serde_json::Value;

use crate::findings::Finding;
use crate::findings::REQUIRED_KEYS;
use crate::findings::SNIPPET_CHAR_CAP;

const STRING_KEYS: [&str; 7] = [
    "path",
    "cwe_guess",
    "severity",
    "snippet",
    "evidence",
    "reasoning",
    "fix",
];

/// Strict shape check for one candidate object.
///
/// Accept iff the value is an object carrying every required key with the
/// right primitive type. No coercion: `"confidence": "0.9"` is wrong, and
/// every element of `lines` must be a JSON integer (not a bool, not a
/// float). Anything else is discarded silently; the repair pass is the
/// recovery path for malformed output, not field fixing.
pub fn is_valid_finding(candidate: &Value) -> bool {
    let Some(map) = candidate.as_object() else {
        return false;
    };
    if REQUIRED_KEYS.iter().any(|key| !map.contains_key(*key)) {
        return false;
    }
    if STRING_KEYS
        .iter()
        .any(|key| !map.get(*key).is_some_and(Value::is_string))
    {
        return false;
    }
    if !map.get("confidence").is_some_and(Value::is_number) {
        return false;
    }
    match map.get("lines").and_then(Value::as_array) {
        Some(lines) if !lines.is_empty() => lines
            .iter()
            .all(|line| line.is_i64() || line.is_u64()),
        _ => false,
    }
}

/// How many entries of a candidate array would survive validation. Used
/// by the extractor to rank competing bracket spans.
pub fn valid_object_count(items: &[Value]) -> usize {
    items.iter().filter(|item| is_valid_finding(item)).count()
}

/// Promote a candidate into a typed record, capping oversized snippets.
/// Returns `None` for anything [`is_valid_finding`] rejects.
pub fn promote(candidate: Value) -> Option<Finding> {
    if !is_valid_finding(&candidate) {
        return None;
    }
    let mut finding: Finding = serde_json::from_value(candidate).ok()?;
    if finding.snippet.chars().count() > SNIPPET_CHAR_CAP {
        let mut cut: String = finding.snippet.chars().take(SNIPPET_CHAR_CAP).collect();
        cut.push('…');
        finding.snippet = cut;
    }
    Some(finding)
}

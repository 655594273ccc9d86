use serde_json::Value;

use crate::validate::valid_object_count;

/// How a findings array was located inside the raw model text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// The whole text parsed as the array (or as an object with a
    /// `findings` array).
    Direct,
    /// The text was a gateway envelope; the array came from the inner
    /// message string.
    Envelope,
    /// The array came from the last parseable fenced code block.
    Fenced,
    /// The array came from a balanced-bracket span.
    BracketScan,
}

/// One extraction pass over one text blob. `strategy` is `None` when
/// nothing plausible was found; `candidates` is then empty.
#[derive(Debug, Clone)]
pub struct ExtractionAttempt {
    pub strategy: Option<Strategy>,
    pub candidates: Vec<Value>,
}

impl ExtractionAttempt {
    fn none() -> Self {
        Self {
            strategy: None,
            candidates: Vec::new(),
        }
    }
}

/// Best-effort recovery of a findings array from untrusted model text.
///
/// Strategies are tried in order and the first success wins. This is a
/// salvage path, not a parser: any input (empty, prose, truncated JSON,
/// unbalanced brackets) yields an attempt, never an error.
pub fn extract(text: &str) -> ExtractionAttempt {
    if let Some(candidates) = parse_array(text) {
        return ExtractionAttempt {
            strategy: Some(Strategy::Direct),
            candidates,
        };
    }

    // Gateway envelopes bury the model text one level down; the remaining
    // strategies then apply to the inner string.
    if let Some(inner) = unwrap_envelope(text) {
        if let Some(candidates) = parse_array(&inner)
            .or_else(|| fenced_block_array(&inner))
            .or_else(|| bracket_scan_array(&inner))
        {
            return ExtractionAttempt {
                strategy: Some(Strategy::Envelope),
                candidates,
            };
        }
    }

    if let Some(candidates) = fenced_block_array(text) {
        return ExtractionAttempt {
            strategy: Some(Strategy::Fenced),
            candidates,
        };
    }
    if let Some(candidates) = bracket_scan_array(text) {
        return ExtractionAttempt {
            strategy: Some(Strategy::BracketScan),
            candidates,
        };
    }
    ExtractionAttempt::none()
}

/// A bare JSON array, or an object carrying a `findings` array.
fn parse_array(text: &str) -> Option<Vec<Value>> {
    let value: Value = serde_json::from_str(text.trim()).ok()?;
    array_of(value)
}

fn array_of(value: Value) -> Option<Vec<Value>> {
    match value {
        Value::Array(items) => Some(items),
        Value::Object(mut map) => match map.remove("findings") {
            Some(Value::Array(items)) => Some(items),
            _ => None,
        },
        _ => None,
    }
}

const ENVELOPE_KEYS: [&str; 4] = ["output", "response", "content", "text"];

/// Envelopes observed from chat gateways: `{"message":{"content":"…"}}`
/// plus a handful of single-key string wrappers.
fn unwrap_envelope(text: &str) -> Option<String> {
    let value: Value = serde_json::from_str(text.trim()).ok()?;
    let map = value.as_object()?;
    if let Some(content) = map
        .get("message")
        .and_then(|message| message.get("content"))
        .and_then(Value::as_str)
    {
        return Some(content.to_string());
    }
    for key in ENVELOPE_KEYS {
        if let Some(inner) = map.get(key).and_then(Value::as_str) {
            return Some(inner.to_string());
        }
    }
    None
}

/// The last parseable fenced code block (tagged `json` or untagged).
/// Models that narrate usually put the corrected answer in the final
/// fence.
fn fenced_block_array(text: &str) -> Option<Vec<Value>> {
    let mut last = None;
    let mut rest = text;
    while let Some(open) = rest.find("```") {
        let after_open = &rest[open + 3..];
        // The info string runs to the end of the line.
        let Some(newline) = after_open.find('\n') else {
            break;
        };
        let body = &after_open[newline + 1..];
        let Some(close) = body.find("```") else {
            break;
        };
        if let Some(candidates) = parse_array(&body[..close]) {
            last = Some(candidates);
        }
        rest = &body[close + 3..];
    }
    last
}

/// Balanced-bracket scan: every span where `[`/`]` depth returns to zero
/// is a candidate array. Depth counting only — spans that cross string
/// literals simply fail to parse and drop out.
///
/// Span choice: the span with the most schema-valid objects wins, later
/// spans breaking ties (models put the corrected answer last). With no
/// valid objects anywhere, the latest non-empty all-object span wins,
/// then the latest parseable span — callers must tolerate an empty
/// result.
fn bracket_scan_array(text: &str) -> Option<Vec<Value>> {
    let mut spans: Vec<&str> = Vec::new();
    let mut depth = 0usize;
    let mut start = None;
    for (index, ch) in text.char_indices() {
        match ch {
            '[' => {
                if depth == 0 {
                    start = Some(index);
                }
                depth += 1;
            }
            ']' => {
                if depth > 0 {
                    depth -= 1;
                    if depth == 0
                        && let Some(begin) = start.take()
                    {
                        spans.push(&text[begin..=index]);
                    }
                }
            }
            _ => {}
        }
    }

    let parsed: Vec<Vec<Value>> = spans
        .into_iter()
        .filter_map(|span| match serde_json::from_str(span) {
            Ok(Value::Array(items)) => Some(items),
            _ => None,
        })
        .collect();
    if parsed.is_empty() {
        return None;
    }

    let scores: Vec<usize> = parsed.iter().map(|items| valid_object_count(items)).collect();
    let best = *scores.iter().max().unwrap_or(&0);
    if best > 0 {
        let winner = scores.iter().rposition(|score| *score == best)?;
        return parsed.into_iter().nth(winner);
    }

    if let Some(winner) = parsed
        .iter()
        .rposition(|items| !items.is_empty() && items.iter().all(Value::is_object))
    {
        return parsed.into_iter().nth(winner);
    }
    parsed.into_iter().next_back()
}

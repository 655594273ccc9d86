use std::fmt::Write as _;

use serde_json::json;

use crate::client::ChatMessage;

/// Shape contract sent with every request. The gateway runs the model in
/// JSON mode, but the body still comes back as untrusted text.
const SYSTEM_INSTRUCTIONS: &str = "You are a security code auditor. \
Analyze the provided source listing and report vulnerabilities as a JSON array. \
Each element must be an object with exactly these fields: \
\"path\" (string), \"cwe_guess\" (string, e.g. \"CWE-79\"), \
\"severity\" (one of \"Low\", \"Medium\", \"High\", \"Critical\"), \
\"confidence\" (number between 0.0 and 1.0), \
\"lines\" (array of 1-based integer line numbers: one value or a start/end pair), \
\"snippet\", \"evidence\", \"reasoning\", \"fix\" (strings). \
Line numbers refer to the `N:` prefixes in the listing. \
Reply with [] if the file has no vulnerabilities. \
Output only the JSON array, with no prose and no code fences.";

/// Characters of the model's prior output quoted back in a repair
/// request. Enough for the model to recognize its own answer; rambling
/// replies get cut rather than doubling the payload.
const REPAIR_PRIOR_CHAR_CAP: usize = 4000;

/// Messages for a regular scan attempt over an already numbered,
/// already capped source listing.
pub(crate) fn scan_messages(file_id: &str, numbered_content: &str) -> Vec<ChatMessage> {
    let metadata = json!({
        "task": "vulnerability_scan",
        "file": file_id,
    });
    vec![
        ChatMessage::system(SYSTEM_INSTRUCTIONS),
        ChatMessage::user(metadata.to_string()),
        ChatMessage::user(numbered_content),
    ]
}

/// Messages for the single repair pass: the model's own prior reply plus
/// the source listing again for grounding.
pub(crate) fn repair_messages(
    file_id: &str,
    numbered_content: &str,
    prior_output: &str,
) -> Vec<ChatMessage> {
    let instruction = format!(
        "Your previous reply for {file_id} could not be parsed into the required \
JSON array of finding objects. Convert the reply below into that array, using the \
source listing for grounding. Drop anything that is not a finding. \
Output only the JSON array.\n\nPrevious reply:\n{}",
        truncate_chars(prior_output, REPAIR_PRIOR_CHAR_CAP)
    );
    vec![
        ChatMessage::system(SYSTEM_INSTRUCTIONS),
        ChatMessage::user(instruction),
        ChatMessage::user(numbered_content),
    ]
}

/// Cut `text` to at most `cap` bytes without splitting a UTF-8 sequence.
pub(crate) fn cap_bytes(text: &str, cap: usize) -> &str {
    if text.len() <= cap {
        return text;
    }
    let mut end = cap;
    while end > 0 && !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

/// Prefix each line with its 1-based number so the model can cite
/// locations. `first_line` keeps slice listings aligned with the real
/// file.
pub(crate) fn number_lines_from(text: &str, first_line: usize) -> String {
    let mut numbered = String::with_capacity(text.len() + text.len() / 8);
    for (offset, line) in text.lines().enumerate() {
        let _ = writeln!(numbered, "{}: {line}", first_line + offset);
    }
    numbered
}

pub(crate) fn truncate_chars(text: &str, cap: usize) -> String {
    if text.chars().count() <= cap {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(cap).collect();
    cut.push('…');
    cut
}

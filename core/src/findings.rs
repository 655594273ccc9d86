use std::fmt::Write as _;

use serde::Deserialize;
use serde::Serialize;
use sha1::Digest;
use sha1::Sha1;

/// Keys a candidate object must carry to qualify as a finding.
pub const REQUIRED_KEYS: [&str; 9] = [
    "path",
    "cwe_guess",
    "severity",
    "confidence",
    "lines",
    "snippet",
    "evidence",
    "reasoning",
    "fix",
];

/// Canonical severity labels the model is asked to use. Validation does
/// not enforce membership; producers emit subsets and variants.
pub const SEVERITY_LABELS: [&str; 4] = ["Low", "Medium", "High", "Critical"];

/// Longest snippet kept on a finding. Oversized snippets are cut on
/// promotion and marked with an ellipsis.
pub const SNIPPET_CHAR_CAP: usize = 1600;

/// One validated vulnerability report for one location in one file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub path: String,
    pub cwe_guess: String,
    pub severity: String,
    pub confidence: f64,
    /// 1-based line numbers; a single value or a start/end pair.
    pub lines: Vec<i64>,
    pub snippet: String,
    pub evidence: String,
    pub reasoning: String,
    pub fix: String,
}

impl Finding {
    /// Key aggregators use to collapse duplicates across workers:
    /// path, lines, CWE, and a digest of the snippet. Reasoning and fix
    /// text vary between model calls for the same defect, so they stay
    /// out of the key.
    pub fn dedupe_key(&self) -> String {
        let mut hasher = Sha1::new();
        hasher.update(self.snippet.as_bytes());
        let digest = hasher.finalize();
        let mut hex = String::with_capacity(digest.len() * 2);
        for byte in digest {
            let _ = write!(hex, "{byte:02x}");
        }
        format!(
            "{}|{:?}|{}|{}",
            self.path, self.lines, self.cwe_guess, hex
        )
    }
}

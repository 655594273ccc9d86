use std::path::Path;
use std::time::Duration;

use reqwest::StatusCode;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;
use tracing::warn;

use crate::client::ChatRequest;
use crate::client::GatewayClient;
use crate::client::is_retryable_status;
use crate::config::ScanConfig;
use crate::error::Error;
use crate::error::Result;
use crate::extract;
use crate::findings::Finding;
use crate::prompt;
use crate::shrink::AttemptSpec;
use crate::shrink::AttemptTier;
use crate::shrink::plan_attempts;
use crate::validate::promote;

/// Pause between ladder rungs after a transient upstream failure, so an
/// overloaded gateway gets a moment to drain.
const LADDER_PAUSE: Duration = Duration::from_millis(500);

/// Characters of an error body kept in failure annotations.
const FAILURE_BODY_CHAR_CAP: usize = 400;

/// The always-defined result of one file's pipeline run.
///
/// `findings` may be empty without `failure` being set: an upstream call
/// that succeeded but yielded nothing salvageable counts as zero
/// findings, not as an error. `failure` is reserved for terminal
/// conditions (ladder exhausted, non-transient status).
#[derive(Debug, Clone, Serialize)]
pub struct FileOutcome {
    pub path: String,
    pub findings: Vec<Finding>,
    /// Ladder position of the attempt that got an HTTP success, if any.
    /// A slice tier means the findings cover only that slice.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tier: Option<AttemptTier>,
    pub repair_attempted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
}

impl FileOutcome {
    fn empty(path: &str) -> Self {
        Self {
            path: path.to_string(),
            findings: Vec::new(),
            tier: None,
            repair_attempted: false,
            failure: None,
        }
    }
}

/// Sequences one file through the whole pipeline: request, salvage, one
/// repair pass, and the payload-shrink ladder on transient failures.
pub struct Driver {
    client: GatewayClient,
    config: ScanConfig,
}

impl Driver {
    pub fn new(config: ScanConfig) -> Result<Self> {
        let client = GatewayClient::new(&config)?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    pub fn client(&self) -> &GatewayClient {
        &self.client
    }

    /// Scan one file. The only hard error is an unreadable input — no
    /// amount of payload shrinking fixes that. Every other condition
    /// ends in a [`FileOutcome`].
    pub async fn scan_file(&self, path: &Path) -> Result<FileOutcome> {
        let content = std::fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.display().to_string(),
            source,
        })?;
        Ok(self.scan_content(&path.display().to_string(), &content).await)
    }

    /// Scan content already in memory. Exposed for embedding callers and
    /// exercised directly by the gateway tests.
    pub async fn scan_content(&self, file_id: &str, content: &str) -> FileOutcome {
        let lines: Vec<&str> = content.lines().collect();
        let plan = plan_attempts(&self.config, lines.len());
        let mut last_status: Option<StatusCode> = None;

        for spec in &plan {
            let listing = render_listing(&lines, spec);
            let request = ChatRequest::new(
                prompt::scan_messages(file_id, &listing),
                spec.max_output_tokens,
                self.config.temperature,
            );

            match self.client.chat(&request).await {
                Ok(reply) if reply.status.is_success() => {
                    return self.salvage(file_id, &listing, &reply.body, spec.tier).await;
                }
                Ok(reply) if is_retryable_status(reply.status) => {
                    warn!(
                        file = file_id,
                        status = %reply.status,
                        tier = ?spec.tier,
                        "transient gateway failure, descending the ladder"
                    );
                    last_status = Some(reply.status);
                    tokio::time::sleep(LADDER_PAUSE).await;
                }
                Ok(reply) => {
                    // Non-transient status: a smaller payload will not help.
                    let mut outcome = FileOutcome::empty(file_id);
                    outcome.failure = Some(format!(
                        "gateway returned {}: {}",
                        reply.status,
                        prompt::truncate_chars(&reply.body, FAILURE_BODY_CHAR_CAP)
                    ));
                    warn!(file = file_id, failure = ?outcome.failure, "giving up");
                    return outcome;
                }
                Err(err) => {
                    warn!(
                        file = file_id,
                        error = %err,
                        tier = ?spec.tier,
                        "transport failure, descending the ladder"
                    );
                    last_status = None;
                    tokio::time::sleep(LADDER_PAUSE).await;
                }
            }
        }

        let mut outcome = FileOutcome::empty(file_id);
        outcome.failure = Some(match last_status {
            Some(status) => format!("retry ladder exhausted, last status {status}"),
            None => "retry ladder exhausted after transport failures".to_string(),
        });
        warn!(file = file_id, failure = ?outcome.failure, "giving up");
        outcome
    }

    /// Extract and validate one successful reply, with at most one
    /// repair round-trip when nothing salvages.
    async fn salvage(
        &self,
        file_id: &str,
        listing: &str,
        body: &str,
        tier: AttemptTier,
    ) -> FileOutcome {
        let mut outcome = FileOutcome::empty(file_id);
        outcome.tier = Some(tier);

        let attempt = extract::extract(body);
        let nothing_extracted = attempt.candidates.is_empty();
        outcome.findings = promote_all(attempt.candidates, file_id);
        if !outcome.findings.is_empty() {
            debug!(
                file = file_id,
                strategy = ?attempt.strategy,
                count = outcome.findings.len(),
                "salvaged findings"
            );
            return outcome;
        }
        if attempt.strategy.is_some() && nothing_extracted {
            // The model answered with a well-formed empty array; that is
            // a real "no vulnerabilities" verdict, not garbage worth a
            // repair round-trip.
            debug!(file = file_id, "model reported no findings");
            return outcome;
        }

        debug!(file = file_id, "nothing salvaged, requesting a repair pass");
        outcome.repair_attempted = true;
        let request = ChatRequest::new(
            prompt::repair_messages(file_id, listing, body),
            self.config.max_output_tokens,
            self.config.temperature,
        );
        match self.client.chat(&request).await {
            Ok(reply) if reply.status.is_success() => {
                let attempt = extract::extract(&reply.body);
                outcome.findings = promote_all(attempt.candidates, file_id);
                debug!(
                    file = file_id,
                    strategy = ?attempt.strategy,
                    count = outcome.findings.len(),
                    "repair pass finished"
                );
            }
            Ok(reply) => {
                warn!(file = file_id, status = %reply.status, "repair pass refused");
            }
            Err(err) => {
                warn!(file = file_id, error = %err, "repair pass failed");
            }
        }
        outcome
    }
}

/// Inject the scanned file's identifier into candidates the model left
/// without a usable `path`, then promote survivors. A present non-string
/// path is a type error and stays for validation to reject.
fn promote_all(candidates: Vec<Value>, file_id: &str) -> Vec<Finding> {
    candidates
        .into_iter()
        .map(|mut candidate| {
            if let Value::Object(map) = &mut candidate {
                let needs_path = match map.get("path") {
                    None => true,
                    Some(Value::String(existing)) => existing.is_empty(),
                    Some(_) => false,
                };
                if needs_path {
                    map.insert("path".to_string(), Value::String(file_id.to_string()));
                }
            }
            candidate
        })
        .filter_map(promote)
        .collect()
}

fn render_listing(lines: &[&str], spec: &AttemptSpec) -> String {
    let (text, first_line) = match spec.lines {
        Some((start, end)) => (lines[start - 1..end].join("\n"), start),
        None => (lines.join("\n"), 1),
    };
    let capped = prompt::cap_bytes(&text, spec.byte_cap);
    prompt::number_lines_from(capped, first_line)
}

use std::path::PathBuf;

use tokio::sync::mpsc::UnboundedSender;
use tracing::error;
use vulnscout_core::Driver;
use vulnscout_core::FileOutcome;

/// Split `files` into `buckets` disjoint subsets, round-robin, so one
/// large directory does not land on a single worker.
pub(crate) fn partition(files: Vec<PathBuf>, buckets: usize) -> Vec<Vec<PathBuf>> {
    let buckets = buckets.max(1);
    let mut subsets = vec![Vec::new(); buckets];
    for (index, file) in files.into_iter().enumerate() {
        subsets[index % buckets].push(file);
    }
    subsets
}

/// One worker: its own driver bound to its own endpoint, a strictly
/// sequential walk over its subset. Unreadable inputs are recorded and
/// skipped; they never abort the rest of the subset.
pub(crate) async fn run_worker(
    driver: Driver,
    files: Vec<PathBuf>,
    results: UnboundedSender<FileOutcome>,
) {
    for file in files {
        let outcome = match driver.scan_file(&file).await {
            Ok(outcome) => outcome,
            Err(err) => {
                error!(file = %file.display(), error = %err, "skipping unreadable input");
                FileOutcome {
                    path: file.display().to_string(),
                    findings: Vec::new(),
                    tier: None,
                    repair_attempted: false,
                    failure: Some(err.to_string()),
                }
            }
        };
        if results.send(outcome).is_err() {
            // Collector hung up; nothing left to report to.
            return;
        }
    }
}

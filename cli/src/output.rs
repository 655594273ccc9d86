use std::collections::HashSet;
use std::fs::File;
use std::io::BufWriter;
use std::io::Write;
use std::path::Path;

use anyhow::Context;
use vulnscout_core::FileOutcome;
use vulnscout_core::Finding;

/// Streams validated findings as line-delimited JSON, suppressing
/// duplicates reported by overlapping scans. `-` targets stdout.
pub(crate) struct FindingsWriter {
    sink: Box<dyn Write + Send>,
    seen: HashSet<String>,
    written: usize,
    suppressed: usize,
}

impl FindingsWriter {
    pub(crate) fn create(path: &Path) -> anyhow::Result<Self> {
        let sink: Box<dyn Write + Send> = if path == Path::new("-") {
            Box::new(std::io::stdout())
        } else {
            let file = File::create(path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Box::new(BufWriter::new(file))
        };
        Ok(Self {
            sink,
            seen: HashSet::new(),
            written: 0,
            suppressed: 0,
        })
    }

    pub(crate) fn push(&mut self, finding: &Finding) -> anyhow::Result<()> {
        if !self.seen.insert(finding.dedupe_key()) {
            self.suppressed += 1;
            return Ok(());
        }
        serde_json::to_writer(&mut self.sink, finding)?;
        self.sink.write_all(b"\n")?;
        self.written += 1;
        Ok(())
    }

    /// Flush and report (written, suppressed).
    pub(crate) fn finish(mut self) -> anyhow::Result<(usize, usize)> {
        self.sink.flush()?;
        Ok((self.written, self.suppressed))
    }
}

/// One artifact per scanned input, named after the flattened path, so a
/// run's outcome (succeeded tier, repair use, failure reason) survives
/// for debugging.
pub(crate) fn write_artifact(dir: &Path, outcome: &FileOutcome) -> anyhow::Result<()> {
    let target = dir.join(format!("{}.json", flatten_path(&outcome.path)));
    let json = serde_json::to_string_pretty(outcome)?;
    std::fs::write(&target, json)
        .with_context(|| format!("failed to write {}", target.display()))
}

fn flatten_path(path: &str) -> String {
    path.chars()
        .map(|ch| match ch {
            '/' | '\\' | ':' => '_',
            ch => ch,
        })
        .collect()
}

use std::path::PathBuf;

use clap::Parser;

/// Scan source files for vulnerabilities with a local LLM gateway.
#[derive(Debug, Parser)]
#[command(name = "vulnscout", version, about)]
pub struct Cli {
    /// Files or directories to scan.
    #[arg(required = true, value_name = "PATH")]
    pub paths: Vec<PathBuf>,

    /// Gateway endpoint; repeat the flag to spread workers across
    /// several instances.
    #[arg(long = "endpoint", value_name = "URL")]
    pub endpoints: Vec<String>,

    /// Parallel workers, each scanning its own file subset.
    #[arg(long, default_value_t = 1)]
    pub workers: usize,

    /// Findings output, one JSON object per line. `-` writes to stdout.
    #[arg(long, short = 'o', value_name = "FILE", default_value = "findings.jsonl")]
    pub output: PathBuf,

    /// Directory for per-file outcome artifacts.
    #[arg(long, value_name = "DIR")]
    pub artifacts: Option<PathBuf>,

    /// TOML config file; flags below override its values.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Byte cap for file content sent upstream.
    #[arg(long, value_name = "BYTES")]
    pub byte_cap: Option<usize>,

    /// Output-token budget requested from the model.
    #[arg(long, value_name = "TOKENS")]
    pub max_tokens: Option<u32>,

    /// Sampling temperature.
    #[arg(long, value_name = "T")]
    pub temperature: Option<f32>,

    /// Per-request timeout in seconds.
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Slices to partition a file into on the last ladder rung.
    #[arg(long, value_name = "N")]
    pub slices: Option<usize>,

    /// File extensions to scan; defaults cover common source languages.
    #[arg(long = "ext", value_name = "EXT")]
    pub extensions: Vec<String>,

    /// Probe the gateway before scanning; abort the run if it is down.
    #[arg(long)]
    pub preflight: bool,

    /// Increase log verbosity (-v info, -vv debug).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

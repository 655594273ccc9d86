// The findings stream is the run's only machine-readable product. With
// `-o -` it shares stdout, so everything human-facing goes to stderr.
#![deny(clippy::print_stdout)]

mod cli;
mod discover;
mod output;
mod worker;

pub use cli::Cli;

use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;
use vulnscout_core::ConfigOverrides;
use vulnscout_core::Driver;
use vulnscout_core::GatewayClient;
use vulnscout_core::ScanConfig;

pub async fn run_main(cli: Cli) -> anyhow::Result<()> {
    init_logging(cli.verbose);

    for root in &cli.paths {
        if !root.exists() {
            eprintln!("error: path does not exist: {}", root.display());
            std::process::exit(2);
        }
    }

    let overrides = ConfigOverrides {
        endpoint: cli.endpoints.first().cloned(),
        byte_cap: cli.byte_cap,
        max_output_tokens: cli.max_tokens,
        temperature: cli.temperature,
        request_timeout_secs: cli.timeout,
        slice_count: cli.slices,
        ..Default::default()
    };
    let base_config = ScanConfig::load(cli.config.as_deref(), overrides)?;

    let endpoints: Vec<String> = if cli.endpoints.is_empty() {
        vec![base_config.endpoint.clone()]
    } else {
        cli.endpoints
    };

    if cli.preflight {
        preflight(&base_config, &endpoints).await?;
    }

    let files = discover::discover_files(&cli.paths, &cli.extensions);
    if files.is_empty() {
        eprintln!("warning: no files matched the extension filter");
    }

    if let Some(dir) = &cli.artifacts {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create {}", dir.display()))?;
    }
    let mut writer = output::FindingsWriter::create(&cli.output)?;

    let (results_tx, mut results_rx) = tokio::sync::mpsc::unbounded_channel();
    let mut handles = Vec::new();
    for (index, subset) in worker::partition(files, cli.workers).into_iter().enumerate() {
        if subset.is_empty() {
            continue;
        }
        let mut config = base_config.clone();
        config.endpoint = endpoints[index % endpoints.len()].clone();
        let driver = Driver::new(config)?;
        handles.push(tokio::spawn(worker::run_worker(
            driver,
            subset,
            results_tx.clone(),
        )));
    }
    drop(results_tx);

    let mut scanned = 0usize;
    let mut failures = 0usize;
    while let Some(outcome) = results_rx.recv().await {
        scanned += 1;
        if outcome.failure.is_some() {
            failures += 1;
        }
        for finding in &outcome.findings {
            writer.push(finding)?;
        }
        if let Some(dir) = &cli.artifacts {
            output::write_artifact(dir, &outcome)?;
        }
    }
    for handle in handles {
        let _ = handle.await;
    }

    let (written, suppressed) = writer.finish()?;
    info!(scanned, written, suppressed, failures, "scan complete");
    eprintln!(
        "scanned {scanned} files: {written} findings ({suppressed} duplicates suppressed), {failures} failures"
    );
    Ok(())
}

/// Probe every distinct endpoint once before burning through the file
/// list; a dead gateway fails the whole run up front.
async fn preflight(config: &ScanConfig, endpoints: &[String]) -> anyhow::Result<()> {
    let mut probed = Vec::new();
    for endpoint in endpoints {
        if probed.contains(endpoint) {
            continue;
        }
        probed.push(endpoint.clone());
        let mut probe_config = config.clone();
        probe_config.endpoint = endpoint.clone();
        let client = GatewayClient::new(&probe_config)?;
        client
            .healthz()
            .await
            .with_context(|| format!("gateway {endpoint} failed the preflight probe"))?;
        info!(endpoint = %endpoint, "gateway healthy");
    }
    Ok(())
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .try_init();
}

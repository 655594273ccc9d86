use clap::Parser;
use vulnscout_cli::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    vulnscout_cli::run_main(cli).await
}

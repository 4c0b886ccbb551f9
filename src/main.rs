use std::sync::Arc;

use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use log::info;

use stream::cli::{Cli, Commands};
use stream::config::{FileConfig, RunOptions};
use stream::dispatch::Dispatcher;
use stream::gates::TokioSignals;
use stream::lifecycle::CancellationSource;
use stream::output::OutputRegistry;
use stream::runner::Workload;

fn setup_logging() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .try_init()
        .context("Failed to initialize logger")?;
    Ok(())
}

fn print_version() {
    println!("{} {}", env!("CARGO_PKG_NAME").green(), env!("CARGO_PKG_VERSION"));
}

async fn run_application(cli: &Cli, workload: Workload) -> Result<()> {
    let config = FileConfig::load(cli.config.as_ref()).context("Failed to load configuration")?;
    let options = RunOptions::resolve(&cli.run, &config).context("Invalid run options")?;
    info!("Starting with options: {:?}", options);

    // Outputs must be registered before the protocol flag is resolved.
    let registry = OutputRegistry::with_builtins();
    let mut dispatcher = Dispatcher::new(registry, Arc::new(TokioSignals));

    let source = CancellationSource::install().context("Failed to install interrupt handler")?;
    let result = dispatcher.dispatch(&source.token(), &options, &workload).await;
    source.shutdown().await;

    result.map(|_| ()).context(format!("{} stream failed", workload.name()))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Setup logging first
    setup_logging()?;

    let cli = Cli::parse();

    let workload = match &cli.command {
        Commands::Version => {
            print_version();
            return Ok(());
        }
        Commands::Log { files } => Workload::Log(files.clone()),
        Commands::Pcap { files } => Workload::Pcap(files.clone()),
    };

    run_application(&cli, workload).await
}

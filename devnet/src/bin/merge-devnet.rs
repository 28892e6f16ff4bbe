//! CLI binary for managing a local multi-client devnet.

use std::{fs, path::Path};

use clap::Parser;
use eyre::{Result, WrapErr};
use merge_devnet::{
    NetworkSummary, TestnetBuilder,
    cli::{Command, MergeDevnetCli},
    config::TestnetParams,
    platform::network::{DEFAULT_NETWORK_NAME, cleanup_network},
    summary::SUMMARY_FILE,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::builder()
        .with_default_directive(tracing::level_filters::LevelFilter::INFO.into())
        .from_env_lossy();
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|e| eyre::eyre!("Failed to initialize tracing subscriber: {e}"))?;

    let cli = MergeDevnetCli::parse();

    match cli.command {
        Command::Start { params, output } => {
            start_devnet(params.as_deref(), &output.output_dir).await
        }
        Command::Summary { output } => summary_devnet(&output.output_dir),
        Command::Clean { output } => clean_devnet(&output.output_dir).await,
    }
}

async fn start_devnet(params: Option<&Path>, output_dir: &Path) -> Result<()> {
    let params = match params {
        Some(path) => TestnetParams::from_file(path)?,
        None => TestnetParams::default(),
    };

    if output_dir.exists() {
        println!("Removing previous devnet data in {}...", output_dir.display());
        fs::remove_dir_all(output_dir)
            .wrap_err_with(|| format!("Failed to remove {}", output_dir.display()))?;
    }

    println!("Starting devnet with {} participant(s)...", params.participants.len());

    let testnet = TestnetBuilder::new(params, output_dir).build().await?;
    let path = testnet.write_summary().await?;

    println!("\nDevnet started successfully!");
    println!("{}", testnet.summary().await);
    println!("\nSummary saved to {}", path.display());
    println!("\nPress Ctrl+C to stop the devnet...");

    tokio::signal::ctrl_c().await?;

    println!("\nShutting down devnet...");

    Ok(())
}

fn summary_devnet(output_dir: &Path) -> Result<()> {
    let path = output_dir.join(SUMMARY_FILE);
    if !path.exists() {
        eprintln!("Error: no devnet summary at {}. Start one with 'merge-devnet start'", path.display());
        std::process::exit(1);
    }

    let summary = NetworkSummary::read_from_file(&path)?;
    println!("{summary}");
    Ok(())
}

async fn clean_devnet(output_dir: &Path) -> Result<()> {
    if output_dir.exists() {
        fs::remove_dir_all(output_dir)?;
        println!("Removed {}", output_dir.display());
    } else {
        println!("{} does not exist", output_dir.display());
    }
    cleanup_network(DEFAULT_NETWORK_NAME).await;
    Ok(())
}

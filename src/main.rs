use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;

use mediacache::config::Config;
use mediacache::janitor::{budget_from_gigabytes, Janitor};
use mediacache::MediaError;

/// Mediacache janitor - trims the derivative cache to a byte budget
#[derive(Parser, Debug)]
#[command(name = "mediacache")]
#[command(version, about, long_about = None)]
struct Args {
    /// Budget in whole gigabytes (1 GB = 1024^3 bytes)
    gigabytes: u64,

    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Cache directory, overrides the configuration file
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    /// Report what would be deleted without deleting
    #[arg(long)]
    dry_run: bool,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,

    /// Keep going when a deletion fails
    #[arg(long)]
    continue_on_error: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => Config::default(),
    };

    mediacache::logging::init_subscriber(&config.logging)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging subsystem: {}", e))?;

    let cache_dir = args
        .cache_dir
        .clone()
        .unwrap_or_else(|| config.media.cache_dir());
    let budget = budget_from_gigabytes(args.gigabytes);

    tracing::info!(
        cache_dir = %cache_dir.display(),
        budget_bytes = budget,
        dry_run = args.dry_run,
        "Starting janitor"
    );

    let janitor = Janitor::new(cache_dir, budget)
        .with_dry_run(args.dry_run)
        .with_continue_on_error(args.continue_on_error || config.janitor.continue_on_error);

    match janitor.run().await {
        Ok(report) => {
            if args.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print!("{}", report.summary());
            }
            Ok(())
        }
        Err(MediaError::EvictionIo {
            path,
            source,
            report,
        }) => {
            // Still show what was done before the failure
            if args.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print!("{}", report.summary());
            }
            Err(anyhow::Error::new(source)
                .context(format!("Eviction aborted while deleting {}", path.display())))
        }
        Err(e) => Err(e.into()),
    }
}

//! Freshlist main entry point
//!
//! This is the command-line interface for the Freshlist listing harvester.

use clap::Parser;
use freshlist::config::load_config_with_hash;
use freshlist::crawler::run_harvest;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Freshlist: an incremental marketplace listing harvester
///
/// Freshlist walks a paginated search feed newest-first, enriches every
/// listing it has not collected before, and records what it has seen so
/// that repeated runs only pick up newly posted items.
#[derive(Parser, Debug)]
#[command(name = "freshlist")]
#[command(version = "1.0.0")]
#[command(about = "Incremental marketplace listing harvester", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Write logs to this file instead of stderr
    #[arg(long, value_name = "FILE")]
    log_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet, cli.log_file.as_deref())?;

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            (cfg, hash)
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    // A Ctrl-C finalizes what the completed pages collected and reports the
    // run as partial rather than dropping it on the floor.
    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for shutdown signal: {}", e);
            std::future::pending::<()>().await;
        }
    };

    match run_harvest(config, &config_hash, shutdown).await {
        Ok(report) => {
            if report.partial {
                tracing::warn!(
                    "Run interrupted: {} new items over {} pages",
                    report.new_items,
                    report.pages_visited
                );
            } else {
                tracing::info!(
                    "Run complete: {} new items over {} pages",
                    report.new_items,
                    report.pages_visited
                );
            }
            if let Some(path) = &report.export_path {
                tracing::info!("Export written to {}", path.display());
            }

            // The collected batch goes to stdout as JSON, separate from logs
            println!("{}", serde_json::to_string(&report.records)?);
            Ok(())
        }
        Err(e) => {
            tracing::error!("Harvest failed: {}", e);
            Err(e.into())
        }
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(
    verbose: u8,
    quiet: bool,
    log_file: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("freshlist=info,warn"),
            1 => EnvFilter::new("freshlist=debug,info"),
            2 => EnvFilter::new("freshlist=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false);

    match log_file {
        Some(path) => {
            let file = std::fs::File::create(path)?;
            builder
                .with_ansi(false)
                .with_writer(std::sync::Arc::new(file))
                .init();
        }
        None => builder.init(),
    }

    Ok(())
}

//! Sight Screener - IPO candidate screening for the StockSight advisor.
//!
//! Serves screened candidates over HTTP, or runs the pipeline once from
//! the command line.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sight_common::config::Config;
use sight_common::logging::init_logging;
use sight_screener::screener::{
    CacheStore, CandidateService, ReportFormat, ScreeningPipeline,
};
use sight_screener::ScreenerService;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "sight-screener")]
#[command(version)]
#[command(about = "Screens recent IPOs trading below their offer price.", long_about = None)]
struct Cli {
    /// Config file (defaults to ~/.stocksight/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Serve the HTTP API
    Serve {
        /// Bind address (overrides server.host)
        #[arg(long)]
        host: Option<String>,

        /// Port (overrides server.port)
        #[arg(long)]
        port: Option<u16>,
    },

    /// Print screened candidates
    Screen {
        /// Ignore a valid cache and run the pipeline
        #[arg(long)]
        refresh: bool,

        /// Output format: markdown or json
        #[arg(short, long, default_value = "markdown")]
        format: ReportFormat,
    },

    /// Inspect or clear the result cache
    Cache {
        #[command(subcommand)]
        action: CacheCommands,
    },
}

#[derive(Subcommand, Debug)]
enum CacheCommands {
    /// Show cache file state
    Status,
    /// Delete the cache file
    Clear,
}

#[tokio::main]
async fn main() -> Result<()> {
    let startup_start = std::time::Instant::now();
    let cli = Cli::parse();

    let (mut config, config_source) = Config::load_with_env(cli.config.as_deref())?;

    init_logging(
        &config.observability.log_level,
        &config.observability.log_format,
    );

    tracing::info!("Sight Screener v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(source = %config_source, "Configuration loaded");
    config.validate().context("Invalid configuration")?;

    match cli.command {
        Commands::Serve { host, port } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }

            let service = ScreenerService::new(config)?;

            let startup_duration = startup_start.elapsed();
            tracing::info!(
                duration_ms = startup_duration.as_millis() as u64,
                "Service initialized in {:?}",
                startup_duration
            );

            service.start().await
        }
        Commands::Screen { refresh, format } => {
            let pipeline = ScreeningPipeline::from_config(&config.ipo)?;
            let service = CandidateService::new(pipeline);
            let report = service.candidates(refresh).await;
            println!("{}", report.generate(format));
            Ok(())
        }
        Commands::Cache { action } => {
            let store = CacheStore::new(&config.ipo.cache.path);
            match action {
                CacheCommands::Status => {
                    println!("{}", serde_json::to_string_pretty(&store.status())?);
                }
                CacheCommands::Clear => {
                    if store.clear()? {
                        println!("Removed {}", store.path().display());
                    } else {
                        println!("No cache at {}", store.path().display());
                    }
                }
            }
            Ok(())
        }
    }
}

//! Regulus CLI
//!
//! Local execution entry point.

use std::path::PathBuf;

use chrono::Local;
use clap::{Parser, Subcommand};
use regulus::{
    error::Result,
    models::Config,
    pipeline::{self, Enricher},
    services::{DocumentAcquirer, FederalRegisterTable, FileSource, KeywordFlagger, NoticeSource},
    storage::{LedgerStorage, LocalStorage, decode_records},
    utils::http,
};

/// Regulus - Export Control Notice Scanner
#[derive(Parser, Debug)]
#[command(
    name = "regulus",
    version,
    about = "Scans export-control notices and reports changes between runs"
)]
struct Cli {
    /// Path to storage directory holding config, ledger and reports
    #[arg(short, long, default_value = "storage")]
    storage_dir: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch notices, update the ledger and write a change report
    Scan {
        /// Read notices from a JSON file instead of the live feed
        #[arg(long)]
        input: Option<PathBuf>,
    },

    /// Validate configuration file
    Validate,

    /// Show ledger and history info
    Info,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    log::info!("Regulus starting...");

    // Load configuration
    let config_path = cli.storage_dir.join("config.toml");
    let config = Config::load_or_default(&config_path);

    log::info!("Loaded configuration from {}", cli.storage_dir.display());

    let storage = LocalStorage::new(&cli.storage_dir);

    match cli.command {
        Command::Scan { input } => {
            config.validate()?;
            let client = http::create_async_client(&config.http)?;

            let source: Box<dyn NoticeSource> = match input {
                Some(path) => Box::new(FileSource::new(path, config.source.name.clone())),
                None => Box::new(FederalRegisterTable::new(
                    client.clone(),
                    config.source.clone(),
                )),
            };

            let acquirer = DocumentAcquirer::new(
                client,
                config.acquisition.clone(),
                storage.documents_dir(),
            );
            let enricher = Enricher::new(
                acquirer,
                KeywordFlagger::new(config.flagging.keywords.as_slice()),
            );

            let summary =
                pipeline::run_scan(source.as_ref(), &enricher, &storage, Local::now()).await?;

            for line in summary.to_string().lines() {
                log::info!("{}", line);
            }
        }

        Command::Validate => {
            log::info!("Validating configuration...");

            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            log::info!(
                "✓ Config OK ({} keywords, {} byte document limit)",
                config.flagging.keywords.len(),
                config.acquisition.max_document_bytes
            );

            log::info!("All validations passed!");
        }

        Command::Info => {
            log::info!("Storage directory: {}", storage.root_dir().display());
            log::info!(
                "Config: {}",
                if config_path.exists() {
                    "exists"
                } else {
                    "not found (using defaults)"
                }
            );

            let partitions = storage.list_partitions().await?;
            if partitions.is_empty() {
                log::info!("No ledger partitions yet.");
            }
            for period in partitions {
                let rows = storage
                    .load_partition(period)
                    .await?
                    .map(|records| records.len())
                    .unwrap_or(0);
                log::info!("Ledger {}: {} rows", period, rows);
            }

            log::info!("Insight snapshots: {}", storage.list_snapshots().await?.len());

            match storage.latest_raw_batch().await? {
                Some(bytes) => log::info!("Latest raw batch: {} notices", decode_records(&bytes)?.len()),
                None => log::info!("No raw batch recorded yet."),
            }
        }
    }

    log::info!("Done!");

    Ok(())
}

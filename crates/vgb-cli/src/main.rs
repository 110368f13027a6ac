//! VGB CLI - Main entry point

use clap::Parser;
use std::process;
use std::sync::Arc;
use tracing::{error, info, warn};
use vgb_cli::api::ApiClient;
use vgb_cli::clock::SystemClock;
use vgb_cli::discovery::discover_files;
use vgb_cli::processor::Processor;
use vgb_cli::progress::{create_file_progress, render_summary};
use vgb_cli::store::ResultStore;
use vgb_cli::{Cli, Config};
use vgb_common::logging::{init_logging, LogConfig, LogLevel, LogOutput};

/// Timestamp embedded in the result file names
const RUN_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

#[tokio::main]
async fn main() {
    // .env is optional
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let console_level = if cli.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Info
    };
    let log_config = LogConfig::builder()
        .console_level(console_level)
        .file_level(LogLevel::Debug)
        .output(LogOutput::Console)
        .log_file_prefix("vgb")
        .build();

    // Environment variables take precedence
    let log_config = log_config.clone().merge_env().unwrap_or(log_config);

    // The batch still runs if logging cannot be set up
    let _guard = match init_logging(&log_config) {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("Warning: logging disabled: {:#}", e);
            None
        }
    };

    if let Err(e) = run(&cli).await {
        error!(error = %e, "Run aborted");
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

async fn run(cli: &Cli) -> vgb_cli::Result<()> {
    let config = Config::from_cli(cli);
    config.validate()?;

    let files = discover_files(&cli.directory, &config.extensions)?;
    if files.is_empty() {
        warn!(
            extensions = %config.extensions.join(", "),
            "No files found with allowed extensions"
        );
        return Ok(());
    }
    info!(count = files.len(), directory = %cli.directory.display(), "Found files to process");

    std::fs::create_dir_all(&config.output_dir)?;
    let timestamp = chrono::Local::now().format(RUN_TIMESTAMP_FORMAT).to_string();
    let (csv_path, json_path) = config.result_paths(&timestamp);
    let store = ResultStore::open(csv_path, json_path)?;

    for path in store.artifact_paths() {
        info!(path = %path.display(), "Results will be saved");
    }

    let api = ApiClient::from_config(&config)?;
    let mut processor = Processor::new(api, Arc::new(SystemClock), config.poll, store);

    let pb = create_file_progress(files.len() as u64);
    let summary = processor.run(&files, Some(&pb)).await;
    pb.finish_and_clear();

    println!(
        "{}",
        render_summary(&summary, &processor.store().artifact_paths())
    );
    Ok(())
}

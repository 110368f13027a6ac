//! VGB CLI Library
//!
//! Batch submitter for the VoiceGuard analysis backend.
//!
//! # Overview
//!
//! For every matching file under a directory, one after another:
//!
//! 1. **Upload** ([`upload`]): create a blob, PUT the bytes, register the file
//! 2. **Poll** ([`poller`]): wait for the stream to complete or time out, then
//!    fetch the richest detailed snapshot the backend will return
//! 3. **Persist** ([`store`]): keep the per-file CSV row current and upsert the
//!    detailed JSON record
//!
//! [`processor`] drives that sequence and isolates failures per file.

pub mod api;
pub mod clock;
pub mod config;
pub mod descriptor;
pub mod discovery;
pub mod duration;
pub mod error;
pub mod poller;
pub mod processor;
pub mod progress;
pub mod retry;
pub mod store;
pub mod upload;

// Re-export commonly used types
pub use config::{Config, OutputFormat};
pub use error::{CliError, Result};

use clap::Parser;
use std::path::PathBuf;

/// VGB - submit audio files to VoiceGuard and collect the verdicts
#[derive(Parser, Debug)]
#[command(name = "vgb")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Directory containing files to process (searched recursively)
    pub directory: PathBuf,

    /// Allowed file extensions (e.g. .wav .mp3)
    #[arg(long, num_args = 1.., default_value = config::DEFAULT_EXTENSION)]
    pub extensions: Vec<String>,

    /// API key (required for non-localhost backends)
    #[arg(long, env = "API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// GraphQL endpoint of the backend
    #[arg(long, env = "BACKEND_URL", default_value = config::DEFAULT_BACKEND_URL)]
    pub backend_url: String,

    /// Output format(s): csv, json, or both
    #[arg(long, value_enum, num_args = 1.., default_value = "csv")]
    pub output: Vec<OutputFormat>,

    /// Directory where result files are written
    #[arg(long, default_value = ".")]
    pub output_dir: PathBuf,

    /// Verbose console output
    #[arg(short, long)]
    pub verbose: bool,
}

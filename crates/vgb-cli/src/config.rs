//! Configuration management for the VGB CLI
//!
//! Flags come from clap (with `BACKEND_URL`/`API_KEY` env fallbacks and a
//! `.env` file loaded in `main`). [`Config::validate`] is the only gate that
//! can stop a run before any file is touched.

use crate::error::{CliError, Result};
use crate::poller::PollSettings;
use crate::Cli;
use clap::ValueEnum;
use std::path::{Path, PathBuf};
use std::time::Duration;

// ============================================================================
// CLI Configuration Constants
// ============================================================================

/// Production GraphQL endpoint
pub const DEFAULT_BACKEND_URL: &str = "https://app.api.voiceguard.realitydefender.xyz/query";

/// Default timeout for a single HTTP request in seconds.
/// Can be overridden via VGB_HTTP_TIMEOUT_SECS.
/// Large uploads share this timeout, hence the generous default.
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 300;

/// Extension filter used when `--extensions` is not given
pub const DEFAULT_EXTENSION: &str = ".wav";

/// Requested result artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Csv,
    Json,
    Both,
}

/// Which sinks are enabled for this run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OutputSelection {
    pub csv: bool,
    pub json: bool,
}

impl OutputSelection {
    pub fn from_formats(formats: &[OutputFormat]) -> Self {
        let mut selection = Self::default();
        for format in formats {
            match format {
                OutputFormat::Csv => selection.csv = true,
                OutputFormat::Json => selection.json = true,
                OutputFormat::Both => {
                    selection.csv = true;
                    selection.json = true;
                }
            }
        }
        selection
    }
}

/// Resolved run configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// GraphQL endpoint
    pub backend_url: String,

    /// Sent as `X-API-KEY` when present
    pub api_key: Option<String>,

    /// Lowercase extensions with a leading dot
    pub extensions: Vec<String>,

    pub outputs: OutputSelection,

    /// Directory receiving `results_<timestamp>.*`
    pub output_dir: PathBuf,

    pub http_timeout: Duration,

    pub poll: PollSettings,
}

impl Config {
    /// Build a config from parsed arguments (does not validate)
    pub fn from_cli(cli: &Cli) -> Self {
        let http_timeout = std::env::var("VGB_HTTP_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS);

        Self {
            backend_url: cli.backend_url.clone(),
            api_key: cli.api_key.clone().filter(|key| !key.trim().is_empty()),
            extensions: normalize_extensions(&cli.extensions),
            outputs: OutputSelection::from_formats(&cli.output),
            output_dir: cli.output_dir.clone(),
            http_timeout: Duration::from_secs(http_timeout),
            poll: PollSettings::default(),
        }
    }

    /// Check that the backend can be reached with the given credentials
    pub fn validate(&self) -> Result<()> {
        let url = url::Url::parse(&self.backend_url)
            .map_err(|e| CliError::config(format!("invalid backend URL '{}': {}", self.backend_url, e)))?;

        if !is_local_host(&url) && self.api_key.is_none() {
            return Err(CliError::config(format!(
                "an API key is required for non-localhost backend '{}'",
                url.host_str().unwrap_or_default()
            )));
        }

        Ok(())
    }

    /// Paths for the CSV and JSON artifacts of a run started at `timestamp`
    pub fn result_paths(&self, timestamp: &str) -> (Option<PathBuf>, Option<PathBuf>) {
        let csv = self
            .outputs
            .csv
            .then(|| result_path(&self.output_dir, timestamp, "csv"));
        let json = self
            .outputs
            .json
            .then(|| result_path(&self.output_dir, timestamp, "json"));
        (csv, json)
    }
}

fn result_path(dir: &Path, timestamp: &str, ext: &str) -> PathBuf {
    dir.join(format!("results_{}.{}", timestamp, ext))
}

/// Localhost backends run without authentication
pub fn is_local_host(url: &url::Url) -> bool {
    matches!(url.host_str(), Some("localhost") | Some("127.0.0.1"))
}

/// Lowercase and prefix with `.`; `WAV` and `.wav` are the same filter
pub fn normalize_extensions(raw: &[String]) -> Vec<String> {
    raw.iter()
        .map(|ext| ext.trim().to_lowercase())
        .filter(|ext| !ext.is_empty() && ext != ".")
        .map(|ext| {
            if ext.starts_with('.') {
                ext
            } else {
                format!(".{}", ext)
            }
        })
        .collect()
}

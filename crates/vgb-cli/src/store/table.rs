//! Running results table (`results_<timestamp>.csv`)
//!
//! One row per submitted file, updated in place as the file moves through
//! its lifecycle. The table has a single owner: rows live in memory and the
//! whole file is rewritten (temp file, then rename) after every mutation, so
//! a crash never leaves a half-written CSV behind.

use crate::error::{CliError, Result};
use crate::poller::{StreamVerdict, UNKNOWN_PROBABILITY};
use serde::{Deserialize, Serialize, Serializer};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, warn};
use vgb_common::RowStatus;

/// Column order of the CSV
pub const RESULT_COLUMNS: [&str; 7] = [
    "original_filename",
    "file_id",
    "stream_id",
    "status",
    "conclusion",
    "probability",
    "reason",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRow {
    pub original_filename: String,
    pub file_id: String,
    pub stream_id: String,
    pub status: RowStatus,
    pub conclusion: String,
    #[serde(serialize_with = "plain_number")]
    pub probability: f64,
    pub reason: String,
}

impl ResultRow {
    fn uploading(original_filename: String) -> Self {
        Self {
            original_filename,
            file_id: String::new(),
            stream_id: String::new(),
            status: RowStatus::Uploading,
            conclusion: String::new(),
            probability: UNKNOWN_PROBABILITY,
            reason: String::new(),
        }
    }

    /// Still waiting for a file id
    fn is_pending_for(&self, original_filename: &str) -> bool {
        self.original_filename == original_filename && self.file_id.is_empty() && !self.status.is_terminal()
    }
}

/// `-1` rather than `-1.0`
fn plain_number<S: Serializer>(value: &f64, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.collect_str(value)
}

/// In-memory table mirrored to a CSV file
#[derive(Debug)]
pub struct ResultTable {
    path: PathBuf,
    rows: Vec<ResultRow>,
}

impl ResultTable {
    /// Open the table at `path`, keeping rows from an existing file
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let rows = if path.exists() {
            let rows = load_rows(&path)?;
            debug!(path = %path.display(), rows = rows.len(), "Loaded existing results table");
            rows
        } else {
            Vec::new()
        };

        let table = Self { path, rows };
        table.flush()?;
        Ok(table)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn rows(&self) -> &[ResultRow] {
        &self.rows
    }

    /// Start tracking a file that is about to be uploaded
    pub fn append_initial(&mut self, original_filename: &str) -> Result<()> {
        self.rows.push(ResultRow::uploading(original_filename.to_string()));
        self.flush()
    }

    /// Attach the registered file id to the file's pending row
    pub fn set_registered(&mut self, original_filename: &str, file_id: &str, status: RowStatus) -> Result<()> {
        let index = self
            .pending_index(original_filename)
            .ok_or_else(|| CliError::MissingRow(original_filename.to_string()))?;

        let row = &mut self.rows[index];
        row.status = row.status.advance(status)?;
        row.file_id = file_id.to_string();
        self.flush()
    }

    /// Record the final verdict for a registered file
    pub fn set_terminal(&mut self, file_id: &str, verdict: &StreamVerdict) -> Result<()> {
        let index = self
            .file_index(file_id)
            .ok_or_else(|| CliError::MissingRow(file_id.to_string()))?;

        let row = &mut self.rows[index];
        row.status = row.status.advance(RowStatus::Completed)?;
        row.stream_id = verdict.stream_id.clone();
        row.conclusion = verdict.conclusion.clone();
        row.probability = verdict.probability;
        row.reason = verdict.reason.clone();
        self.flush()
    }

    /// Mark the file's row as failed.
    ///
    /// Looks the row up by file id when one exists, otherwise by the pending
    /// path. A file with no row at all gets a fresh one.
    pub fn set_error(&mut self, original_filename: &str, file_id: Option<&str>, reason: &str) -> Result<()> {
        let file_id = file_id.filter(|id| !id.is_empty());
        let index = match file_id {
            Some(id) => self.file_index(id),
            None => self.pending_index(original_filename),
        };

        match index {
            Some(index) => {
                let row = &mut self.rows[index];
                row.status = row.status.advance(RowStatus::Error)?;
                row.reason = reason.to_string();
            }
            None => {
                warn!(path = original_filename, "No row to mark as failed, appending one");
                let mut row = ResultRow::uploading(original_filename.to_string());
                row.file_id = file_id.unwrap_or_default().to_string();
                row.status = RowStatus::Error;
                row.reason = reason.to_string();
                self.rows.push(row);
            }
        }

        self.flush()
    }

    fn pending_index(&self, original_filename: &str) -> Option<usize> {
        self.rows.iter().rposition(|row| row.is_pending_for(original_filename))
    }

    fn file_index(&self, file_id: &str) -> Option<usize> {
        self.rows.iter().rposition(|row| row.file_id == file_id)
    }

    /// Rewrite the whole file through a temp file in the same directory
    fn flush(&self) -> Result<()> {
        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let mut temp = NamedTempFile::new_in(dir)?;

        {
            let mut writer = csv::WriterBuilder::new()
                .has_headers(false)
                .from_writer(temp.as_file_mut());
            writer.write_record(RESULT_COLUMNS)?;
            for row in &self.rows {
                writer.serialize(row)?;
            }
            writer.flush()?;
        }

        temp.persist(&self.path).map_err(|e| CliError::Io(e.error))?;
        Ok(())
    }
}

fn load_rows(path: &Path) -> Result<Vec<ResultRow>> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut rows = Vec::new();
    for row in reader.deserialize() {
        rows.push(row?);
    }
    Ok(rows)
}

//! Detailed results (`results_<timestamp>.json`)
//!
//! A JSON array with at most one record per file id. Every upsert re-reads the
//! file, so the array on disk is always the full set written so far.

use crate::error::{CliError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

/// `analyzed_at` format: local time, microsecond precision
pub const ANALYZED_AT_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailedRecord {
    pub original_filename: String,
    pub file_id: String,
    pub analyzed_at: String,
    pub stream_data: Value,
}

impl DetailedRecord {
    /// Record stamped with the current local time
    pub fn new(original_filename: impl Into<String>, file_id: impl Into<String>, stream_data: Value) -> Self {
        Self {
            original_filename: original_filename.into(),
            file_id: file_id.into(),
            analyzed_at: chrono::Local::now().format(ANALYZED_AT_FORMAT).to_string(),
            stream_data,
        }
    }
}

/// Upsert-by-file-id JSON array on disk
#[derive(Debug, Clone)]
pub struct DetailedSink {
    path: PathBuf,
}

impl DetailedSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create the file as an empty array unless it already exists
    pub fn initialize(&self) -> Result<()> {
        if !self.path.exists() {
            self.write(&[])?;
        }
        Ok(())
    }

    /// Current records; a missing or unreadable file counts as empty
    pub fn load(&self) -> Vec<DetailedRecord> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Could not read detailed results, starting fresh");
                return Vec::new();
            }
        };

        match serde_json::from_str(&content) {
            Ok(records) => records,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Detailed results file is not valid, starting fresh");
                Vec::new()
            }
        }
    }

    /// Replace the record with the same file id, or append it.
    ///
    /// Returns the number of records now on disk.
    pub fn upsert(&self, record: DetailedRecord) -> Result<usize> {
        let mut records = self.load();

        match records.iter_mut().find(|r| r.file_id == record.file_id) {
            Some(existing) => {
                debug!(file_id = %record.file_id, "Replacing detailed record");
                *existing = record;
            }
            None => {
                debug!(file_id = %record.file_id, "Adding detailed record");
                records.push(record);
            }
        }

        self.write(&records)?;
        Ok(records.len())
    }

    fn write(&self, records: &[DetailedRecord]) -> Result<()> {
        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let mut temp = NamedTempFile::new_in(dir)?;

        serde_json::to_writer_pretty(temp.as_file_mut(), records)?;
        temp.as_file_mut().write_all(b"\n")?;
        temp.as_file_mut().sync_all()?;

        temp.persist(&self.path).map_err(|e| CliError::Io(e.error))?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(file_id: &str, marker: u32) -> DetailedRecord {
        DetailedRecord::new(format!("/data/{}.wav", file_id), file_id, json!({"marker": marker}))
    }

    #[test]
    fn test_initialize_creates_empty_array() {
        let dir = tempfile::tempdir().unwrap();
        let sink = DetailedSink::new(dir.path().join("results.json"));

        sink.initialize().unwrap();
        let content = std::fs::read_to_string(sink.path()).unwrap();
        assert_eq!(serde_json::from_str::<Value>(&content).unwrap(), json!([]));
    }

    #[test]
    fn test_upsert_counts_distinct_ids_last_wins() {
        let dir = tempfile::tempdir().unwrap();
        let sink = DetailedSink::new(dir.path().join("results.json"));
        sink.initialize().unwrap();

        let ids = ["f1", "f2", "f1", "f3", "f2", "f1"];
        let mut count = 0;
        for (n, id) in ids.iter().enumerate() {
            count = sink.upsert(record(id, n as u32)).unwrap();
        }

        assert_eq!(count, 3);
        let records = sink.load();
        assert_eq!(records.len(), 3);
        // replaced in place, first-seen order kept
        assert_eq!(records[0].file_id, "f1");
        assert_eq!(records[0].stream_data["marker"], 5);
        assert_eq!(records[1].stream_data["marker"], 4);
        assert_eq!(records[2].stream_data["marker"], 3);
    }

    #[test]
    fn test_reupsert_same_record_keeps_count() {
        let dir = tempfile::tempdir().unwrap();
        let sink = DetailedSink::new(dir.path().join("results.json"));

        let rec = record("f1", 1);
        assert_eq!(sink.upsert(rec.clone()).unwrap(), 1);
        assert_eq!(sink.upsert(rec.clone()).unwrap(), 1);
        assert_eq!(sink.load(), vec![rec]);
    }

    #[test]
    fn test_corrupt_file_is_reset() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.json");
        std::fs::write(&path, "{ not json").unwrap();

        let sink = DetailedSink::new(&path);
        assert!(sink.load().is_empty());
        assert_eq!(sink.upsert(record("f1", 1)).unwrap(), 1);

        let on_disk: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(on_disk.as_array().unwrap().len(), 1);
        assert_eq!(on_disk[0]["file_id"], "f1");
        assert_eq!(on_disk[0]["original_filename"], "/data/f1.wav");
    }

    #[test]
    fn test_analyzed_at_has_microseconds() {
        let rec = record("f1", 1);
        let parsed = chrono::NaiveDateTime::parse_from_str(&rec.analyzed_at, ANALYZED_AT_FORMAT);
        assert!(parsed.is_ok(), "{}", rec.analyzed_at);
        assert_eq!(rec.analyzed_at.rsplit('.').next().unwrap().len(), 6);
    }
}

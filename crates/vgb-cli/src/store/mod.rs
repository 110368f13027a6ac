//! Result persistence
//!
//! Two independent sinks, each optional per `--output`:
//! - [`ResultTable`]: the running CSV, one row per file
//! - [`DetailedSink`]: the JSON array of detailed stream snapshots

pub mod detailed;
pub mod table;

pub use detailed::{DetailedRecord, DetailedSink};
pub use table::{ResultRow, ResultTable, RESULT_COLUMNS};

use crate::error::Result;
use crate::poller::StreamVerdict;
use serde_json::Value;
use std::path::{Path, PathBuf};
use vgb_common::RowStatus;

/// The enabled sinks for one run; disabled sinks make every call a no-op
#[derive(Debug, Default)]
pub struct ResultStore {
    table: Option<ResultTable>,
    detailed: Option<DetailedSink>,
}

impl ResultStore {
    /// Open the table and initialize the detailed file for the given paths
    pub fn open(csv: Option<PathBuf>, json: Option<PathBuf>) -> Result<Self> {
        let table = csv.map(ResultTable::open).transpose()?;
        let detailed = match json {
            Some(path) => {
                let sink = DetailedSink::new(path);
                sink.initialize()?;
                Some(sink)
            }
            None => None,
        };

        Ok(Self { table, detailed })
    }

    pub fn table(&self) -> Option<&ResultTable> {
        self.table.as_ref()
    }

    pub fn detailed(&self) -> Option<&DetailedSink> {
        self.detailed.as_ref()
    }

    /// Paths of the artifacts this run writes
    pub fn artifact_paths(&self) -> Vec<&Path> {
        self.table
            .iter()
            .map(ResultTable::path)
            .chain(self.detailed.iter().map(DetailedSink::path))
            .collect()
    }

    pub fn append_initial(&mut self, original_filename: &str) -> Result<()> {
        match self.table.as_mut() {
            Some(table) => table.append_initial(original_filename),
            None => Ok(()),
        }
    }

    pub fn set_registered(&mut self, original_filename: &str, file_id: &str, status: RowStatus) -> Result<()> {
        match self.table.as_mut() {
            Some(table) => table.set_registered(original_filename, file_id, status),
            None => Ok(()),
        }
    }

    pub fn set_terminal(&mut self, file_id: &str, verdict: &StreamVerdict) -> Result<()> {
        match self.table.as_mut() {
            Some(table) => table.set_terminal(file_id, verdict),
            None => Ok(()),
        }
    }

    pub fn set_error(&mut self, original_filename: &str, file_id: Option<&str>, reason: &str) -> Result<()> {
        match self.table.as_mut() {
            Some(table) => table.set_error(original_filename, file_id, reason),
            None => Ok(()),
        }
    }

    /// Upsert a detailed record; returns the record count when the sink is on
    pub fn upsert_detailed(&self, original_filename: &str, file_id: &str, stream_data: Value) -> Result<Option<usize>> {
        match &self.detailed {
            Some(sink) => {
                let record = DetailedRecord::new(original_filename, file_id, stream_data);
                sink.upsert(record).map(Some)
            }
            None => Ok(None),
        }
    }
}

//! Batch orchestration
//!
//! Files are processed strictly one after another. Each file runs the full
//! state machine (row, upload, poll, persist) before the next one starts, and
//! any error inside a file stops at the file boundary: it is logged, written
//! to that file's row as `ERROR`, and the batch moves on.

use crate::api::ApiClient;
use crate::clock::Clock;
use crate::descriptor::FileDescriptor;
use crate::duration::probe_duration;
use crate::error::Result;
use crate::poller::{PollOutcome, PollSettings, ResultPoller, StreamVerdict};
use crate::progress::RunSummary;
use crate::store::ResultStore;
use crate::upload::UploadNegotiator;
use indicatif::ProgressBar;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use vgb_common::RowStatus;

/// Reads a file's media duration in seconds
pub type DurationProbe = fn(&Path) -> Option<f64>;

/// How one file ended
#[derive(Debug, Clone, PartialEq)]
pub enum FileOutcome {
    Completed { file_id: String, verdict: StreamVerdict },
    TimedOut { file_id: String },
    Failed { reason: String },
}

/// Drives every file of a run through upload, polling and persistence
pub struct Processor {
    api: ApiClient,
    clock: Arc<dyn Clock>,
    settings: PollSettings,
    store: ResultStore,
    probe: DurationProbe,
}

impl Processor {
    pub fn new(api: ApiClient, clock: Arc<dyn Clock>, settings: PollSettings, store: ResultStore) -> Self {
        Self {
            api,
            clock,
            settings,
            store,
            probe: probe_duration,
        }
    }

    /// Replace the duration probe used to size poll budgets
    pub fn with_duration_probe(mut self, probe: DurationProbe) -> Self {
        self.probe = probe;
        self
    }

    pub fn store(&self) -> &ResultStore {
        &self.store
    }

    /// Process every file in order
    pub async fn run(&mut self, files: &[PathBuf], progress: Option<&ProgressBar>) -> RunSummary {
        let mut summary = RunSummary::default();

        for path in files {
            match self.process_file(path).await {
                FileOutcome::Completed { .. } => summary.completed += 1,
                FileOutcome::TimedOut { .. } => summary.timed_out += 1,
                FileOutcome::Failed { .. } => summary.errored += 1,
            }

            if let Some(pb) = progress {
                pb.inc(1);
            }
        }

        info!(
            completed = summary.completed,
            timed_out = summary.timed_out,
            errored = summary.errored,
            "Batch finished"
        );
        summary
    }

    /// Run one file to a terminal state; never fails
    pub async fn process_file(&mut self, path: &Path) -> FileOutcome {
        let name = path.display().to_string();
        let mut file_id: Option<String> = None;

        match self.run_file(path, &name, &mut file_id).await {
            Ok(outcome) => outcome,
            Err(err) => {
                let reason = err.to_string();
                error!(path = %name, error = %reason, "Error processing file");

                if let Err(e) = self.store.set_error(&name, file_id.as_deref(), &reason) {
                    error!(path = %name, error = %e, "Could not record failure in results table");
                }
                FileOutcome::Failed { reason }
            }
        }
    }

    async fn run_file(&mut self, path: &Path, name: &str, file_id: &mut Option<String>) -> Result<FileOutcome> {
        self.store.append_initial(name)?;

        let descriptor = FileDescriptor::from_path(path)?;
        let id = UploadNegotiator::new(&self.api).negotiate(&descriptor).await?;
        *file_id = Some(id.clone());
        self.store.set_registered(name, &id, RowStatus::Processing)?;

        let timeout = self.settings.timeout_for((self.probe)(path));
        let poller = ResultPoller::new(&self.api, self.clock.as_ref(), self.settings);
        let outcome = poller.wait_for_result(&id, timeout).await;
        self.store.set_terminal(&id, &outcome.verdict())?;

        let verdict = match outcome {
            PollOutcome::Complete(verdict) => verdict,
            PollOutcome::Timeout { .. } => return Ok(FileOutcome::TimedOut { file_id: id }),
        };

        if self.store.detailed().is_some() {
            debug!(file_id = %id, "Fetching detailed stream data");
            match poller.fetch_detailed(&id).await {
                Some(snapshot) => match self.store.upsert_detailed(name, &id, snapshot.data) {
                    Ok(count) => debug!(file_id = %id, kind = ?snapshot.kind, records = ?count, "Saved detailed stream data"),
                    Err(e) => warn!(file_id = %id, error = %e, "Could not save detailed stream data"),
                },
                None => warn!(file_id = %id, "Could not fetch detailed stream data"),
            }
        }

        Ok(FileOutcome::Completed { file_id: id, verdict })
    }
}

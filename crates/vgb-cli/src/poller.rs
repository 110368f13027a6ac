//! Result polling state machine
//!
//! ```text
//!            status query every interval
//!   WAITING ─────────────────────────────┐
//!      │ streamStatus=COMPLETED          │ deadline passed
//!      │ and a conclusion                ▼
//!      ▼                              TIMEOUT  (INCONCLUSIVE, -1, "TIMEOUT")
//!   COMPLETE ── snapshot once ── details with backoff ── fall back to snapshot
//! ```
//!
//! The status query is the only completion signal. Detailed snapshots are
//! best effort and never hold up the verdict: a failed snapshot just means
//! no detailed record for the file.

use crate::api::{Segment, Stream, StreamQuery, StreamSource};
use crate::clock::Clock;
use crate::error::CliError;
use crate::retry::{retry, RetryPolicy};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, warn};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Poll budget when the audio duration could not be probed
pub const DEFAULT_MEDIA_DURATION: Duration = Duration::from_secs(180);

/// Added to the media duration to get the poll budget
pub const TIMEOUT_GRACE: Duration = Duration::from_secs(60);

/// Enrichment: up to 100 attempts, 1s doubling
pub const ENRICHMENT_POLICY: RetryPolicy = RetryPolicy::new(100, Duration::from_secs(1), 2);

pub const STATUS_COMPLETED: &str = "COMPLETED";
pub const CONCLUSION_INCONCLUSIVE: &str = "INCONCLUSIVE";
pub const TIMEOUT_REASON: &str = "TIMEOUT";

/// Separator between de-duplicated preprocessing conclusions
pub const REASON_DELIMITER: &str = ", ";

/// Probability recorded when the backend gave none
pub const UNKNOWN_PROBABILITY: f64 = -1.0;

/// Timing knobs for polling and enrichment
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PollSettings {
    pub interval: Duration,
    pub default_duration: Duration,
    pub grace: Duration,
    pub enrichment: RetryPolicy,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            default_duration: DEFAULT_MEDIA_DURATION,
            grace: TIMEOUT_GRACE,
            enrichment: ENRICHMENT_POLICY,
        }
    }
}

impl PollSettings {
    /// Poll budget for a file of the given (probed) duration in seconds
    pub fn timeout_for(&self, media_secs: Option<f64>) -> Duration {
        let media = media_secs
            .filter(|secs| secs.is_finite() && *secs > 0.0)
            .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
            .unwrap_or(self.default_duration);
        media.saturating_add(self.grace)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    Waiting,
    Complete,
    Timeout,
}

/// Terminal result for one stream, as written to the results table
#[derive(Debug, Clone, PartialEq)]
pub struct StreamVerdict {
    pub stream_id: String,
    pub conclusion: String,
    pub probability: f64,
    pub reason: String,
}

impl StreamVerdict {
    /// Result synthesized when the stream never completed in time
    pub fn timed_out() -> Self {
        Self {
            stream_id: String::new(),
            conclusion: CONCLUSION_INCONCLUSIVE.to_string(),
            probability: UNKNOWN_PROBABILITY,
            reason: TIMEOUT_REASON.to_string(),
        }
    }
}

/// How polling ended
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    Complete(StreamVerdict),
    Timeout { waited: Duration },
}

impl PollOutcome {
    pub fn state(&self) -> PollState {
        match self {
            PollOutcome::Complete(_) => PollState::Complete,
            PollOutcome::Timeout { .. } => PollState::Timeout,
        }
    }

    /// The verdict to record; timeouts get the synthesized one
    pub fn verdict(&self) -> StreamVerdict {
        match self {
            PollOutcome::Complete(verdict) => verdict.clone(),
            PollOutcome::Timeout { .. } => StreamVerdict::timed_out(),
        }
    }
}

/// Which query produced a detailed snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotKind {
    Details,
    Snapshot,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DetailedSnapshot {
    pub kind: SnapshotKind,
    pub data: Value,
}

/// Verdict if the stream is complete and carries a conclusion
pub fn verdict_from_stream(stream: &Stream) -> Option<StreamVerdict> {
    if stream.stream_status.as_deref() != Some(STATUS_COMPLETED) {
        return None;
    }

    let result = stream.stream_result.as_ref()?;
    let conclusion = result.conclusion.as_deref().filter(|c| !c.is_empty())?;

    let reason = if conclusion == CONCLUSION_INCONCLUSIVE {
        inconclusive_reason(stream.segments.as_deref().unwrap_or_default())
    } else {
        String::new()
    };

    Some(StreamVerdict {
        stream_id: stream.id.clone().unwrap_or_default(),
        conclusion: conclusion.to_string(),
        probability: result.probability.unwrap_or(UNKNOWN_PROBABILITY),
        reason,
    })
}

/// Distinct preprocessing conclusions in first-seen order
pub fn inconclusive_reason(segments: &[Segment]) -> String {
    let mut seen: Vec<&str> = Vec::new();

    for conclusion in segments
        .iter()
        .filter_map(|s| s.preprocessing_result.as_ref())
        .filter_map(|p| p.preprocessing_conclusion.as_deref())
        .filter(|c| !c.is_empty())
    {
        if !seen.contains(&conclusion) {
            seen.push(conclusion);
        }
    }

    seen.join(REASON_DELIMITER)
}

/// Per-model conclusions across all segments, in order
pub fn model_conclusions(segments: &[Segment]) -> Vec<&str> {
    segments
        .iter()
        .filter_map(|s| s.model_results.as_deref())
        .flatten()
        .filter_map(|m| m.conclusion.as_deref())
        .collect()
}

/// Polls one file's stream to a terminal state
pub struct ResultPoller<'a> {
    source: &'a dyn StreamSource,
    clock: &'a dyn Clock,
    settings: PollSettings,
}

impl<'a> ResultPoller<'a> {
    pub fn new(source: &'a dyn StreamSource, clock: &'a dyn Clock, settings: PollSettings) -> Self {
        Self {
            source,
            clock,
            settings,
        }
    }

    /// Query the status until COMPLETE or until `timeout` has elapsed
    pub async fn wait_for_result(&self, file_id: &str, timeout: Duration) -> PollOutcome {
        let started = self.clock.now();
        let mut polls: u32 = 0;
        debug!(file_id, timeout_secs = timeout.as_secs_f64(), "Waiting for processing to complete");

        loop {
            polls += 1;
            if let Some(verdict) = self.check_status(file_id).await {
                info!(
                    file_id,
                    conclusion = %verdict.conclusion,
                    probability = verdict.probability,
                    polls,
                    "Processing complete"
                );
                return PollOutcome::Complete(verdict);
            }

            let waited = self.clock.now().saturating_duration_since(started);
            if waited > timeout {
                warn!(file_id, timeout_secs = timeout.as_secs_f64(), polls, "Processing timed out");
                return PollOutcome::Timeout { waited };
            }

            self.clock.sleep(self.settings.interval).await;
        }
    }

    /// One status query; any failure reads as "not ready yet"
    async fn check_status(&self, file_id: &str) -> Option<StreamVerdict> {
        let raw = match self.source.fetch_stream(file_id, StreamQuery::Status).await {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!(file_id, "No stream yet");
                return None;
            }
            Err(err) => {
                debug!(file_id, error = %err, "Status query failed");
                return None;
            }
        };

        match serde_json::from_value::<Stream>(raw) {
            Ok(stream) => {
                let verdict = verdict_from_stream(&stream)?;
                debug!(
                    file_id,
                    models = %model_conclusions(stream.segments.as_deref().unwrap_or_default()).join(REASON_DELIMITER),
                    ms_to_conclusion = ?stream.stream_result.as_ref().and_then(|r| r.milliseconds_to_conclusion),
                    "Stream concluded"
                );
                Some(verdict)
            }
            Err(err) => {
                debug!(file_id, error = %err, "Unexpected stream shape");
                None
            }
        }
    }

    /// Best obtainable detailed snapshot after completion
    pub async fn fetch_detailed(&self, file_id: &str) -> Option<DetailedSnapshot> {
        let snapshot = match self.source.fetch_stream(file_id, StreamQuery::Snapshot).await {
            Ok(Some(data)) => data,
            Ok(None) => {
                debug!(file_id, "Snapshot query returned no stream");
                return None;
            }
            Err(err) => {
                debug!(file_id, error = %err, "Snapshot query failed");
                return None;
            }
        };

        let source = self.source;
        let details = retry(
            &self.settings.enrichment,
            self.clock,
            "stream details",
            |attempt| async move {
                debug!(file_id, attempt, "Requesting detailed stream");
                source
                    .fetch_stream(file_id, StreamQuery::Details)
                    .await?
                    .ok_or_else(|| CliError::api("stream details not available"))
            },
        )
        .await;

        Some(match details {
            Some(data) => DetailedSnapshot {
                kind: SnapshotKind::Details,
                data,
            },
            None => {
                debug!(file_id, "Falling back to basic stream snapshot");
                DetailedSnapshot {
                    kind: SnapshotKind::Snapshot,
                    data: snapshot,
                }
            }
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::error::Result;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicU32, Ordering};

    type Responder = Box<dyn Fn(u32) -> Result<Option<Value>> + Send + Sync>;

    /// Scripted backend: each query kind answers from a closure given its call number
    struct FakeSource {
        status: Responder,
        snapshot: Responder,
        details: Responder,
        calls: [AtomicU32; 3],
    }

    impl FakeSource {
        fn new(status: Responder, snapshot: Responder, details: Responder) -> Self {
            Self {
                status,
                snapshot,
                details,
                calls: [AtomicU32::new(0), AtomicU32::new(0), AtomicU32::new(0)],
            }
        }

        fn calls(&self, query: StreamQuery) -> u32 {
            self.calls[Self::slot(query)].load(Ordering::SeqCst)
        }

        fn slot(query: StreamQuery) -> usize {
            match query {
                StreamQuery::Status => 0,
                StreamQuery::Snapshot => 1,
                StreamQuery::Details => 2,
            }
        }
    }

    #[async_trait]
    impl StreamSource for FakeSource {
        async fn fetch_stream(&self, _file_id: &str, query: StreamQuery) -> Result<Option<Value>> {
            let n = self.calls[Self::slot(query)].fetch_add(1, Ordering::SeqCst) + 1;
            match query {
                StreamQuery::Status => (self.status)(n),
                StreamQuery::Snapshot => (self.snapshot)(n),
                StreamQuery::Details => (self.details)(n),
            }
        }
    }

    fn never() -> Responder {
        Box::new(|_| Err(CliError::api("HTTP 503 Service Unavailable")))
    }

    fn processing() -> Value {
        json!({"id": "stream-1", "streamStatus": "PROCESSING", "streamResult": null})
    }

    fn completed(conclusion: &str, probability: f64) -> Value {
        json!({
            "id": "stream-1",
            "streamStatus": "COMPLETED",
            "streamResult": {"conclusion": conclusion, "probability": probability},
            "segments": []
        })
    }

    fn secs(n: u64) -> Duration {
        Duration::from_secs(n)
    }

    #[test]
    fn test_timeout_arithmetic() {
        let settings = PollSettings::default();
        assert_eq!(settings.timeout_for(None), secs(240));
        assert_eq!(settings.timeout_for(Some(30.0)), secs(90));
        assert_eq!(settings.timeout_for(Some(0.0)), secs(240));
        assert_eq!(settings.timeout_for(Some(f64::NAN)), secs(240));
    }

    #[test]
    fn test_unrepresentable_duration_falls_back_to_default() {
        let settings = PollSettings::default();
        // Corrupt headers can report absurd frame counts
        assert_eq!(settings.timeout_for(Some(1e30)), secs(240));
        assert_eq!(settings.timeout_for(Some(f64::MAX)), secs(240));

        let near_max = PollSettings {
            grace: Duration::MAX,
            ..PollSettings::default()
        };
        assert_eq!(near_max.timeout_for(Some(30.0)), Duration::MAX);
    }

    #[test]
    fn test_model_conclusions_flatten_segments() {
        let stream: Stream = serde_json::from_value(json!({
            "id": "s3",
            "streamStatus": "COMPLETED",
            "streamResult": {"conclusion": "SYNTHETIC", "probability": 0.97, "millisecondsToConclusion": 1840.0},
            "segments": [
                {"modelResults": [{"conclusion": "SYNTHETIC"}, {"conclusion": null}]},
                {"modelResults": null},
                {"modelResults": [{"conclusion": "AUTHENTIC"}]}
            ]
        }))
        .unwrap();

        let segments = stream.segments.as_deref().unwrap();
        assert_eq!(model_conclusions(segments), vec!["SYNTHETIC", "AUTHENTIC"]);
        assert_eq!(
            stream.stream_result.unwrap().milliseconds_to_conclusion,
            Some(1840.0)
        );
    }

    #[test]
    fn test_inconclusive_reason_dedups_in_order() {
        let stream: Stream = serde_json::from_value(json!({
            "id": "s9",
            "streamStatus": "COMPLETED",
            "streamResult": {"conclusion": "INCONCLUSIVE", "probability": 0.5},
            "segments": [
                {"preprocessingResult": {"preprocessingConclusion": "NOISY"}},
                {"preprocessingResult": {"preprocessingConclusion": "NOISY"}},
                {"preprocessingResult": null},
                {"preprocessingResult": {"preprocessingConclusion": "CLIPPED"}}
            ]
        }))
        .unwrap();

        let verdict = verdict_from_stream(&stream).unwrap();
        assert_eq!(verdict.reason, "NOISY, CLIPPED");
        assert_eq!(verdict.stream_id, "s9");
    }

    #[test]
    fn test_conclusive_result_has_empty_reason() {
        let stream: Stream = serde_json::from_value(json!({
            "id": "s1",
            "streamStatus": "COMPLETED",
            "streamResult": {"conclusion": "AUTHENTIC"},
            "segments": [{"preprocessingResult": {"preprocessingConclusion": "NOISY"}}]
        }))
        .unwrap();

        let verdict = verdict_from_stream(&stream).unwrap();
        assert_eq!(verdict.reason, "");
        assert_eq!(verdict.probability, UNKNOWN_PROBABILITY);
    }

    #[test]
    fn test_completed_without_conclusion_is_not_terminal() {
        let stream: Stream = serde_json::from_value(json!({
            "streamStatus": "COMPLETED",
            "streamResult": {"conclusion": null}
        }))
        .unwrap();
        assert!(verdict_from_stream(&stream).is_none());
    }

    #[tokio::test]
    async fn test_completes_after_processing() {
        let source = FakeSource::new(
            Box::new(|n| {
                Ok(Some(if n < 3 {
                    processing()
                } else {
                    completed("SYNTHETIC", 0.97)
                }))
            }),
            never(),
            never(),
        );
        let clock = ManualClock::new();
        let poller = ResultPoller::new(&source, &clock, PollSettings::default());

        let outcome = poller.wait_for_result("file-1", secs(240)).await;

        assert_eq!(outcome.state(), PollState::Complete);
        let verdict = outcome.verdict();
        assert_eq!(verdict.conclusion, "SYNTHETIC");
        assert_eq!(verdict.probability, 0.97);
        assert_eq!(verdict.stream_id, "stream-1");
        assert_eq!(source.calls(StreamQuery::Status), 3);
        assert_eq!(clock.sleeps(), vec![secs(2), secs(2)]);
    }

    #[tokio::test]
    async fn test_query_failures_keep_waiting() {
        let source = FakeSource::new(
            Box::new(|n| match n {
                1 => Err(CliError::GraphQl("rate limited".to_string())),
                2 => Ok(None),
                3 => Ok(Some(json!({"streamStatus": 42}))),
                _ => Ok(Some(completed("AUTHENTIC", 0.1))),
            }),
            never(),
            never(),
        );
        let clock = ManualClock::new();
        let poller = ResultPoller::new(&source, &clock, PollSettings::default());

        let outcome = poller.wait_for_result("file-1", secs(240)).await;
        assert_eq!(outcome.state(), PollState::Complete);
        assert_eq!(source.calls(StreamQuery::Status), 4);
    }

    #[tokio::test]
    async fn test_times_out_after_budget() {
        let source = FakeSource::new(Box::new(|_| Ok(Some(processing()))), never(), never());
        let clock = ManualClock::new();
        let poller = ResultPoller::new(&source, &clock, PollSettings::default());

        let outcome = poller.wait_for_result("file-1", secs(90)).await;

        match &outcome {
            PollOutcome::Timeout { waited } => assert!(*waited > secs(90)),
            other => panic!("expected timeout, got {:?}", other),
        }
        assert!(clock.elapsed() > secs(90));
        assert!(clock.elapsed() <= secs(94));

        let verdict = outcome.verdict();
        assert_eq!(verdict.conclusion, "INCONCLUSIVE");
        assert_eq!(verdict.probability, -1.0);
        assert_eq!(verdict.reason, "TIMEOUT");
        assert_eq!(source.calls(StreamQuery::Snapshot), 0);
    }

    #[tokio::test]
    async fn test_detailed_needs_snapshot() {
        let source = FakeSource::new(never(), never(), Box::new(|_| Ok(Some(json!({"id": "x"})))));
        let clock = ManualClock::new();
        let poller = ResultPoller::new(&source, &clock, PollSettings::default());

        assert!(poller.fetch_detailed("file-1").await.is_none());
        assert_eq!(source.calls(StreamQuery::Details), 0);
    }

    #[tokio::test]
    async fn test_detailed_backoff_until_success() {
        let source = FakeSource::new(
            never(),
            Box::new(|_| Ok(Some(json!({"id": "stream-1", "kind": "basic"})))),
            Box::new(|n| {
                if n < 4 {
                    Err(CliError::GraphQl("field not ready".to_string()))
                } else {
                    Ok(Some(json!({"id": "stream-1", "segments": []})))
                }
            }),
        );
        let clock = ManualClock::new();
        let poller = ResultPoller::new(&source, &clock, PollSettings::default());

        let detailed = poller.fetch_detailed("file-1").await.unwrap();
        assert_eq!(detailed.kind, SnapshotKind::Details);
        assert_eq!(detailed.data["segments"], json!([]));
        assert_eq!(clock.sleeps(), vec![secs(1), secs(2), secs(4)]);
        assert_eq!(source.calls(StreamQuery::Snapshot), 1);
    }

    #[tokio::test]
    async fn test_detailed_falls_back_after_cap() {
        let source = FakeSource::new(
            never(),
            Box::new(|_| Ok(Some(json!({"id": "stream-1", "kind": "basic"})))),
            Box::new(|_| Ok(None)),
        );
        let clock = ManualClock::new();
        let poller = ResultPoller::new(&source, &clock, PollSettings::default());

        let detailed = poller.fetch_detailed("file-1").await.unwrap();
        assert_eq!(detailed.kind, SnapshotKind::Snapshot);
        assert_eq!(detailed.data["kind"], "basic");
        assert_eq!(source.calls(StreamQuery::Details), 100);
        assert_eq!(clock.sleeps().len(), 99);
        assert_eq!(&clock.sleeps()[..4], &[secs(1), secs(2), secs(4), secs(8)]);
    }
}

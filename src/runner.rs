//! Full-history batch replay in an isolated background task.
//!
//! The worker owns a private [`Analyzer`] and replays [`Analyzer::observe`]
//! over the history, so its result is exactly what live ingestion of the same
//! messages would have produced. It talks to the host only through a
//! channel: zero or more `Progress` events, then one `Complete` or one
//! `Error`. The host adopts a result with [`Analyzer::commit`]; until then its
//! live state is untouched.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::analyzer::{Analyzer, ChatMessage};
use crate::config::QualityPolicy;
use crate::error::{Result, ScanError};
use crate::index::NgramIndex;
use crate::merge::AnalysisSnapshot;

/// Progress cadence, in processed messages (user messages included).
pub const PROGRESS_EVERY: usize = 5;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchJob {
    pub messages: Vec<ChatMessage>,
    #[serde(default)]
    pub config: QualityPolicy,
    #[serde(default)]
    pub covered_patterns: Vec<String>,
    /// Drop single-occurrence low-score records at every progress tick.
    /// Bounds memory on very long histories, but a compacted phrase that
    /// shows up again restarts from zero, so the result can differ from live
    /// ingestion.
    #[serde(default)]
    pub compact: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "camelCase")]
pub enum BatchRequest {
    Start(BatchJob),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchProgress {
    pub processed: usize,
    pub total: usize,
    pub ai_analyzed: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchResult {
    pub final_index: NgramIndex,
    pub leaderboard: AnalysisSnapshot,
    pub messages_analyzed: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum BatchEvent {
    Progress(BatchProgress),
    Complete(BatchResult),
    Error { message: String },
}

impl BatchEvent {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, BatchEvent::Progress(_))
    }
}

/// Replay `job.messages` through a fresh analyzer on the current thread.
///
/// `cancel` is checked before every message.
pub fn replay(
    job: BatchJob,
    cancel: &AtomicBool,
    mut on_progress: impl FnMut(BatchProgress),
) -> Result<BatchResult> {
    let BatchJob {
        messages,
        config,
        covered_patterns,
        compact,
    } = job;
    let total = messages.len();
    let mut analyzer = Analyzer::new(config, covered_patterns);
    let mut ai_analyzed = 0;

    for (i, message) in messages.iter().enumerate() {
        if cancel.load(Ordering::Relaxed) {
            return Err(ScanError::Cancelled);
        }
        if analyzer.observe(message).is_some() {
            ai_analyzed += 1;
        }

        let processed = i + 1;
        if processed % PROGRESS_EVERY == 0 {
            if compact {
                analyzer.compact();
            }
            on_progress(BatchProgress {
                processed,
                total,
                ai_analyzed,
            });
        }
    }

    let leaderboard = analyzer.refresh_snapshot().clone();
    Ok(BatchResult {
        final_index: analyzer.into_index(),
        leaderboard,
        messages_analyzed: ai_analyzed,
    })
}

pub struct BatchHandle {
    events: mpsc::UnboundedReceiver<BatchEvent>,
    cancel: Arc<AtomicBool>,
}

impl BatchHandle {
    /// Next event, or `None` once the terminal event has been taken.
    pub async fn next_event(&mut self) -> Option<BatchEvent> {
        self.events.recv().await
    }

    /// Stop the replay before its next message. No `Complete` will follow.
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::Relaxed);
    }

    /// Drain events until the terminal one, reporting progress along the way.
    pub async fn finish(mut self, mut on_progress: impl FnMut(BatchProgress)) -> Result<BatchResult> {
        while let Some(event) = self.events.recv().await {
            match event {
                BatchEvent::Progress(progress) => on_progress(progress),
                BatchEvent::Complete(result) => return Ok(result),
                BatchEvent::Error { message } => {
                    if self.cancel.load(Ordering::Relaxed) {
                        return Err(ScanError::Cancelled);
                    }
                    return Err(ScanError::WorkerFailed(message));
                }
            }
        }
        Err(ScanError::WorkerFailed(
            "worker exited without a result".to_string(),
        ))
    }
}

/// Start a batch replay on the blocking pool. Must be called inside a tokio
/// runtime.
pub fn spawn_batch(job: BatchJob) -> BatchHandle {
    info!(messages = job.messages.len(), "starting batch analysis");
    spawn_worker(move |cancel, on_progress| replay(job, cancel, on_progress))
}

/// Run `work` on the blocking pool and turn its outcome into events. Exactly
/// one terminal event is sent, also when `work` panics.
fn spawn_worker<F>(work: F) -> BatchHandle
where
    F: FnOnce(&AtomicBool, &mut dyn FnMut(BatchProgress)) -> Result<BatchResult> + Send + 'static,
{
    let (tx, rx) = mpsc::unbounded_channel();
    let cancel = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&cancel);

    tokio::spawn(async move {
        let progress_tx = tx.clone();
        let blocking = tokio::task::spawn_blocking(move || {
            let mut report = |progress: BatchProgress| {
                debug!(processed = progress.processed, total = progress.total, "batch progress");
                if progress_tx.send(BatchEvent::Progress(progress)).is_err() {
                    // nobody is listening any more
                    flag.store(true, Ordering::Relaxed);
                }
            };
            work(&*flag, &mut report)
        });

        let terminal = match blocking.await {
            Ok(Ok(result)) => {
                info!(
                    analyzed = result.messages_analyzed,
                    records = result.final_index.len(),
                    "batch analysis complete"
                );
                BatchEvent::Complete(result)
            }
            Ok(Err(e)) => {
                warn!(error = %e, "batch analysis stopped");
                BatchEvent::Error {
                    message: e.to_string(),
                }
            }
            Err(e) => {
                let err = ScanError::WorkerFailed(e.to_string());
                warn!(error = %err, "batch worker crashed");
                BatchEvent::Error {
                    message: err.to_string(),
                }
            }
        };
        if tx.send(terminal).is_err() {
            debug!("batch result dropped, receiver gone");
        }
    });

    BatchHandle { events: rx, cancel }
}

/// Dispatch a protocol request.
pub fn handle_request(request: BatchRequest) -> BatchHandle {
    match request {
        BatchRequest::Start(job) => spawn_batch(job),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_cadence_counts_all_messages() {
        let mut messages = Vec::new();
        for i in 0..12 {
            if i % 2 == 0 {
                messages.push(ChatMessage::user("hello there friend"));
            } else {
                messages.push(ChatMessage::assistant("The crimson zephyr howled."));
            }
        }
        let job = BatchJob {
            messages,
            ..BatchJob::default()
        };
        let mut ticks = Vec::new();
        let result = replay(job, &AtomicBool::new(false), |p| ticks.push(p)).unwrap();
        assert_eq!(
            ticks,
            vec![
                BatchProgress { processed: 5, total: 12, ai_analyzed: 2 },
                BatchProgress { processed: 10, total: 12, ai_analyzed: 5 },
            ]
        );
        assert_eq!(result.messages_analyzed, 6);
        assert_eq!(result.final_index.messages_processed(), 6);
    }

    #[tokio::test]
    async fn panicking_worker_sends_one_error() {
        let mut handle = spawn_worker(|_, report| {
            report(BatchProgress {
                processed: 5,
                total: 10,
                ai_analyzed: 5,
            });
            panic!("replay blew up");
        });
        let mut events = Vec::new();
        while let Some(event) = handle.next_event().await {
            events.push(event);
        }
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], BatchEvent::Progress(_)));
        assert_eq!(events.iter().filter(|e| e.is_terminal()).count(), 1);
        match &events[1] {
            BatchEvent::Error { message } => assert!(message.starts_with("batch worker failed")),
            other => panic!("expected an error event, got {other:?}"),
        }

        let err = spawn_worker(|_, _| panic!("replay blew up again"))
            .finish(|_| {})
            .await
            .unwrap_err();
        assert!(matches!(err, ScanError::WorkerFailed(_)));
    }

    #[test]
    fn cancelled_replay_returns_error() {
        let job = BatchJob {
            messages: vec![ChatMessage::assistant("The crimson zephyr howled.")],
            ..BatchJob::default()
        };
        let err = replay(job, &AtomicBool::new(true), |_| {}).unwrap_err();
        assert!(matches!(err, ScanError::Cancelled));
    }

    #[test]
    fn request_json_shape() {
        let raw = r#"{
            "command": "start",
            "messages": [{"author": "assistant", "text": "Hi."}],
            "config": {"ngramMax": 5},
            "coveredPatterns": ["foo"]
        }"#;
        let request: BatchRequest = serde_json::from_str(raw).unwrap();
        let BatchRequest::Start(job) = request;
        assert_eq!(job.messages.len(), 1);
        assert_eq!(job.config.ngram_max, 5);
        assert_eq!(job.covered_patterns, vec!["foo".to_string()]);
        assert!(!job.compact);
    }

    #[test]
    fn event_json_shape() {
        let progress = serde_json::to_value(BatchEvent::Progress(BatchProgress {
            processed: 5,
            total: 9,
            ai_analyzed: 3,
        }))
        .unwrap();
        assert_eq!(progress["type"], "progress");
        assert_eq!(progress["aiAnalyzed"], 3);

        let error = serde_json::to_value(BatchEvent::Error {
            message: "boom".into(),
        })
        .unwrap();
        assert_eq!(error["type"], "error");
        assert_eq!(error["message"], "boom");
    }
}

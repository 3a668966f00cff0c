use slop_scan::runner::{self, BatchJob, BatchProgress};
use slop_scan::{Analyzer, BatchEvent, BatchRequest, ChatMessage, QualityPolicy, ScanError};

fn history() -> Vec<ChatMessage> {
    let lines = [
        "A shiver ran down her spine as the door creaked open.",
        "Her eyes sparkled with mischief. 'You came back,' she whispered.",
        "The candlelight flickered against the cold stone walls.",
        "A shiver ran down his spine. He swallowed hard.",
        "Her eyes sparkle with mischief whenever she lies.",
        "```\nignored code\n``` The air smelled of ozone and rain.",
        "<memo>hidden</memo> Somewhere, a dog barked twice.",
        "A shiver runs down her spine, sharp and sudden.",
        "'Barely above a whisper,' she said, her voice barely above a whisper.",
        "The candlelight flickered as the wind rose.",
    ];
    let mut messages = Vec::new();
    for round in 0..4 {
        for (i, line) in lines.iter().enumerate() {
            if (i + round) % 3 == 0 {
                messages.push(ChatMessage::user(format!("ok, round {round}")));
            }
            messages.push(ChatMessage::assistant(*line));
        }
    }
    messages.push(ChatMessage::assistant(""));
    messages
}

fn policy() -> QualityPolicy {
    QualityPolicy {
        pruning_cycle: 6,
        blacklist: [("shiver".to_string(), 2.0)].into_iter().collect(),
        ..QualityPolicy::default()
    }
}

#[tokio::test]
async fn batch_matches_incremental_replay() {
    let messages = history();
    let covered = vec![r"\bsmelled of ozone\b".to_string(), "(broken".to_string()];

    let mut live = Analyzer::new(policy(), covered.clone());
    for message in &messages {
        live.observe(message);
    }
    live.refresh_snapshot();

    let job = BatchJob {
        messages: messages.clone(),
        config: policy(),
        covered_patterns: covered,
        compact: false,
    };
    let result = runner::spawn_batch(job).finish(|_| {}).await.unwrap();

    assert_eq!(live.index(), &result.final_index);
    assert_eq!(live.snapshot(), &result.leaderboard);
    assert_eq!(result.messages_analyzed, 40);
    for (key, record) in live.index().records() {
        let other = result.final_index.get(key).unwrap();
        assert_eq!(record.count, other.count);
        assert_eq!(record.score, other.score);
        assert_eq!(record.last_seen, other.last_seen);
    }
}

#[tokio::test]
async fn start_request_runs_a_replay() {
    let raw = serde_json::json!({
        "command": "start",
        "messages": history(),
        "config": {"pruningCycle": 6, "blacklist": {"shiver": 2}, "slopThreshold": null},
        "coveredPatterns": []
    });
    let request: BatchRequest = serde_json::from_value(raw).unwrap();
    let result = runner::handle_request(request)
        .finish(|_| {})
        .await
        .unwrap();

    let mut live = Analyzer::new(policy(), vec![]);
    for message in &history() {
        live.observe(message);
    }
    assert_eq!(live.index(), &result.final_index);
    assert_eq!(result.messages_analyzed, 40);
}

#[tokio::test]
async fn emits_progress_then_one_terminal_event() {
    let messages = history();
    let total = messages.len();
    let mut handle = runner::spawn_batch(BatchJob {
        messages,
        ..BatchJob::default()
    });

    let mut events = Vec::new();
    while let Some(event) = handle.next_event().await {
        events.push(event);
    }

    let terminal: Vec<&BatchEvent> = events.iter().filter(|e| e.is_terminal()).collect();
    assert_eq!(terminal.len(), 1);
    assert!(matches!(events.last(), Some(BatchEvent::Complete(_))));

    let progress: Vec<BatchProgress> = events
        .iter()
        .filter_map(|e| match e {
            BatchEvent::Progress(p) => Some(*p),
            _ => None,
        })
        .collect();
    assert_eq!(progress.len(), total / runner::PROGRESS_EVERY);
    assert!(progress.iter().all(|p| p.processed % runner::PROGRESS_EVERY == 0));
    assert!(progress.iter().all(|p| p.total == total));
}

#[tokio::test]
async fn cancelled_batch_leaves_live_state_alone() {
    let mut live = Analyzer::new(policy(), vec![]);
    live.observe(&ChatMessage::assistant("Crimson zephyr howled."));
    live.refresh_snapshot();
    let before = live.index().clone();

    let handle = runner::spawn_batch(BatchJob {
        messages: history(),
        config: policy(),
        ..BatchJob::default()
    });
    // current-thread runtime: the worker has not started yet
    handle.cancel();
    match handle.finish(|_| {}).await {
        Err(ScanError::Cancelled) => {}
        other => panic!("expected cancellation, got {other:?}"),
    }

    assert_eq!(live.index(), &before);
}

#[tokio::test]
async fn commit_replaces_live_state() {
    let mut live = Analyzer::new(policy(), vec![]);
    live.observe(&ChatMessage::assistant("Crimson zephyr howled."));

    let result = runner::spawn_batch(BatchJob {
        messages: history(),
        config: policy(),
        ..BatchJob::default()
    })
    .finish(|_| {})
    .await
    .unwrap();
    let expected = result.final_index.clone();
    live.commit(result);

    assert_eq!(live.index(), &expected);
    assert!(live.index().get("crimson zephyr howled").is_none());
}

#[tokio::test]
async fn compaction_drops_single_weak_records() {
    let result = runner::spawn_batch(BatchJob {
        messages: history(),
        config: policy(),
        compact: true,
        ..BatchJob::default()
    })
    .finish(|_| {})
    .await
    .unwrap();
    // 55 messages: the final tick lands on the last one
    assert!(result
        .final_index
        .records()
        .all(|(_, r)| r.score >= 2.0 || r.count >= 2));
}

#[tokio::test]
async fn complete_event_json_shape() {
    let result = runner::spawn_batch(BatchJob {
        messages: history(),
        ..BatchJob::default()
    })
    .finish(|_| {})
    .await
    .unwrap();
    let json = serde_json::to_value(BatchEvent::Complete(result)).unwrap();
    assert_eq!(json["type"], "complete");
    assert_eq!(json["messagesAnalyzed"], 40);
    assert!(json["finalIndex"]["records"].is_object());
    assert!(json["leaderboard"]["merged"].is_object());
    assert!(json["leaderboard"]["remaining"].is_object());

    let back: BatchEvent = serde_json::from_value(json).unwrap();
    assert!(back.is_terminal());
}

#[test]
fn error_event_parses() {
    let json = r#"{"type": "error", "message": "worker crashed"}"#;
    let event: BatchEvent = serde_json::from_str(json).unwrap();
    assert!(event.is_terminal());
    assert_eq!(
        event,
        BatchEvent::Error {
            message: "worker crashed".into()
        }
    );
}

//! End-to-end tests for the watch coordinator.
//!
//! The status query is a scripted in-memory source; socket peers are
//! real local servers driven by `tokio-tungstenite`.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use assert_matches::assert_matches;
use futures::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;
use wiro_api::{ApiError, TaskDetailSource};
use wiro_core::types::{Task, TaskDetailResponse};
use wiro_core::watch_event::{EventSource, WatchEvent};
use wiro_watch::{watch_task, WatchConfig, WatchError};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

enum Reply {
    Status(&'static str),
    Empty,
    Fail,
}

/// Status source answering from a script, then repeating `fallback`.
struct ScriptedSource {
    script: Mutex<VecDeque<Reply>>,
    fallback: &'static str,
    calls: AtomicUsize,
}

impl ScriptedSource {
    fn new(script: Vec<Reply>, fallback: &'static str) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            fallback,
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

fn response(status: &str) -> TaskDetailResponse {
    TaskDetailResponse {
        result: true,
        total: "1".into(),
        task_list: vec![Task {
            id: "534574".into(),
            status: status.into(),
            ..Default::default()
        }],
        ..Default::default()
    }
}

impl TaskDetailSource for ScriptedSource {
    async fn fetch_task_detail(&self, id_or_token: &str) -> Result<TaskDetailResponse, ApiError> {
        assert_eq!(id_or_token, "tok-1");
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self.script.lock().unwrap().pop_front();
        match next.unwrap_or(Reply::Status(self.fallback)) {
            Reply::Status(status) => Ok(response(status)),
            Reply::Empty => Ok(TaskDetailResponse {
                result: true,
                ..Default::default()
            }),
            Reply::Fail => Err(ApiError::Remote {
                operation: "task detail",
                message: "backend unavailable".into(),
            }),
        }
    }
}

fn config(ws_url: &str, poll_ms: u64) -> WatchConfig {
    WatchConfig {
        ws_url: ws_url.to_string(),
        poll_interval: Duration::from_millis(poll_ms),
    }
}

/// A ws:// URL nothing is listening on.
async fn refused_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("ws://{}/v1", listener.local_addr().unwrap());
    drop(listener);
    url
}

/// Accept one socket, check the subscription, send `messages`, then
/// idle until the client leaves.
async fn socket_server(messages: Vec<Message>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("ws://{}/v1", listener.local_addr().unwrap());

    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let Ok(mut ws) = tokio_tungstenite::accept_async(stream).await else {
            return;
        };

        match ws.next().await {
            Some(Ok(Message::Text(text))) => {
                let sub: serde_json::Value = serde_json::from_str(&text).unwrap();
                assert_eq!(sub["type"], "task_info");
                assert_eq!(sub["tasktoken"], "tok-1");
            }
            // The watch may finish before the socket subscribes.
            _ => return,
        }

        for message in messages {
            if ws.send(message).await.is_err() {
                return;
            }
        }
        while let Some(Ok(_)) = ws.next().await {}
    });

    url
}

fn text(value: serde_json::Value) -> Message {
    Message::Text(value.to_string())
}

async fn run_watch(
    source: Arc<ScriptedSource>,
    token: &str,
    config: WatchConfig,
    cancel: CancellationToken,
) -> (Result<Task, WatchError>, Vec<WatchEvent>) {
    let mut events = Vec::new();
    let result = tokio::time::timeout(
        Duration::from_secs(10),
        watch_task(source, token, &config, &cancel, |ev| events.push(ev)),
    )
    .await
    .expect("watch should finish");
    (result, events)
}

// ---------------------------------------------------------------------------
// Test: empty token is rejected up front
// ---------------------------------------------------------------------------

#[tokio::test]
async fn empty_token_is_missing_token() {
    let source = ScriptedSource::new(vec![], "task_start");
    let (result, events) = run_watch(
        Arc::clone(&source),
        "   ",
        config("ws://127.0.0.1:1", 10),
        CancellationToken::new(),
    )
    .await;

    assert_matches!(result, Err(WatchError::MissingToken));
    assert!(events.is_empty());
    assert_eq!(source.calls(), 0);
}

// ---------------------------------------------------------------------------
// Test: refused socket falls back to polling
// ---------------------------------------------------------------------------

#[tokio::test]
async fn refused_socket_still_completes_via_polling() {
    let source = ScriptedSource::new(
        vec![
            Reply::Status("task_start"),
            Reply::Empty,
            Reply::Status("task_output"),
        ],
        "task_postprocess_end",
    );
    let url = refused_url().await;

    let (result, events) =
        run_watch(Arc::clone(&source), "tok-1", config(&url, 20), CancellationToken::new()).await;

    let task = result.unwrap();
    assert_eq!(task.status, "task_postprocess_end");

    let warnings: Vec<_> = events.iter().filter(|e| e.is_warning()).collect();
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].text.contains("polling fallback active"));

    let polled: Vec<_> = events
        .iter()
        .filter(|e| e.source == EventSource::Poll)
        .map(|e| e.kind.as_str())
        .collect();
    assert_eq!(polled, ["task_start", "task_output", "task_postprocess_end"]);
    assert!(events
        .iter()
        .filter(|e| e.source == EventSource::Poll)
        .all(|e| e.text == "polled status" && e.raw["status"] == e.kind.as_str()));
    assert_eq!(Arc::strong_count(&source), 1);
}

// ---------------------------------------------------------------------------
// Test: both producers see the terminal state, one task comes back
// ---------------------------------------------------------------------------

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_terminal_detection_delivers_once() {
    for _ in 0..10 {
        let source = ScriptedSource::new(vec![], "task_postprocess_end");
        let url = socket_server(vec![text(
            serde_json::json!({"type": "task_postprocess_end", "message": "done"}),
        )])
        .await;

        let (result, events) =
            run_watch(Arc::clone(&source), "tok-1", config(&url, 1), CancellationToken::new())
                .await;

        let task = result.unwrap();
        assert_eq!(task.id, "534574");
        assert!(events.iter().all(|e| !e.is_warning()));
        assert_eq!(Arc::strong_count(&source), 1);
    }
}

// ---------------------------------------------------------------------------
// Test: stream path delivers, pings stay invisible
// ---------------------------------------------------------------------------

#[tokio::test]
async fn stream_delivers_and_hides_pings() {
    let source = ScriptedSource::new(vec![], "task_postprocess_end");
    let url = socket_server(vec![
        Message::Ping(b"hb".to_vec()),
        text(serde_json::json!({"type": "task_start"})),
        Message::Ping(b"hb".to_vec()),
        text(serde_json::json!({"type": "task_output", "message": "step 1/4"})),
        Message::Text("not json at all".into()),
        text(serde_json::json!({"type": "task_postprocess_end"})),
    ])
    .await;

    let (result, events) = run_watch(
        Arc::clone(&source),
        "tok-1",
        config(&url, 60_000),
        CancellationToken::new(),
    )
    .await;

    assert_eq!(result.unwrap().status, "task_postprocess_end");
    let kinds: Vec<_> = events
        .iter()
        .map(|e| (e.source, e.kind.as_str()))
        .collect();
    assert_eq!(
        kinds,
        [
            (EventSource::Stream, "task_start"),
            (EventSource::Stream, "task_output"),
            (EventSource::Stream, "task_postprocess_end"),
        ]
    );
    assert_eq!(events[1].text, r#""step 1/4""#);
    // Only the authoritative fetch after the terminal message.
    assert_eq!(source.calls(), 1);
}

// ---------------------------------------------------------------------------
// Test: failed authoritative fetch keeps the watch alive
// ---------------------------------------------------------------------------

#[tokio::test]
async fn failed_terminal_fetch_keeps_waiting() {
    let source = ScriptedSource::new(vec![Reply::Fail], "task_end");
    let url = socket_server(vec![text(serde_json::json!({"type": "task_end"}))]).await;

    let (result, events) =
        run_watch(Arc::clone(&source), "tok-1", config(&url, 200), CancellationToken::new())
            .await;

    assert_eq!(result.unwrap().status, "task_end");
    assert!(events
        .iter()
        .any(|e| e.is_warning() && e.text.contains("backend unavailable")));
    assert!(source.calls() >= 2);
}

// ---------------------------------------------------------------------------
// Test: server close is a warning, polling finishes the job
// ---------------------------------------------------------------------------

#[tokio::test]
async fn server_close_falls_back_to_polling() {
    let source = ScriptedSource::new(vec![Reply::Status("task_start")], "task_cancel");
    let url = socket_server(vec![Message::Close(None)]).await;

    let (result, events) =
        run_watch(Arc::clone(&source), "tok-1", config(&url, 50), CancellationToken::new()).await;

    assert_eq!(result.unwrap().status, "task_cancel");
    assert!(events
        .iter()
        .any(|e| e.is_warning() && e.text.contains("websocket read failed")));
}

// ---------------------------------------------------------------------------
// Test: cancellation while both producers are idle
// ---------------------------------------------------------------------------

#[tokio::test]
async fn cancellation_returns_promptly_and_joins_producers() {
    let source = ScriptedSource::new(vec![], "task_start");
    // Socket subscribes and then stays silent.
    let url = socket_server(vec![]).await;

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        trigger.cancel();
    });

    let started = tokio::time::Instant::now();
    let (result, events) =
        run_watch(Arc::clone(&source), "tok-1", config(&url, 60_000), cancel).await;

    assert_matches!(result, Err(WatchError::Cancelled));
    assert!(started.elapsed() < Duration::from_secs(5));
    assert!(events.is_empty());
    assert_eq!(source.calls(), 0);
    // Both producers dropped their handle on the source.
    assert_eq!(Arc::strong_count(&source), 1);
}

#[tokio::test]
async fn non_terminal_statuses_never_finish_the_watch() {
    let source = ScriptedSource::new(vec![], "task_output");
    let url = refused_url().await;

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(200)).await;
        trigger.cancel();
    });

    let (result, events) = run_watch(Arc::clone(&source), "tok-1", config(&url, 10), cancel).await;

    assert_matches!(result, Err(WatchError::Cancelled));
    assert!(events
        .iter()
        .any(|e| e.source == EventSource::Poll && e.kind == "task_output"));
}

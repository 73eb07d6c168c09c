//! The watch loop: spawn both producers, forward their events, return
//! the first delivered task.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use wiro_api::TaskDetailSource;
use wiro_core::types::Task;
use wiro_core::watch_event::WatchEvent;

use crate::config::WatchConfig;
use crate::error::WatchError;
use crate::gate::DeliveryGate;
use crate::producer::ProducerContext;
use crate::{poller, stream};

/// Events buffered between a producer and the observer.
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Advisory errors buffered before producers start dropping them. Must
/// hold at least one per producer.
const ERROR_CHANNEL_CAPACITY: usize = 8;

/// Watch the task identified by `token` until a terminal record is
/// delivered or `cancel` fires.
///
/// The stream and poll producers run as separate tasks. Every event they
/// emit is passed to `on_event` on the caller's task, in per-producer
/// order. Advisory errors (socket unavailable, failed status query)
/// arrive as `system/warning` events and never end the watch.
///
/// There is no internal deadline: if both producers give up without a
/// terminal status, this keeps waiting until `cancel` fires. Both
/// producers are stopped and joined before returning.
pub async fn watch_task<S, F>(
    source: Arc<S>,
    token: &str,
    config: &WatchConfig,
    cancel: &CancellationToken,
    mut on_event: F,
) -> Result<Task, WatchError>
where
    S: TaskDetailSource + 'static,
    F: FnMut(WatchEvent),
{
    let token = token.trim();
    if token.is_empty() {
        return Err(WatchError::MissingToken);
    }

    let (gate, mut result_rx) = DeliveryGate::new();
    // Held here so the result channel stays open even after both
    // producers have exited.
    let gate = Arc::new(gate);
    let (event_tx, mut event_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
    let (error_tx, mut error_rx) = mpsc::channel(ERROR_CHANNEL_CAPACITY);
    let producer_cancel = cancel.child_token();

    let ctx = ProducerContext {
        source,
        token: token.to_string(),
        events: event_tx,
        errors: error_tx,
        gate: Arc::clone(&gate),
        cancel: producer_cancel.clone(),
    };

    tracing::info!(
        task_token = %token,
        ws_url = %config.ws_url,
        poll_interval_ms = config.poll_interval.as_millis() as u64,
        "Watching task",
    );

    let stream_handle = tokio::spawn(stream::run(ctx.clone(), config.ws_url.clone()));
    let poll_handle = tokio::spawn(poller::run(ctx, config.poll_interval));

    let outcome = loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::info!(task_token = %token, "Watch cancelled");
                break Err(WatchError::Cancelled);
            }
            Some(event) = event_rx.recv() => on_event(event),
            Some(err) = error_rx.recv() => on_event(WatchEvent::warning(err.to_string())),
            Ok(task) = &mut result_rx => break Ok(task),
        }
    };

    // Events a producer emitted before delivering still belong to this watch.
    if outcome.is_ok() {
        while let Ok(event) = event_rx.try_recv() {
            on_event(event);
        }
    }

    producer_cancel.cancel();
    drop(event_rx);
    drop(error_rx);
    for (name, handle) in [("stream", stream_handle), ("poll", poll_handle)] {
        if let Err(e) = handle.await {
            tracing::warn!(task_token = %token, producer = name, error = %e, "Producer task failed");
        }
    }
    drop(gate);

    outcome
}

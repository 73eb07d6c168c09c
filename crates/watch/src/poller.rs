//! Polling fallback: query the task status on a fixed interval.

use std::time::Duration;

use tokio::time::{interval_at, Instant, MissedTickBehavior};
use wiro_api::TaskDetailSource;
use wiro_core::task_status::is_terminal;
use wiro_core::watch_event::{EventSource, WatchEvent};

use crate::producer::ProducerContext;

const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Run until a terminal status is seen or the watch is cancelled.
/// Query errors are reported and the loop keeps going.
pub(crate) async fn run<S: TaskDetailSource>(ctx: ProducerContext<S>, interval: Duration) {
    let interval = interval.max(MIN_INTERVAL);
    let mut ticker = interval_at(Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut tick = 0u64;

    loop {
        tokio::select! {
            _ = ctx.cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }
        tick += 1;

        let rows = match ctx.fetch().await {
            None => break,
            Some(Ok(rows)) => rows,
            Some(Err(e)) => {
                ctx.report(e);
                continue;
            }
        };

        let Some(task) = rows.into_iter().next() else {
            tracing::debug!(task_token = %ctx.token, tick, "Poll returned no rows");
            continue;
        };

        tracing::debug!(task_token = %ctx.token, tick, status = %task.status, "Polled task status");

        let event = WatchEvent::new(EventSource::Poll, task.status.clone())
            .with_text("polled status")
            .with_raw(serde_json::json!({ "status": task.status }));
        if !ctx.emit(event).await {
            break;
        }

        if is_terminal(&task.status) {
            tracing::info!(task_token = %ctx.token, status = %task.status, "Terminal status polled");
            ctx.deliver(task, "poll");
            break;
        }
    }

    tracing::debug!(task_token = %ctx.token, "Poll producer stopped");
}

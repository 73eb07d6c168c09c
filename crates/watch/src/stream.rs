//! Push producer: subscribe on the task socket and follow its messages.

use std::time::Duration;

use wiro_api::TaskDetailSource;
use wiro_core::task_status::is_terminal;
use wiro_core::watch_event::{EventSource, WatchEvent};
use wiro_ws::{Session, WsError};

use crate::error::WatchError;
use crate::producer::ProducerContext;

/// Subscribe message type understood by the socket service.
const SUBSCRIBE_TYPE: &str = "task_info";

/// Longest wait for a graceful socket shutdown before dropping it.
const CLOSE_TIMEOUT: Duration = Duration::from_secs(1);

/// Run until a terminal message is confirmed, the socket fails, or the
/// watch is cancelled. Never retries: polling covers for a dead socket.
pub(crate) async fn run<S: TaskDetailSource>(ctx: ProducerContext<S>, ws_url: String) {
    let mut session = match wiro_ws::connect(&ws_url, &ctx.cancel).await {
        Ok(session) => session,
        Err(WsError::Cancelled) => return,
        Err(e) => {
            ctx.report(WatchError::Connect(e));
            return;
        }
    };

    tracing::debug!(task_token = %ctx.token, url = %ws_url, "Socket connected");

    let subscribe = serde_json::json!({ "type": SUBSCRIBE_TYPE, "tasktoken": ctx.token });
    let sent = tokio::select! {
        _ = ctx.cancel.cancelled() => None,
        sent = session.send_json(&subscribe) => Some(sent),
    };
    match sent {
        Some(Ok(())) => follow(&ctx, &mut session).await,
        Some(Err(e)) => ctx.report(WatchError::Subscribe(e)),
        None => {}
    }

    close_session(&mut session, CLOSE_TIMEOUT).await;
    tracing::debug!(task_token = %ctx.token, "Stream producer stopped");
}

/// Close `session`, dropping the socket if the peer does not let the
/// shutdown finish within `limit`.
async fn close_session(session: &mut Session, limit: Duration) {
    if tokio::time::timeout(limit, session.close()).await.is_err() {
        tracing::debug!(
            timeout_ms = limit.as_millis() as u64,
            "Socket close timed out, dropping connection"
        );
    }
}

async fn follow<S: TaskDetailSource>(ctx: &ProducerContext<S>, session: &mut Session) {
    loop {
        let received = tokio::select! {
            _ = ctx.cancel.cancelled() => return,
            received = session.receive_text() => received,
        };

        let payload = match received {
            Ok(payload) => payload,
            Err(e) => {
                ctx.report(WatchError::StreamRead(e));
                return;
            }
        };

        let Some(event) = parse_message(&payload) else {
            tracing::debug!(task_token = %ctx.token, len = payload.len(), "Skipping malformed socket message");
            continue;
        };

        let kind = event.kind.clone();
        if !ctx.emit(event).await {
            return;
        }

        if !is_terminal(&kind) {
            continue;
        }

        tracing::info!(task_token = %ctx.token, status = %kind, "Terminal message received");
        match ctx.fetch().await {
            None => return,
            Some(Ok(rows)) => match rows.into_iter().next() {
                Some(task) => {
                    ctx.deliver(task, "stream");
                    return;
                }
                None => {
                    tracing::debug!(task_token = %ctx.token, "Terminal fetch returned no rows");
                }
            },
            // Keep listening; the poller or a later message may still finish the watch.
            Some(Err(e)) => ctx.report(e),
        }
    }
}

/// Turn one socket message into a stream event. Anything that is not a
/// JSON object is rejected.
fn parse_message(payload: &[u8]) -> Option<WatchEvent> {
    let value: serde_json::Value = serde_json::from_slice(payload).ok()?;
    let object = value.as_object()?;

    let kind = object
        .get("type")
        .and_then(|t| t.as_str())
        .unwrap_or_default()
        .to_string();
    let text = object
        .get("message")
        .map(|m| m.to_string())
        .unwrap_or_default();

    Some(
        WatchEvent::new(EventSource::Stream, kind)
            .with_text(text)
            .with_raw(value),
    )
}

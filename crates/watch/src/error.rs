use wiro_api::ApiError;
use wiro_ws::WsError;

/// Errors produced while watching a task.
///
/// Only [`MissingToken`](Self::MissingToken) and
/// [`Cancelled`](Self::Cancelled) are ever returned from
/// [`watch_task`](crate::watch_task). The other variants are advisory:
/// producers report them and the coordinator turns them into
/// `system/warning` events.
#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    #[error("task token is required for watch")]
    MissingToken,

    #[error("watch cancelled")]
    Cancelled,

    #[error("websocket connect failed (polling fallback active): {0}")]
    Connect(#[source] WsError),

    #[error("websocket subscribe failed (polling fallback active): {0}")]
    Subscribe(#[source] WsError),

    #[error("websocket read failed (polling fallback active): {0}")]
    StreamRead(#[source] WsError),

    #[error("task status query failed: {0}")]
    Query(#[from] ApiError),
}

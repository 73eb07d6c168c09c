use std::time::Duration;

/// Default socket endpoint.
pub const DEFAULT_WS_URL: &str = "wss://socket.wiro.ai/v1";

/// Default polling fallback interval.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Tunables for a single watch.
///
/// Carries no deadline. The caller bounds the watch through the
/// cancellation token it passes to [`watch_task`](crate::watch_task).
#[derive(Debug, Clone)]
pub struct WatchConfig {
    /// `ws://` or `wss://` endpoint the stream producer subscribes on.
    pub ws_url: String,
    /// Delay between status queries. The first query happens one
    /// interval after the watch starts.
    pub poll_interval: Duration,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            ws_url: DEFAULT_WS_URL.to_string(),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

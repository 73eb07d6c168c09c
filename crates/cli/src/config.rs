use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use wiro_api::client::DEFAULT_API_URL;
use wiro_watch::config::{DEFAULT_POLL_INTERVAL, DEFAULT_WS_URL};
use wiro_watch::WatchConfig;

/// Command-line configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub api_url: String,
    pub ws_url: String,
    pub poll_interval: Duration,
    /// Deadline for one watch; the engine itself has none.
    pub watch_timeout: Duration,
    pub http_timeout: Duration,
    pub output_dir: PathBuf,
}

impl CliConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                   | Default                   |
    /// |---------------------------|---------------------------|
    /// | `WIRO_API_URL`            | `https://api.wiro.ai/v1`  |
    /// | `WIRO_WS_URL`             | `wss://socket.wiro.ai/v1` |
    /// | `WIRO_POLL_INTERVAL_SECS` | `5`                       |
    /// | `WIRO_WATCH_TIMEOUT_SECS` | `1200`                    |
    /// | `WIRO_HTTP_TIMEOUT_SECS`  | `45`                      |
    /// | `WIRO_OUTPUT_DIR`         | `./wiro-outputs`          |
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let var = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let secs = |name: &str, default: u64| -> anyhow::Result<Duration> {
            let secs = match var(name) {
                Some(raw) => raw
                    .parse::<u64>()
                    .with_context(|| format!("{name} must be a whole number of seconds, got {raw:?}"))?,
                None => default,
            };
            anyhow::ensure!(secs > 0, "{name} must be greater than zero");
            Ok(Duration::from_secs(secs))
        };

        Ok(Self {
            api_url: var("WIRO_API_URL").unwrap_or_else(|| DEFAULT_API_URL.into()),
            ws_url: var("WIRO_WS_URL").unwrap_or_else(|| DEFAULT_WS_URL.into()),
            poll_interval: secs("WIRO_POLL_INTERVAL_SECS", DEFAULT_POLL_INTERVAL.as_secs())?,
            watch_timeout: secs("WIRO_WATCH_TIMEOUT_SECS", 1200)?,
            http_timeout: secs("WIRO_HTTP_TIMEOUT_SECS", 45)?,
            output_dir: var("WIRO_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("./wiro-outputs")),
        })
    }

    pub fn watch_config(&self) -> WatchConfig {
        WatchConfig {
            ws_url: self.ws_url.clone(),
            poll_interval: self.poll_interval,
        }
    }
}

//! Task progress watcher.
//!
//! Races a WebSocket push stream against interval polling and returns
//! the first terminal task record either of them confirms. Progress is
//! reported through a caller-supplied observer as [`WatchEvent`]s.
//!
//! [`WatchEvent`]: wiro_core::watch_event::WatchEvent

pub mod config;
pub mod coordinator;
pub mod error;
pub mod gate;
mod poller;
mod producer;
mod stream;

pub use config::WatchConfig;
pub use coordinator::watch_task;
pub use error::WatchError;

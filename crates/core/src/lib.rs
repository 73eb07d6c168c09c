//! Shared domain types for the Wiro task client.
//!
//! Task records and response envelopes as returned by the Wiro API,
//! model catalogue and project records, terminal-status classification,
//! watch events, request signing and command-line input parsing helpers.

pub mod catalog;
pub mod error;
pub mod inputs;
pub mod signature;
pub mod task_status;
pub mod types;
pub mod watch_event;

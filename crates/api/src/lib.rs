//! HTTP client for the Wiro task API.
//!
//! Wraps task submission, detail, cancel and kill calls, model search
//! and inspection, and project listing using [`reqwest`], resolves auth
//! headers from the environment, downloads task outputs, and exposes
//! the [`TaskDetailSource`] seam the watch engine polls through.

pub mod auth;
pub mod catalog;
pub mod client;
pub mod download;
pub mod error;
pub mod source;

pub use client::{RunInput, WiroApi};
pub use error::ApiError;
pub use source::TaskDetailSource;

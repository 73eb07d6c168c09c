use std::path::PathBuf;

/// Errors from the Wiro HTTP API layer.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The service returned a 4xx/5xx status.
    #[error("Wiro API error ({status}): {body}")]
    Status {
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// The body was not the JSON shape we expected.
    #[error("Failed to decode response: {source}; body={body}")]
    Decode {
        #[source]
        source: serde_json::Error,
        body: String,
    },

    /// The envelope came back with `result: false`.
    #[error("{operation} failed: {message}")]
    Remote {
        operation: &'static str,
        message: String,
    },

    /// The query succeeded but matched nothing.
    #[error("{0}")]
    NotFound(String),

    /// A server-supplied task id cannot be used as a directory name.
    #[error("task id {0:?} is not a plain directory name")]
    InvalidTaskId(String),

    /// Reading an input file or writing a download failed.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// No usable credentials were configured.
    #[error("Authentication error: {0}")]
    Auth(String),
}

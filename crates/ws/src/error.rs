/// Errors from the WebSocket client layer.
///
/// Every variant is fatal to the session it occurred on. Callers in the
/// watch engine treat all of them as "push channel unavailable".
#[derive(Debug, thiserror::Error)]
pub enum WsError {
    /// The endpoint URL could not be parsed.
    #[error("Invalid WebSocket URL: {0}")]
    InvalidUrl(String),

    /// The URL scheme is neither `ws` nor `wss`.
    #[error("Unsupported WebSocket scheme: {0}")]
    UnsupportedScheme(String),

    /// TCP connect failed (DNS, refused, unreachable).
    #[error("Connection error: {0}")]
    Connect(std::io::Error),

    /// TLS configuration or handshake failed.
    #[error("TLS error: {0}")]
    Tls(String),

    /// The server answered the upgrade request with something other than 101.
    #[error("WebSocket handshake failed: {0}")]
    HandshakeFailed(String),

    /// `Sec-WebSocket-Accept` did not match the key we sent.
    #[error("WebSocket accept key mismatch")]
    AcceptMismatch,

    /// A frame declared a payload above the configured ceiling.
    #[error("WebSocket payload too large: {len} bytes exceeds limit of {max}")]
    PayloadTooLarge { len: u64, max: u64 },

    /// Read or write failure on an established connection.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A message could not be serialized.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The peer sent a close frame, or the session was already closed.
    #[error("WebSocket closed")]
    Closed,

    /// The cancellation token fired while connecting.
    #[error("WebSocket connect cancelled")]
    Cancelled,
}

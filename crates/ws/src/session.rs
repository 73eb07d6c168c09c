//! Message-level operations over an established WebSocket connection.

use serde::Serialize;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};

use crate::error::WsError;
use crate::frame::{
    encode_frame, read_frame, MAX_PAYLOAD_LEN, OPCODE_CLOSE, OPCODE_PING, OPCODE_PONG, OPCODE_TEXT,
};

/// Byte stream a session can run over: plain TCP, rustls, or an
/// in-memory duplex in tests.
pub trait Transport: AsyncRead + AsyncWrite + Send + Unpin {}

impl<T: AsyncRead + AsyncWrite + Send + Unpin> Transport for T {}

/// One open WebSocket connection.
///
/// The session is closed (and the socket dropped) on the first read or
/// write error, on a close frame, or on an explicit [`close`](Self::close).
pub struct Session {
    stream: Option<BufReader<Box<dyn Transport>>>,
    max_payload: u64,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("open", &self.is_open())
            .field("max_payload", &self.max_payload)
            .finish()
    }
}

impl Session {
    /// Wrap a stream whose handshake has already completed.
    pub fn new(stream: Box<dyn Transport>) -> Self {
        Self::from_reader(BufReader::new(stream))
    }

    /// Wrap the buffered reader used during the handshake so that any
    /// bytes the server sent right after the `101` are not lost.
    pub(crate) fn from_reader(reader: BufReader<Box<dyn Transport>>) -> Self {
        Self {
            stream: Some(reader),
            max_payload: MAX_PAYLOAD_LEN,
        }
    }

    /// Override the inbound payload ceiling.
    pub fn with_max_payload(mut self, max_payload: u64) -> Self {
        self.max_payload = max_payload;
        self
    }

    pub fn is_open(&self) -> bool {
        self.stream.is_some()
    }

    /// Serialize `value` and send it as one text frame.
    pub async fn send_json<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), WsError> {
        let payload = serde_json::to_vec(value)?;
        self.send_frame(OPCODE_TEXT, &payload).await
    }

    /// Send one raw frame.
    pub async fn send_frame(&mut self, opcode: u8, payload: &[u8]) -> Result<(), WsError> {
        let stream = self.stream.as_mut().ok_or(WsError::Closed)?;
        let bytes = encode_frame(opcode, payload);
        let result = async {
            let inner = stream.get_mut();
            inner.write_all(&bytes).await?;
            inner.flush().await
        }
        .await;

        if let Err(e) = result {
            self.stream = None;
            return Err(WsError::Io(e));
        }
        Ok(())
    }

    /// Receive the payload of the next text frame.
    ///
    /// Pings are answered with a pong carrying the same payload; pongs and
    /// unknown opcodes are discarded. A close frame ends the session with
    /// [`WsError::Closed`].
    pub async fn receive_text(&mut self) -> Result<Vec<u8>, WsError> {
        loop {
            let stream = self.stream.as_mut().ok_or(WsError::Closed)?;
            let frame = match read_frame(stream, self.max_payload).await {
                Ok(frame) => frame,
                Err(e) => {
                    self.stream = None;
                    return Err(e);
                }
            };

            match frame.opcode {
                OPCODE_TEXT => return Ok(frame.payload),
                OPCODE_CLOSE => {
                    tracing::debug!("WebSocket close frame received");
                    self.stream = None;
                    return Err(WsError::Closed);
                }
                OPCODE_PING => {
                    tracing::trace!(len = frame.payload.len(), "Answering ping");
                    self.send_frame(OPCODE_PONG, &frame.payload).await?;
                }
                OPCODE_PONG => {}
                other => {
                    tracing::trace!(opcode = other, "Ignoring frame");
                }
            }
        }
    }

    /// Shut the connection down. Safe to call repeatedly.
    pub async fn close(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            let _ = stream.get_mut().shutdown().await;
        }
    }
}

//! Minimal WebSocket client for the Wiro task socket.
//!
//! Provides frame encoding/decoding, the HTTP upgrade handshake over
//! plain TCP or rustls, and a [`Session`](session::Session) exposing
//! "send one JSON text frame" and "receive the next text frame".
//! Only whole single-frame messages are supported; there is no
//! compression and no fragment reassembly.

pub mod error;
pub mod frame;
pub mod handshake;
pub mod session;

pub use error::WsError;
pub use handshake::connect;
pub use session::Session;

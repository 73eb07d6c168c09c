//! WebSocket frame codec (RFC 6455 section 5).
//!
//! The codec only deals with `(opcode, payload)` pairs. Interpreting
//! opcodes (replying to pings, stopping on close) is the session's job.
//!
//! Outgoing frames always have FIN set and are always masked, as
//! required for client-to-server traffic. Incoming frames are unmasked
//! only when the server set the mask bit.

use tokio::io::{AsyncRead, AsyncReadExt};

use crate::error::WsError;

/// Text data frame.
pub const OPCODE_TEXT: u8 = 0x1;
/// Connection close control frame.
pub const OPCODE_CLOSE: u8 = 0x8;
/// Ping control frame.
pub const OPCODE_PING: u8 = 0x9;
/// Pong control frame.
pub const OPCODE_PONG: u8 = 0xA;

/// Largest payload accepted from the peer (32 MiB).
pub const MAX_PAYLOAD_LEN: u64 = 32 * 1024 * 1024;

const FIN_BIT: u8 = 0x80;
const MASK_BIT: u8 = 0x80;
const OPCODE_MASK: u8 = 0x0F;
const LEN_MASK: u8 = 0x7F;

/// 7-bit length marker meaning "16-bit extended length follows".
const LEN_16: u8 = 126;
/// 7-bit length marker meaning "64-bit extended length follows".
const LEN_64: u8 = 127;

/// One decoded frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub opcode: u8,
    pub payload: Vec<u8>,
}

/// Encode a single final frame with a fresh random mask.
pub fn encode_frame(opcode: u8, payload: &[u8]) -> Vec<u8> {
    encode_frame_with_mask(opcode, payload, rand::random())
}

/// Encode a single final frame with the given masking key.
pub fn encode_frame_with_mask(opcode: u8, payload: &[u8], mask: [u8; 4]) -> Vec<u8> {
    let len = payload.len();
    let mut buf = Vec::with_capacity(14 + len);
    buf.push(FIN_BIT | (opcode & OPCODE_MASK));

    if len < LEN_16 as usize {
        buf.push(MASK_BIT | len as u8);
    } else if len <= u16::MAX as usize {
        buf.push(MASK_BIT | LEN_16);
        buf.extend_from_slice(&(len as u16).to_be_bytes());
    } else {
        buf.push(MASK_BIT | LEN_64);
        buf.extend_from_slice(&(len as u64).to_be_bytes());
    }

    buf.extend_from_slice(&mask);
    let start = buf.len();
    buf.extend_from_slice(payload);
    apply_mask(&mut buf[start..], mask);
    buf
}

/// Read one frame from `reader`.
///
/// Fails with [`WsError::PayloadTooLarge`] before allocating anything
/// when the declared length exceeds `max_len`.
pub async fn read_frame<R>(reader: &mut R, max_len: u64) -> Result<Frame, WsError>
where
    R: AsyncRead + Unpin,
{
    let mut header = [0u8; 2];
    reader.read_exact(&mut header).await?;

    let opcode = header[0] & OPCODE_MASK;
    let masked = header[1] & MASK_BIT != 0;
    let len = match header[1] & LEN_MASK {
        LEN_16 => {
            let mut ext = [0u8; 2];
            reader.read_exact(&mut ext).await?;
            u16::from_be_bytes(ext) as u64
        }
        LEN_64 => {
            let mut ext = [0u8; 8];
            reader.read_exact(&mut ext).await?;
            u64::from_be_bytes(ext)
        }
        short => short as u64,
    };

    if len > max_len {
        return Err(WsError::PayloadTooLarge { len, max: max_len });
    }

    let mask = if masked {
        let mut key = [0u8; 4];
        reader.read_exact(&mut key).await?;
        Some(key)
    } else {
        None
    };

    let mut payload = vec![0u8; len as usize];
    reader.read_exact(&mut payload).await?;

    if let Some(key) = mask {
        apply_mask(&mut payload, key);
    }

    Ok(Frame { opcode, payload })
}

/// XOR `buf` in place with the repeating 4-byte key. Applying it twice
/// restores the original bytes.
pub fn apply_mask(buf: &mut [u8], mask: [u8; 4]) {
    for (i, byte) in buf.iter_mut().enumerate() {
        *byte ^= mask[i % 4];
    }
}

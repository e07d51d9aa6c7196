//! Wire framing
//!
//! Each message is framed with an ASCII decimal length prefix
//! terminated by a single delimiter byte:
//!
//! ```text
//! <decimal length><delimiter><payload bytes>
//! ```
//!
//! The delimiter is configurable per deployment (default `:`). The
//! codec peels complete frames off a [`BytesMut`] read buffer without
//! copying the payload.

use bytes::BytesMut;

use crate::error::{ProtocolError, Result};

/// Upper bound on prefix digits; anything longer is a garbage stream
const MAX_PREFIX_DIGITS: usize = 12;

/// Location of one complete frame inside a read buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    /// Offset of the first payload byte
    pub payload_start: usize,
    /// Payload length in bytes
    pub payload_len: usize,
}

impl Frame {
    /// Offset one past the last payload byte; advance the buffer here
    #[inline]
    pub fn end(&self) -> usize {
        self.payload_start + self.payload_len
    }
}

/// Length-prefix frame codec
#[derive(Debug, Clone, Copy)]
pub struct FrameCodec {
    delimiter: u8,
    max_frame_size: usize,
}

impl FrameCodec {
    /// Create a codec with the deployment's delimiter and size cap
    pub fn new(delimiter: char, max_frame_size: usize) -> Self {
        Self {
            delimiter: delimiter as u8,
            max_frame_size,
        }
    }

    /// Peek at the next frame without consuming the buffer
    ///
    /// Returns:
    /// - `Ok(Some(frame))` if a complete frame is available
    /// - `Ok(None)` if more data is needed
    /// - `Err` if the prefix is malformed or the frame oversized
    pub fn peek(&self, buf: &BytesMut) -> Result<Option<Frame>> {
        if buf.is_empty() {
            return Ok(None);
        }

        if !buf[0].is_ascii_digit() {
            return Err(ProtocolError::bad_frame("length prefix must start with a digit"));
        }

        let scan_limit = buf.len().min(MAX_PREFIX_DIGITS + 1);
        let mut len: usize = 0;
        let mut delim_at = None;
        for (i, &b) in buf[..scan_limit].iter().enumerate() {
            if b == self.delimiter {
                delim_at = Some(i);
                break;
            }
            if !b.is_ascii_digit() {
                return Err(ProtocolError::bad_frame("length prefix contains a non-digit"));
            }
            len = len
                .checked_mul(10)
                .and_then(|l| l.checked_add((b - b'0') as usize))
                .ok_or_else(|| ProtocolError::bad_frame("length prefix overflows"))?;
        }

        let Some(delim_at) = delim_at else {
            if buf.len() > MAX_PREFIX_DIGITS {
                return Err(ProtocolError::bad_frame("length prefix has no delimiter"));
            }
            // Prefix may still be arriving
            return Ok(None);
        };

        if len == 0 {
            return Err(ProtocolError::bad_frame("zero-length payload"));
        }
        if len > self.max_frame_size {
            return Err(ProtocolError::frame_too_large(len, self.max_frame_size));
        }

        let payload_start = delim_at + 1;
        if buf.len() < payload_start + len {
            return Ok(None);
        }

        Ok(Some(Frame {
            payload_start,
            payload_len: len,
        }))
    }

    /// Encode a payload into a framed message (client side and tests)
    pub fn encode(&self, payload: &[u8]) -> Vec<u8> {
        let prefix = payload.len().to_string();
        let mut out = Vec::with_capacity(prefix.len() + 1 + payload.len());
        out.extend_from_slice(prefix.as_bytes());
        out.push(self.delimiter);
        out.extend_from_slice(payload);
        out
    }
}

#[cfg(test)]
#[path = "frame_test.rs"]
mod tests;

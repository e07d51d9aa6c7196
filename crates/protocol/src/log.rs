//! Log request model and parser
//!
//! A log payload is JSON: a single object is one record, a top-level
//! array is a bulk sharing one envelope. Bulk items are parsed
//! individually so one malformed item does not abort its siblings.

use serde::Deserialize;
use serde_json::Value;

use crate::error::{ProtocolError, Result};
use crate::level::LogLevel;

/// The server's own logger id; never writable by clients
pub const INTERNAL_LOGGER_ID: &str = "residue";

/// A raw payload as it travels from session I/O to the dispatch queue
///
/// Envelope metadata (`ip_addr`, `date_received`) is stamped by the
/// session; the payload is still encrypted at this point.
#[derive(Debug, Clone)]
pub struct RawRequest {
    /// The framed payload, exactly as read off the socket
    pub payload: bytes::Bytes,

    /// Peer address of the session that delivered the frame
    pub ip_addr: String,

    /// Epoch seconds the frame was read
    pub date_received: u64,
}

/// A fully decoded log record
///
/// Immutable once dispatched; `ip_addr` and `date_received` come from
/// the envelope, never from the payload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LogRequest {
    pub client_id: String,
    pub logger_id: String,
    pub msg: String,
    pub level: LogLevel,
    pub verbose_level: u32,
    pub file: String,
    pub line: u64,
    pub func: String,
    pub thread: String,
    pub token: String,

    /// Client-supplied timestamp (epoch seconds)
    pub datetime: u64,

    /// Stamped by session I/O
    pub ip_addr: String,

    /// Stamped by session I/O; all validity checks use this, not
    /// dispatch-time wall clock
    pub date_received: u64,
}

/// Wire shape of one record; required fields are optional here so their
/// absence maps to a named error instead of a serde failure
#[derive(Debug, Deserialize)]
struct RawItem {
    #[serde(default)]
    logger_id: Option<String>,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    level: u64,
    #[serde(default)]
    vlevel: u32,
    #[serde(default)]
    file: String,
    #[serde(default)]
    line: u64,
    #[serde(default)]
    func: String,
    #[serde(default)]
    thread: String,
    #[serde(default)]
    token: String,
    #[serde(default)]
    client_id: String,
    #[serde(default)]
    datetime: u64,
}

impl LogRequest {
    /// Decode one record from a JSON value
    ///
    /// # Errors
    ///
    /// - `MissingField` when `logger_id` or `msg` is absent
    /// - `InvalidLoggerId` when the id is empty or fails the charset
    ///   rules
    pub fn from_value(value: &Value) -> Result<Self> {
        let raw = RawItem::deserialize(value)?;

        let logger_id = raw
            .logger_id
            .ok_or(ProtocolError::MissingField("logger_id"))?;
        if !valid_logger_id(&logger_id) {
            return Err(ProtocolError::InvalidLoggerId(logger_id));
        }
        let msg = raw.msg.ok_or(ProtocolError::MissingField("msg"))?;

        Ok(Self {
            client_id: raw.client_id,
            logger_id,
            msg,
            level: LogLevel::from_u64(raw.level),
            verbose_level: raw.vlevel,
            file: raw.file,
            line: raw.line,
            func: raw.func,
            thread: raw.thread,
            token: raw.token,
            datetime: raw.datetime,
            ip_addr: String::new(),
            date_received: 0,
        })
    }

    /// Copy the envelope metadata onto this record
    pub fn set_envelope(&mut self, ip_addr: &str, date_received: u64) {
        self.ip_addr = ip_addr.to_string();
        self.date_received = date_received;
    }
}

/// A decoded log payload: one record or a bulk of them
#[derive(Debug)]
pub enum LogPayload {
    /// A single record, fully decoded
    Single(Box<LogRequest>),

    /// A bulk; items stay as JSON values so per-item failures can be
    /// skipped by the dispatcher
    Bulk(Vec<Value>),
}

impl LogPayload {
    /// Parse a plaintext payload
    ///
    /// A top-level array is a bulk; anything else must decode to one
    /// record.
    pub fn parse(plaintext: &[u8]) -> Result<Self> {
        let value: Value = serde_json::from_slice(plaintext)?;
        match value {
            Value::Array(items) => Ok(Self::Bulk(items)),
            other => Ok(Self::Single(Box::new(LogRequest::from_value(&other)?))),
        }
    }
}

/// Logger id charset: alphanumeric plus `-`, `_` and `.`
pub fn valid_logger_id(id: &str) -> bool {
    !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

#[cfg(test)]
#[path = "log_test.rs"]
mod tests;

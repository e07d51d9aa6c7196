//! Residue wire protocol
//!
//! The codec layer between sockets and the dispatch pipeline:
//!
//! - **Framing**: ASCII decimal length prefix + delimiter + payload
//!   ([`FrameCodec`]).
//! - **Status codes**: one status line per request, written immediately
//!   after framing ([`StatusCode`]).
//! - **Payloads**: handshake/touch/token bodies ([`ConnectionRequest`],
//!   [`TokenRequest`]) and the log record model with single/bulk
//!   parsing ([`LogPayload`], [`LogRequest`]).
//!
//! Encryption is out of scope here; payloads arrive already deciphered
//! by the envelope layer.

mod error;
mod frame;
mod level;
mod log;
mod request;
mod status;

pub use error::{ProtocolError, Result};
pub use frame::{Frame, FrameCodec};
pub use level::LogLevel;
pub use log::{INTERNAL_LOGGER_ID, LogPayload, LogRequest, RawRequest, valid_logger_id};
pub use request::{
    ConnectResponse, ConnectionRequest, ErrorResponse, TokenRequest, TokenResponse, TouchResponse,
};
pub use status::StatusCode;

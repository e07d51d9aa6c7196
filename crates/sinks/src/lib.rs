//! Residue file-logging boundary
//!
//! The dispatch worker hands fully validated records to a [`LogSink`].
//! The production implementation is [`DiskSink`] (one file per logger,
//! compiled line format); [`CaptureSink`] collects records in memory
//! for tests.
//!
//! The per-record specifiers `%client_id` and `%ip` are bound through
//! [`RecordContext`] rather than process-global state, so a sink never
//! sees a record without its dispatch context.

mod capture;
mod disk;
mod error;
mod format;

use residue_protocol::LogRequest;

pub use capture::{CaptureSink, CapturedRecord};
pub use disk::{DiskSink, DiskSinkConfig, DiskSinkMetrics, DiskSinkSnapshot};
pub use error::{Result, SinkError};
pub use format::FormatTemplate;

/// A validated record plus its dispatch-time context
#[derive(Debug, Clone, Copy)]
pub struct RecordContext<'a> {
    /// The decoded record
    pub request: &'a LogRequest,

    /// Resolved session id (`%client_id`)
    pub client_id: &'a str,

    /// Session peer address (`%ip`)
    pub ip_addr: &'a str,
}

/// Destination for validated records
///
/// Implementations must be callable from the single dispatch worker
/// without further synchronization on the caller's side.
pub trait LogSink: Send + Sync {
    /// Emit one record
    fn write(&self, record: &RecordContext<'_>) -> Result<()>;

    /// Flush buffered output; called at the end of each drain round
    fn flush(&self) -> Result<()>;
}

//! Sink error types

use std::io;
use thiserror::Error;

/// Result type for sink operations
pub type Result<T> = std::result::Result<T, SinkError>;

/// Errors that can occur while emitting records
#[derive(Debug, Error)]
pub enum SinkError {
    /// Failed to create the sink directory
    #[error("failed to create sink directory '{path}': {source}")]
    CreateDir {
        /// The directory path
        path: String,
        /// Underlying IO error
        #[source]
        source: io::Error,
    },

    /// Failed to open or write a logger's file
    #[error("write to '{path}' failed: {source}")]
    Write {
        /// The file path
        path: String,
        /// Underlying IO error
        #[source]
        source: io::Error,
    },
}

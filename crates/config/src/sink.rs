//! Sink configuration
//!
//! Settings for the per-logger file sink that accepted records are
//! appended to.

use std::path::PathBuf;

use serde::Deserialize;

/// Default line format for emitted records
pub const DEFAULT_FORMAT: &str = "%datetime [%level] [%client_id] [%ip] %logger %msg";

/// File sink configuration
///
/// # Example
///
/// ```toml
/// [sink]
/// path = "/var/log/residue"
/// format = "%datetime [%level] %logger %msg"
/// max_file_size = 104857600
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SinkConfig {
    /// Directory the per-logger files live in
    /// Default: "logs"
    pub path: PathBuf,

    /// Line format; supports %datetime, %level, %vlevel, %logger, %msg,
    /// %file, %line, %func, %thread, %client_id and %ip specifiers
    pub format: String,

    /// Rollover threshold in bytes; 0 disables rollover
    /// Default: 100 MiB
    pub max_file_size: u64,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("logs"),
            format: DEFAULT_FORMAT.into(),
            max_file_size: 100 * 1024 * 1024,
        }
    }
}

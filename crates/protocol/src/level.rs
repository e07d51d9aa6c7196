//! Log severity levels
//!
//! The wire protocol carries the level as the numeric code used by the
//! client-side logging libraries; unknown values fall back to Info.

use serde::{Deserialize, Serialize};

/// Log severity levels with their wire codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u64", from = "u64")]
pub enum LogLevel {
    Trace = 2,
    Debug = 4,
    Fatal = 8,
    Error = 16,
    Warning = 32,
    Verbose = 64,
    Info = 128,
}

impl LogLevel {
    /// Parse from the wire code
    #[inline]
    pub const fn from_u64(value: u64) -> Self {
        match value {
            2 => Self::Trace,
            4 => Self::Debug,
            8 => Self::Fatal,
            16 => Self::Error,
            32 => Self::Warning,
            64 => Self::Verbose,
            _ => Self::Info,
        }
    }

    /// Get string representation
    #[inline]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Trace => "TRACE",
            Self::Debug => "DEBUG",
            Self::Fatal => "FATAL",
            Self::Error => "ERROR",
            Self::Warning => "WARNING",
            Self::Verbose => "VERBOSE",
            Self::Info => "INFO",
        }
    }
}

impl Default for LogLevel {
    fn default() -> Self {
        Self::Info
    }
}

impl From<u64> for LogLevel {
    fn from(value: u64) -> Self {
        Self::from_u64(value)
    }
}

impl From<LogLevel> for u64 {
    fn from(level: LogLevel) -> Self {
        level as u64
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

//! Disk sink - per-logger log files
//!
//! Each logger gets `<path>/<logger_id>.log`, opened lazily in append
//! mode and kept open. Writes are buffered; the dispatcher flushes at
//! the end of every drain round. When a file exceeds the rollover
//! threshold it is renamed to `<logger_id>.log.1` (replacing any prior
//! rollover) and a fresh file started.
//!
//! Logger ids have already passed the protocol charset rules, so the id
//! is safe to embed in a file name.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

use crate::error::{Result, SinkError};
use crate::format::FormatTemplate;
use crate::{LogSink, RecordContext};

/// Configuration for the disk sink
#[derive(Debug, Clone)]
pub struct DiskSinkConfig {
    /// Directory the per-logger files live in
    pub path: PathBuf,

    /// Line format
    pub format: String,

    /// Rollover threshold in bytes; 0 disables rollover
    pub max_file_size: u64,
}

impl Default for DiskSinkConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("logs"),
            format: "%datetime [%level] [%client_id] [%ip] %logger %msg".into(),
            max_file_size: 100 * 1024 * 1024,
        }
    }
}

impl DiskSinkConfig {
    /// Create config with a custom directory
    #[must_use]
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = path.into();
        self
    }

    /// Create config with a custom line format
    #[must_use]
    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = format.into();
        self
    }

    /// Create config with a rollover threshold
    #[must_use]
    pub fn with_max_file_size(mut self, bytes: u64) -> Self {
        self.max_file_size = bytes;
        self
    }
}

/// Disk sink metrics
#[derive(Debug, Default)]
pub struct DiskSinkMetrics {
    /// Lines successfully written
    pub lines_written: AtomicU64,

    /// Bytes written (rendered line plus newline)
    pub bytes_written: AtomicU64,

    /// Write or rollover failures
    pub write_errors: AtomicU64,

    /// Completed rollovers
    pub rollovers: AtomicU64,
}

impl DiskSinkMetrics {
    /// Get snapshot of metrics
    pub fn snapshot(&self) -> DiskSinkSnapshot {
        DiskSinkSnapshot {
            lines_written: self.lines_written.load(Ordering::Relaxed),
            bytes_written: self.bytes_written.load(Ordering::Relaxed),
            write_errors: self.write_errors.load(Ordering::Relaxed),
            rollovers: self.rollovers.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time snapshot of disk sink metrics
#[derive(Debug, Clone, Copy, Default)]
pub struct DiskSinkSnapshot {
    pub lines_written: u64,
    pub bytes_written: u64,
    pub write_errors: u64,
    pub rollovers: u64,
}

struct OpenFile {
    writer: BufWriter<File>,
    size: u64,
}

/// Per-logger file sink
pub struct DiskSink {
    config: DiskSinkConfig,
    template: FormatTemplate,
    files: Mutex<HashMap<String, OpenFile>>,
    metrics: DiskSinkMetrics,
}

impl DiskSink {
    /// Create the sink, ensuring the directory exists
    pub fn new(config: DiskSinkConfig) -> Result<Self> {
        fs::create_dir_all(&config.path).map_err(|e| SinkError::CreateDir {
            path: config.path.display().to_string(),
            source: e,
        })?;

        let template = FormatTemplate::parse(&config.format);
        Ok(Self {
            config,
            template,
            files: Mutex::new(HashMap::new()),
            metrics: DiskSinkMetrics::default(),
        })
    }

    /// Get reference to metrics
    pub fn metrics(&self) -> &DiskSinkMetrics {
        &self.metrics
    }

    fn logger_path(&self, logger_id: &str) -> PathBuf {
        self.config.path.join(format!("{logger_id}.log"))
    }

    fn open(&self, logger_id: &str) -> Result<OpenFile> {
        let path = self.logger_path(logger_id);
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| SinkError::Write {
                path: path.display().to_string(),
                source: e,
            })?;
        let size = file.metadata().map(|m| m.len()).unwrap_or(0);
        Ok(OpenFile {
            writer: BufWriter::new(file),
            size,
        })
    }

    fn rollover(&self, logger_id: &str) -> Result<OpenFile> {
        let path = self.logger_path(logger_id);
        let rolled = self.config.path.join(format!("{logger_id}.log.1"));
        fs::rename(&path, &rolled).map_err(|e| SinkError::Write {
            path: path.display().to_string(),
            source: e,
        })?;
        self.metrics.rollovers.fetch_add(1, Ordering::Relaxed);
        self.open(logger_id)
    }
}

impl LogSink for DiskSink {
    fn write(&self, record: &RecordContext<'_>) -> Result<()> {
        let line = self.template.render(record);
        let logger_id = &record.request.logger_id;

        let mut files = self.files.lock();
        let entry = match files.entry(logger_id.clone()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(slot) => {
                let opened = self.open(logger_id).inspect_err(|_| {
                    self.metrics.write_errors.fetch_add(1, Ordering::Relaxed);
                })?;
                slot.insert(opened)
            }
        };

        if self.config.max_file_size > 0 && entry.size >= self.config.max_file_size {
            entry.writer.flush().map_err(|e| SinkError::Write {
                path: self.logger_path(logger_id).display().to_string(),
                source: e,
            })?;
            *entry = self.rollover(logger_id).inspect_err(|_| {
                self.metrics.write_errors.fetch_add(1, Ordering::Relaxed);
            })?;
        }

        let written = line.len() as u64 + 1;
        entry
            .writer
            .write_all(line.as_bytes())
            .and_then(|()| entry.writer.write_all(b"\n"))
            .map_err(|e| {
                self.metrics.write_errors.fetch_add(1, Ordering::Relaxed);
                SinkError::Write {
                    path: self.logger_path(logger_id).display().to_string(),
                    source: e,
                }
            })?;
        entry.size += written;

        self.metrics.lines_written.fetch_add(1, Ordering::Relaxed);
        self.metrics
            .bytes_written
            .fetch_add(written, Ordering::Relaxed);
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        let mut files = self.files.lock();
        for (logger_id, entry) in files.iter_mut() {
            entry.writer.flush().map_err(|e| SinkError::Write {
                path: self.logger_path(logger_id).display().to_string(),
                source: e,
            })?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "disk_test.rs"]
mod tests;

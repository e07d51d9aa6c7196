//! Capture sink - in-memory record collection
//!
//! Stands in for the disk sink in tests so scenarios can assert on
//! exactly which records made it through the pipeline.

use parking_lot::Mutex;
use residue_protocol::LogLevel;

use crate::error::Result;
use crate::{LogSink, RecordContext};

/// One captured record with its dispatch context
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedRecord {
    pub logger_id: String,
    pub msg: String,
    pub level: LogLevel,
    pub client_id: String,
    pub ip_addr: String,
    pub datetime: u64,
    pub date_received: u64,
}

/// Sink that appends every record to an in-memory list
#[derive(Debug, Default)]
pub struct CaptureSink {
    records: Mutex<Vec<CapturedRecord>>,
}

impl CaptureSink {
    /// Create an empty capture sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything captured so far
    pub fn records(&self) -> Vec<CapturedRecord> {
        self.records.lock().clone()
    }

    /// Number of captured records
    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    /// Whether nothing has been captured
    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    /// Drop all captured records
    pub fn clear(&self) {
        self.records.lock().clear();
    }
}

impl LogSink for CaptureSink {
    fn write(&self, record: &RecordContext<'_>) -> Result<()> {
        let req = record.request;
        self.records.lock().push(CapturedRecord {
            logger_id: req.logger_id.clone(),
            msg: req.msg.clone(),
            level: req.level,
            client_id: record.client_id.to_string(),
            ip_addr: record.ip_addr.to_string(),
            datetime: req.datetime,
            date_received: req.date_received,
        });
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        Ok(())
    }
}

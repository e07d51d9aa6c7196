//! Small shared helpers

use std::time::{SystemTime, UNIX_EPOCH};

/// Current wall clock as epoch seconds
pub fn epoch_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

//! Tests for the disk sink

use residue_protocol::{LogLevel, LogRequest};

use crate::disk::{DiskSink, DiskSinkConfig};
use crate::{LogSink, RecordContext};

fn request(logger_id: &str, msg: &str) -> LogRequest {
    LogRequest {
        client_id: "c1".into(),
        logger_id: logger_id.into(),
        msg: msg.into(),
        level: LogLevel::Info,
        datetime: 1_700_000_000,
        ip_addr: "10.0.0.9".into(),
        date_received: 1_700_000_000,
        ..Default::default()
    }
}

fn write(sink: &DiskSink, req: &LogRequest) {
    sink.write(&RecordContext {
        request: req,
        client_id: &req.client_id,
        ip_addr: &req.ip_addr,
    })
    .unwrap();
}

#[test]
fn test_writes_one_file_per_logger() {
    let dir = tempfile::tempdir().unwrap();
    let sink = DiskSink::new(
        DiskSinkConfig::default()
            .with_path(dir.path())
            .with_format("%logger %msg"),
    )
    .unwrap();

    write(&sink, &request("app", "from app"));
    write(&sink, &request("db", "from db"));
    write(&sink, &request("app", "more app"));
    sink.flush().unwrap();

    let app = std::fs::read_to_string(dir.path().join("app.log")).unwrap();
    assert_eq!(app, "app from app\napp more app\n");

    let db = std::fs::read_to_string(dir.path().join("db.log")).unwrap();
    assert_eq!(db, "db from db\n");

    let snapshot = sink.metrics().snapshot();
    assert_eq!(snapshot.lines_written, 3);
    assert_eq!(snapshot.write_errors, 0);
}

#[test]
fn test_renders_dispatch_context() {
    let dir = tempfile::tempdir().unwrap();
    let sink = DiskSink::new(
        DiskSinkConfig::default()
            .with_path(dir.path())
            .with_format("[%client_id] [%ip] %msg"),
    )
    .unwrap();

    write(&sink, &request("app", "hello"));
    sink.flush().unwrap();

    let contents = std::fs::read_to_string(dir.path().join("app.log")).unwrap();
    assert_eq!(contents, "[c1] [10.0.0.9] hello\n");
}

#[test]
fn test_appends_across_sink_instances() {
    let dir = tempfile::tempdir().unwrap();
    let config = DiskSinkConfig::default()
        .with_path(dir.path())
        .with_format("%msg");

    {
        let sink = DiskSink::new(config.clone()).unwrap();
        write(&sink, &request("app", "first"));
        sink.flush().unwrap();
    }
    {
        let sink = DiskSink::new(config).unwrap();
        write(&sink, &request("app", "second"));
        sink.flush().unwrap();
    }

    let contents = std::fs::read_to_string(dir.path().join("app.log")).unwrap();
    assert_eq!(contents, "first\nsecond\n");
}

#[test]
fn test_rollover_at_threshold() {
    let dir = tempfile::tempdir().unwrap();
    let sink = DiskSink::new(
        DiskSinkConfig::default()
            .with_path(dir.path())
            .with_format("%msg")
            .with_max_file_size(16),
    )
    .unwrap();

    // Each line is 11 bytes ("0123456789" + newline); the second write
    // sees size 11 < 16, the third sees 22 >= 16 and rolls over first.
    write(&sink, &request("app", "0123456789"));
    write(&sink, &request("app", "0123456789"));
    write(&sink, &request("app", "extra"));
    sink.flush().unwrap();

    let rolled = std::fs::read_to_string(dir.path().join("app.log.1")).unwrap();
    assert_eq!(rolled, "0123456789\n0123456789\n");

    let current = std::fs::read_to_string(dir.path().join("app.log")).unwrap();
    assert_eq!(current, "extra\n");

    assert_eq!(sink.metrics().snapshot().rollovers, 1);
}

#[test]
fn test_zero_threshold_disables_rollover() {
    let dir = tempfile::tempdir().unwrap();
    let sink = DiskSink::new(
        DiskSinkConfig::default()
            .with_path(dir.path())
            .with_format("%msg")
            .with_max_file_size(0),
    )
    .unwrap();

    for _ in 0..50 {
        write(&sink, &request("app", "a fairly long line to grow the file"));
    }
    sink.flush().unwrap();

    assert!(!dir.path().join("app.log.1").exists());
    assert_eq!(sink.metrics().snapshot().rollovers, 0);
}

//! Tests for line format templates

use residue_protocol::{LogLevel, LogRequest};

use crate::RecordContext;
use crate::format::FormatTemplate;

fn sample_request() -> LogRequest {
    LogRequest {
        client_id: "c1".into(),
        logger_id: "app".into(),
        msg: "hello world".into(),
        level: LogLevel::Debug,
        verbose_level: 3,
        file: "main.cpp".into(),
        line: 42,
        func: "main".into(),
        thread: "worker-1".into(),
        token: "T".into(),
        datetime: 1_700_000_000,
        ip_addr: "10.0.0.9".into(),
        date_received: 1_700_000_001,
    }
}

fn render(format: &str, req: &LogRequest) -> String {
    FormatTemplate::parse(format).render(&RecordContext {
        request: req,
        client_id: &req.client_id,
        ip_addr: &req.ip_addr,
    })
}

#[test]
fn test_basic_specifiers() {
    let req = sample_request();
    assert_eq!(
        render("[%level] %logger %msg", &req),
        "[DEBUG] app hello world"
    );
}

#[test]
fn test_per_record_specifiers() {
    let req = sample_request();
    assert_eq!(render("%client_id@%ip", &req), "c1@10.0.0.9");
}

#[test]
fn test_source_location_specifiers() {
    let req = sample_request();
    assert_eq!(
        render("%file:%line %func [%thread] v%vlevel", &req),
        "main.cpp:42 main [worker-1] v3"
    );
}

#[test]
fn test_datetime_renders_utc() {
    let req = sample_request();
    // 1700000000 = 2023-11-14 22:13:20 UTC
    assert_eq!(render("%datetime", &req), "2023-11-14 22:13:20");
}

#[test]
fn test_datetime_falls_back_to_receive_time() {
    let mut req = sample_request();
    req.datetime = 0;
    req.date_received = 1_700_000_000;
    assert_eq!(render("%datetime", &req), "2023-11-14 22:13:20");
}

#[test]
fn test_unknown_specifier_kept_literal() {
    let req = sample_request();
    assert_eq!(render("%unknown %msg", &req), "%unknown hello world");
}

#[test]
fn test_escaped_percent() {
    let req = sample_request();
    assert_eq!(render("100%% %msg", &req), "100% hello world");
}

#[test]
fn test_no_specifiers() {
    let req = sample_request();
    assert_eq!(render("static text", &req), "static text");
}

#[test]
fn test_default_format_renders_all_fields() {
    let req = sample_request();
    let line = render("%datetime [%level] [%client_id] [%ip] %logger %msg", &req);
    assert!(line.contains("[DEBUG]"));
    assert!(line.contains("[c1]"));
    assert!(line.contains("[10.0.0.9]"));
    assert!(line.ends_with("app hello world"));
}

//! Tests for the log request parser

use crate::error::ProtocolError;
use crate::level::LogLevel;
use crate::log::{LogPayload, LogRequest, valid_logger_id};

#[test]
fn test_parse_single_record() {
    let payload = br#"{
        "logger_id": "app",
        "msg": "hello",
        "level": 4,
        "vlevel": 0,
        "file": "main.cpp",
        "line": 42,
        "func": "main",
        "thread": "worker-1",
        "token": "T",
        "client_id": "c1",
        "datetime": 1100
    }"#;

    let LogPayload::Single(req) = LogPayload::parse(payload).unwrap() else {
        panic!("expected single record");
    };
    assert_eq!(req.logger_id, "app");
    assert_eq!(req.msg, "hello");
    assert_eq!(req.level, LogLevel::Debug);
    assert_eq!(req.line, 42);
    assert_eq!(req.token, "T");
    assert_eq!(req.client_id, "c1");
    assert_eq!(req.datetime, 1100);
    // Envelope fields are not taken from the payload
    assert_eq!(req.ip_addr, "");
    assert_eq!(req.date_received, 0);
}

#[test]
fn test_parse_minimal_record() {
    let LogPayload::Single(req) =
        LogPayload::parse(br#"{"logger_id": "app", "msg": "m"}"#).unwrap()
    else {
        panic!("expected single record");
    };
    assert_eq!(req.level, LogLevel::Info);
    assert_eq!(req.line, 0);
}

#[test]
fn test_bulk_keeps_items_as_values() {
    let payload = br#"[
        {"logger_id": "app", "msg": "one"},
        {"logger_id": "app"},
        {"logger_id": "app", "msg": "three"}
    ]"#;

    let LogPayload::Bulk(items) = LogPayload::parse(payload).unwrap() else {
        panic!("expected bulk");
    };
    assert_eq!(items.len(), 3);

    // First and third decode; second is missing its msg
    assert!(LogRequest::from_value(&items[0]).is_ok());
    assert!(matches!(
        LogRequest::from_value(&items[1]),
        Err(ProtocolError::MissingField("msg"))
    ));
    assert_eq!(LogRequest::from_value(&items[2]).unwrap().msg, "three");
}

#[test]
fn test_missing_logger_id() {
    let err = LogPayload::parse(br#"{"msg": "hello"}"#).unwrap_err();
    assert!(matches!(err, ProtocolError::MissingField("logger_id")));
}

#[test]
fn test_invalid_logger_id_charset() {
    let err = LogPayload::parse(br#"{"logger_id": "bad logger!", "msg": "m"}"#).unwrap_err();
    assert!(matches!(err, ProtocolError::InvalidLoggerId(_)));
}

#[test]
fn test_empty_logger_id_rejected() {
    let err = LogPayload::parse(br#"{"logger_id": "", "msg": "m"}"#).unwrap_err();
    assert!(matches!(err, ProtocolError::InvalidLoggerId(_)));
}

#[test]
fn test_not_json_rejected() {
    assert!(matches!(
        LogPayload::parse(b"definitely not json"),
        Err(ProtocolError::InvalidJson(_))
    ));
}

#[test]
fn test_set_envelope() {
    let LogPayload::Single(mut req) =
        LogPayload::parse(br#"{"logger_id": "app", "msg": "m"}"#).unwrap()
    else {
        panic!("expected single record");
    };
    req.set_envelope("192.168.1.10", 1100);
    assert_eq!(req.ip_addr, "192.168.1.10");
    assert_eq!(req.date_received, 1100);
}

#[test]
fn test_logger_id_charset() {
    assert!(valid_logger_id("app"));
    assert!(valid_logger_id("my-app_v2.main"));
    assert!(!valid_logger_id(""));
    assert!(!valid_logger_id("has space"));
    assert!(!valid_logger_id("has/slash"));
    assert!(!valid_logger_id("emoji🚀"));
}

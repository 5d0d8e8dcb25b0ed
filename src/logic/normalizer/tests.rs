use super::extract::{extract_trace_id, first_key_match, parse_nested, ParseError};
use super::merge::{list_log_files, normalize_log_file};
use super::*;
use serde_json::{json, Map, Value};
use std::fs;
use tempfile::tempdir;

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => panic!("not an object"),
    }
}

#[test]
fn test_normalize_line_with_object_fields() {
    let mut stats = NormalizeStats::default();
    let line = r#"2024-05-01 12:00:00 INFO {"Timestamp":"2024-05-01T12:00:00Z","Scope":{"RequestId":"r1","TraceId":"t-1"},"State":{"Path":"/api/users","StatusCode":200,"User-Agent":"curl/8.0"}}"#;

    let record = normalize_line(line, &mut stats).unwrap().unwrap();
    assert_eq!(record.timestamp.as_deref(), Some("2024-05-01T12:00:00Z"));
    assert_eq!(record.trace_id.as_deref(), Some("t-1"));
    assert_eq!(record.path.as_deref(), Some("/api/users"));
    assert_eq!(record.status_code, Some(200));
    assert_eq!(record.user_agent.as_deref(), Some("curl/8.0"));
    assert_eq!(stats.records, 1);
    assert_eq!(stats.parse_failures(), 0);
}

#[test]
fn test_normalize_line_with_dict_strings() {
    let mut stats = NormalizeStats::default();
    let line = r#"{"Timestamp":"t","Scope":"{'TraceId': 'abc'}","State":"{'Path': '/login', 'StatusCode': '401', 'User-Agent': 'Mozilla'}"}"#;

    let record = normalize_line(line, &mut stats).unwrap().unwrap();
    assert_eq!(record.trace_id.as_deref(), Some("abc"));
    assert_eq!(record.path.as_deref(), Some("/login"));
    assert_eq!(record.status_code, Some(401));
    assert_eq!(record.user_agent.as_deref(), Some("Mozilla"));
}

#[test]
fn test_malformed_state_nulls_fields_only() {
    let mut stats = NormalizeStats::default();
    let line = r#"{"Timestamp":"t","Scope":{"TraceId":"abc"},"State":"{'Path': broken"}"#;

    let record = normalize_line(line, &mut stats).unwrap().unwrap();
    assert_eq!(record.trace_id.as_deref(), Some("abc"));
    assert_eq!(record.path, None);
    assert_eq!(record.status_code, None);
    assert_eq!(record.user_agent, None);
    assert_eq!(stats.malformed_fields, 1);
    assert_eq!(stats.records, 1);
}

#[test]
fn test_malformed_line_is_error_and_counted() {
    let mut stats = NormalizeStats::default();
    let result = normalize_line("INFO {not json", &mut stats);

    assert!(matches!(result, Err(ParseError::MalformedJson(_))));
    assert_eq!(stats.malformed_lines, 1);
    assert_eq!(stats.records, 0);
}

#[test]
fn test_line_without_payload_is_ignored() {
    let mut stats = NormalizeStats::default();
    let result = normalize_line("plain text line", &mut stats).unwrap();

    assert!(result.is_none());
    assert_eq!(stats.lines_without_payload, 1);
    assert_eq!(stats.parse_failures(), 0);
}

#[test]
fn test_trace_id_key_is_case_sensitive() {
    let scope = object(json!({"traceid": "lower", "TRACEID": "upper"}));
    assert_eq!(extract_trace_id(Some(&scope)), None);

    let scope = object(json!({"traceid": "lower", "TraceId": "exact"}));
    assert_eq!(extract_trace_id(Some(&scope)), Some("exact".to_string()));
}

#[test]
fn test_first_key_match_exact_key() {
    let map = object(json!({"b": 1, "a": 2, "Path": "/x"}));
    assert_eq!(first_key_match(&map, "Path"), Some(&json!("/x")));
    assert_eq!(first_key_match(&map, "path"), None);
}

#[test]
fn test_parse_nested_rejects_non_objects() {
    assert!(matches!(
        parse_nested("State", &json!(42)),
        Err(ParseError::NotAnObject { field: "State", kind: "number" })
    ));
    assert!(matches!(
        parse_nested("State", &json!("[1, 2]")),
        Err(ParseError::NotAnObject { kind: "array", .. })
    ));
}

#[test]
fn test_float_status_code() {
    let mut stats = NormalizeStats::default();
    let line = r#"{"State":{"Path":"/a","StatusCode":404.0}}"#;
    let record = normalize_line(line, &mut stats).unwrap().unwrap();
    assert_eq!(record.status_code, Some(404));
    assert_eq!(record.timestamp, None);
}

#[test]
fn test_normalize_entry_does_not_mutate_input() {
    let entry = object(json!({"Scope": "{'TraceId': 't'}", "State": {"Path": "/p"}}));
    let before = entry.clone();
    let mut stats = NormalizeStats::default();
    let _ = normalize_entry(&entry, &mut stats);
    assert_eq!(entry, before);
}

#[test]
fn test_normalize_log_dir_sorted_and_filtered() {
    let dir = tempdir().unwrap();
    fs::write(
        dir.path().join("b.log"),
        "x {\"State\":{\"Path\":\"/second\"}}\n",
    )
    .unwrap();
    fs::write(
        dir.path().join("a.log"),
        "x {\"State\":{\"Path\":\"/first\"}}\ngarbage {oops\n",
    )
    .unwrap();
    fs::write(dir.path().join("notes.txt"), "{\"State\":{\"Path\":\"/ignored\"}}\n").unwrap();

    let files = list_log_files(dir.path()).unwrap();
    assert_eq!(files.len(), 2);

    let (records, stats) = normalize_log_dir(dir.path()).unwrap();
    let paths: Vec<_> = records.iter().map(|r| r.path.clone().unwrap()).collect();
    assert_eq!(paths, vec!["/first", "/second"]);
    assert_eq!(stats.malformed_lines, 1);
    assert_eq!(stats.lines_read, 3);
}

#[test]
fn test_non_utf8_line_is_skipped_and_counted() {
    let dir = tempdir().unwrap();
    let mut body = b"x {\"State\":{\"Path\":\"/before\"}}\n".to_vec();
    body.extend_from_slice(b"x {\"State\":{\"Path\":\"/\xff\"}}\n");
    body.extend_from_slice(b"x {\"State\":{\"Path\":\"/after\"}}\r\n");
    fs::write(dir.path().join("a.log"), body).unwrap();

    let (records, stats) = normalize_log_dir(dir.path()).unwrap();
    let paths: Vec<_> = records.iter().map(|r| r.path.clone().unwrap()).collect();
    assert_eq!(paths, vec!["/before", "/after"]);
    assert_eq!(stats.lines_read, 3);
    assert_eq!(stats.malformed_lines, 1);
    assert_eq!(stats.parse_failures(), 1);
}

#[test]
fn test_normalize_log_file_missing_is_io_error() {
    let mut records = Vec::new();
    let mut stats = NormalizeStats::default();
    let result = normalize_log_file(
        std::path::Path::new("/nonexistent/file.log"),
        &mut records,
        &mut stats,
    );
    assert!(matches!(result, Err(crate::error::PipelineError::Io { .. })));
}

#[test]
fn test_write_records_csv() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("out").join("transformed.csv");
    let records = vec![
        LogRecord {
            timestamp: Some("t1".to_string()),
            trace_id: Some("abc".to_string()),
            path: Some("/api".to_string()),
            status_code: Some(200),
            user_agent: Some("curl".to_string()),
        },
        LogRecord {
            timestamp: Some("t2".to_string()),
            ..Default::default()
        },
    ];

    write_records_csv(&path, &records).unwrap();

    let content = fs::read_to_string(&path).unwrap();
    let lines: Vec<_> = content.lines().collect();
    assert_eq!(lines[0], "Timestamp,Trace-id,Path,HTTP Status Code,User Agent");
    assert_eq!(lines[1], "t1,abc,/api,200,curl");
    assert_eq!(lines[2], "t2,,,,");
}

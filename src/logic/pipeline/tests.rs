use std::fs;
use std::path::Path;

use super::*;
use crate::constants::{
    LEXICAL_OUTPUT_FILE, SIGNATURE_OUTPUT_FILE, STRUCTURAL_OUTPUT_FILE, SUMMARY_OUTPUT_FILE,
};
use crate::error::PipelineError;
use crate::logic::config::PipelineConfig;
use crate::logic::detection::LabelSource;
use crate::logic::normalizer::{write_records_csv, LogRecord};

const SCANNER_UA: &str = "Mozilla/5.0 (compatible; CensysInspect/1.1; +https://about.censys.io/)";
const INJECTION_PATH: &str = "/api/users?id=1' UNION SELECT password FROM users--";

fn record(i: usize, path: &str, status: i64, ua: &str) -> LogRecord {
    LogRecord {
        timestamp: Some(format!("2024-05-01T10:{:02}:{:02}Z", i / 60, i % 60)),
        trace_id: Some(format!("trace-{}", i)),
        path: Some(path.to_string()),
        status_code: Some(status),
        user_agent: Some(ua.to_string()),
    }
}

fn traffic() -> Vec<LogRecord> {
    let mut records: Vec<LogRecord> = (0..60)
        .map(|i| {
            let path = ["/api/users", "/api/orders", "/api/items"][i % 3];
            record(i, path, 200, "Mozilla/5.0 (X11; Linux x86_64)")
        })
        .collect();
    records.push(record(60, INJECTION_PATH, 500, "curl/8.0"));
    records.push(record(61, "/api/items", 200, SCANNER_UA));
    records
}

fn write_input(dir: &Path, records: &[LogRecord]) -> std::path::PathBuf {
    let path = dir.join("normalized.csv");
    write_records_csv(&path, records).unwrap();
    path
}

fn config_for(output_dir: &Path) -> PipelineConfig {
    PipelineConfig { output_dir: output_dir.to_path_buf(), ..Default::default() }
}

// ============================================================================
// READER
// ============================================================================

#[test]
fn test_reader_global_record_ids() {
    let dir = tempfile::tempdir().unwrap();
    let records: Vec<_> = (0..7).map(|i| record(i, "/a", 200, "ua")).collect();
    let input = write_input(dir.path(), &records);

    let chunks: Vec<Chunk> = ChunkedReader::open(&input, 3)
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    let shape: Vec<(u64, u64, usize)> =
        chunks.iter().map(|c| (c.index, c.first_record_id, c.len())).collect();
    assert_eq!(shape, vec![(0, 0, 3), (1, 3, 3), (2, 6, 1)]);
    assert_eq!(chunks[2].records[0].trace_id.as_deref(), Some("trace-6"));
}

#[test]
fn test_reader_skips_malformed_rows() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("input.csv");
    fs::write(
        &input,
        "Timestamp,Trace-id,Path,HTTP Status Code,User Agent\n\
         t1,a,/x,200,ua\n\
         t2,b,/y\n\
         t3,c,/z,404.0,ua\n",
    )
    .unwrap();

    let mut reader = ChunkedReader::open(&input, 10).unwrap();
    let chunk = reader.next_chunk().unwrap().unwrap();
    assert_eq!(chunk.len(), 2);
    assert_eq!(chunk.records[1].status_code, Some(404));
    assert_eq!(reader.parse_failures(), 1);
    assert!(reader.next_chunk().unwrap().is_none());
}

#[test]
fn test_reader_missing_file() {
    let result = ChunkedReader::open(Path::new("/nonexistent/input.csv"), 10);
    assert!(matches!(result, Err(PipelineError::Csv { .. })));
}

// ============================================================================
// PIPELINE
// ============================================================================

#[test]
fn test_invalid_config_rejected_before_run() {
    let config = PipelineConfig { min_neighbors: 0, ..Default::default() };
    assert!(matches!(Pipeline::new(config), Err(PipelineError::Config(_))));
}

#[test]
fn test_missing_denylist_is_fatal() {
    let config = PipelineConfig {
        suspicious_user_agent_file: Some("/nonexistent/agents.txt".into()),
        ..Default::default()
    };
    assert!(matches!(Pipeline::new(config), Err(PipelineError::Io { .. })));
}

#[test]
fn test_empty_chunk_continues() {
    let pipeline = Pipeline::new(PipelineConfig::default()).unwrap();
    let mut approaches = Approaches::new();

    let empty = Chunk { index: 0, first_record_id: 0, records: Vec::new() };
    pipeline.process_chunk(&empty, &mut approaches).unwrap();
    for source in [LabelSource::Density, LabelSource::Isolation] {
        assert_eq!(approaches.structural.not_computed(source), 1);
        assert_eq!(approaches.lexical.not_computed(source), 1);
    }

    let next = Chunk { index: 1, first_record_id: 0, records: traffic() };
    pipeline.process_chunk(&next, &mut approaches).unwrap();
    assert!(approaches.structural.anomaly_count() > 0);
    assert_eq!(approaches.signature.anomaly_count(), 1);
    assert_eq!(approaches.structural.not_computed(LabelSource::Density), 1);
}

#[test]
fn test_run_writes_all_outputs() {
    let input_dir = tempfile::tempdir().unwrap();
    let output_dir = tempfile::tempdir().unwrap();
    let input = write_input(input_dir.path(), &traffic());

    let summary = Pipeline::new(config_for(output_dir.path())).unwrap().run(&input).unwrap();
    assert_eq!(summary.rows_processed, 62);
    assert_eq!(summary.chunks_processed, 1);
    assert_eq!(summary.parse_failures, 0);
    assert_eq!(summary.approach("signature").unwrap().combined_anomalies, 1);

    let structural = fs::read_to_string(output_dir.path().join(STRUCTURAL_OUTPUT_FILE)).unwrap();
    assert!(structural.contains(INJECTION_PATH));

    let signature = fs::read_to_string(output_dir.path().join(SIGNATURE_OUTPUT_FILE)).unwrap();
    let lines: Vec<&str> = signature.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[1].contains("CensysInspect"));
    assert!(lines[1].ends_with("true,true"));

    assert!(output_dir.path().join(LEXICAL_OUTPUT_FILE).exists());
    assert!(output_dir.path().join(SUMMARY_OUTPUT_FILE).exists());
}

#[test]
fn test_denylist_match_flags_feature_approaches() {
    let input_dir = tempfile::tempdir().unwrap();
    let output_dir = tempfile::tempdir().unwrap();
    let input = write_input(input_dir.path(), &traffic());

    let summary = Pipeline::new(config_for(output_dir.path())).unwrap().run(&input).unwrap();

    let feature_outputs = [("structural", STRUCTURAL_OUTPUT_FILE), ("lexical", LEXICAL_OUTPUT_FILE)];
    for (name, file) in feature_outputs {
        let csv = fs::read_to_string(output_dir.path().join(file)).unwrap();
        let mut lines = csv.lines();
        let header = lines.next().unwrap();
        assert!(header.ends_with("is_anomaly_signature,is_anomaly_combined"), "{}", header);

        let scanner: Vec<&str> = lines.filter(|l| l.contains("CensysInspect")).collect();
        assert_eq!(scanner.len(), 1, "{} output misses the denylisted row", name);
        assert!(scanner[0].ends_with(",true,true"), "{}", scanner[0]);

        let approach = summary.approach(name).unwrap();
        assert!(approach.combined_anomalies >= 1);
    }
}

#[test]
fn test_run_is_byte_identical() {
    let input_dir = tempfile::tempdir().unwrap();
    let input = write_input(input_dir.path(), &traffic());
    let out_a = tempfile::tempdir().unwrap();
    let out_b = tempfile::tempdir().unwrap();

    let config = PipelineConfig { chunk_size: 25, ..config_for(out_a.path()) };
    Pipeline::new(config.clone()).unwrap().run(&input).unwrap();
    Pipeline::new(PipelineConfig { output_dir: out_b.path().to_path_buf(), ..config })
        .unwrap()
        .run(&input)
        .unwrap();

    for file in [
        STRUCTURAL_OUTPUT_FILE,
        LEXICAL_OUTPUT_FILE,
        SIGNATURE_OUTPUT_FILE,
        SUMMARY_OUTPUT_FILE,
    ] {
        let a = fs::read(out_a.path().join(file)).unwrap();
        let b = fs::read(out_b.path().join(file)).unwrap();
        assert_eq!(a, b, "{} differs between runs", file);
    }
}

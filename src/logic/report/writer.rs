use std::fs;
use std::path::Path;

use super::aggregate::ResultAggregator;
use crate::error::{PipelineError, PipelineResult};
use crate::logic::normalizer::LogRecord;

/// Original record columns, in input order
pub const RECORD_COLUMNS: [&str; 5] =
    ["Timestamp", "Trace-id", "Path", "HTTP Status Code", "User Agent"];

pub const COMBINED_COLUMN: &str = "is_anomaly_combined";

/// Header for an approach: record columns, source columns, combined
pub fn anomaly_header(aggregator: &ResultAggregator) -> Vec<&'static str> {
    let mut header = RECORD_COLUMNS.to_vec();
    header.extend(aggregator.sources().iter().map(|s| s.column_name()));
    header.push(COMBINED_COLUMN);
    header
}

/// Record fields as written; nulls become empty fields
fn record_fields(record: &LogRecord) -> [String; 5] {
    [
        record.timestamp.clone().unwrap_or_default(),
        record.trace_id.clone().unwrap_or_default(),
        record.path.clone().unwrap_or_default(),
        record.status_code.map(|c| c.to_string()).unwrap_or_default(),
        record.user_agent.clone().unwrap_or_default(),
    ]
}

fn bool_field(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}

/// Write an approach's flagged rows; the header is written even when empty
pub fn write_anomalies_csv(path: &Path, aggregator: &ResultAggregator) -> PipelineResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| PipelineError::io(parent, e))?;
    }

    let mut writer = csv::Writer::from_path(path).map_err(|e| PipelineError::csv(path, e))?;
    writer
        .write_record(anomaly_header(aggregator))
        .map_err(|e| PipelineError::csv(path, e))?;

    for row in aggregator.rows() {
        let mut fields: Vec<String> = record_fields(&row.record).into();
        fields.extend(
            aggregator
                .sources()
                .iter()
                .map(|s| bool_field(row.flags.get(*s)).to_string()),
        );
        fields.push(bool_field(row.is_anomaly_combined()).to_string());
        writer.write_record(&fields).map_err(|e| PipelineError::csv(path, e))?;
    }
    writer.flush().map_err(|e| PipelineError::io(path, e))?;

    log::info!(
        "{}: wrote {} anomalies to {}",
        aggregator.approach(),
        aggregator.anomaly_count(),
        path.display()
    );
    Ok(())
}

use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use super::extract::{normalize_line, NormalizeStats};
use super::record::LogRecord;
use crate::error::{PipelineError, PipelineResult};

/// List `*.log` files in a folder, sorted by name for a stable record order
pub fn list_log_files(dir: &Path) -> PipelineResult<Vec<PathBuf>> {
    let mut paths: Vec<_> = fs::read_dir(dir)
        .map_err(|e| PipelineError::io(dir, e))?
        .filter_map(|r| r.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file() && p.extension().map_or(false, |e| e == "log"))
        .collect();
    paths.sort();
    Ok(paths)
}

/// Normalize every line of one log file, appending records in line order
pub fn normalize_log_file(
    path: &Path,
    records: &mut Vec<LogRecord>,
    stats: &mut NormalizeStats,
) -> PipelineResult<()> {
    let file = File::open(path).map_err(|e| PipelineError::io(path, e))?;
    let mut reader = BufReader::new(file);
    let mut buf = Vec::new();
    let mut line_no = 0u64;

    loop {
        buf.clear();
        let read = reader
            .read_until(b'\n', &mut buf)
            .map_err(|e| PipelineError::io(path, e))?;
        if read == 0 {
            break;
        }
        line_no += 1;

        let raw = buf.strip_suffix(b"\n").unwrap_or(&buf);
        let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
        let line = match std::str::from_utf8(raw) {
            Ok(line) => line,
            Err(e) => {
                stats.lines_read += 1;
                stats.malformed_lines += 1;
                log::warn!(
                    "Skipping non UTF-8 line {} in file {}: {}",
                    line_no,
                    path.display(),
                    e
                );
                continue;
            }
        };

        match normalize_line(line, stats) {
            Ok(Some(record)) => records.push(record),
            Ok(None) => {}
            Err(e) => {
                log::warn!("Skipping invalid JSON in file {}: {}", path.display(), e);
            }
        }
    }
    Ok(())
}

/// Merge and normalize all log files in a folder
pub fn normalize_log_dir(dir: &Path) -> PipelineResult<(Vec<LogRecord>, NormalizeStats)> {
    let mut records = Vec::new();
    let mut stats = NormalizeStats::default();

    for path in list_log_files(dir)? {
        log::info!("Processing file: {}", path.display());
        normalize_log_file(&path, &mut records, &mut stats)?;
    }

    if records.is_empty() {
        log::warn!("No valid log entries found in {}", dir.display());
    }
    Ok((records, stats))
}

/// Write normalized records as the pipeline's input CSV
pub fn write_records_csv(path: &Path, records: &[LogRecord]) -> PipelineResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| PipelineError::io(parent, e))?;
    }

    let mut writer = csv::Writer::from_path(path).map_err(|e| PipelineError::csv(path, e))?;
    if records.is_empty() {
        writer
            .write_record(["Timestamp", "Trace-id", "Path", "HTTP Status Code", "User Agent"])
            .map_err(|e| PipelineError::csv(path, e))?;
    }
    for record in records {
        writer.serialize(record).map_err(|e| PipelineError::csv(path, e))?;
    }
    writer.flush().map_err(|e| PipelineError::io(path, e))?;

    log::info!("Normalized {} records into {}", records.len(), path.display());
    Ok(())
}

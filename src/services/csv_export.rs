use std::fs;
use std::path::Path;

use crate::models::market_chart::MergedRow;

pub const MERGED_HEADER: [&str; 8] = [
    "time",
    "open",
    "high",
    "low",
    "close",
    "price",
    "market_cap",
    "total_volume",
];

#[derive(Debug)]
pub enum ExportError {
    Io(std::io::Error),
    Csv(csv::Error),
}

impl std::fmt::Display for ExportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExportError::Io(e) => write!(f, "File error: {}", e),
            ExportError::Csv(e) => write!(f, "CSV error: {}", e),
        }
    }
}

impl std::error::Error for ExportError {}

impl From<std::io::Error> for ExportError {
    fn from(e: std::io::Error) -> Self {
        ExportError::Io(e)
    }
}

impl From<csv::Error> for ExportError {
    fn from(e: csv::Error) -> Self {
        ExportError::Csv(e)
    }
}

/// Write merged rows to `path`, replacing any previous export.
///
/// Missing OHLC values are written as empty cells. Returns the number of data rows.
pub fn write_merged_rows(path: &Path, rows: &[MergedRow]) -> Result<usize, ExportError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)?;

    writer.write_record(MERGED_HEADER)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;

    Ok(rows.len())
}

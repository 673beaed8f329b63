//! Append-only snapshot CSV plus JSON backup.
//!
//! Every poll appends one row per market entry, all tagged with the same poll
//! timestamp. Rows from earlier polls are never rewritten. The JSON backup
//! holds the raw payload of the latest poll (or every poll, in append mode).

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use crate::config::{BackupMode, CollectorConfig};
use crate::models::market::{
    LatestMarketEntry, MarketSnapshotRow, SnapshotBackup, SNAPSHOT_HEADER,
};
use crate::services::coin_images;

/// Fixed-width UTC so that string order equals time order, DST included
pub const POLL_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6fZ";

pub fn poll_timestamp(now: DateTime<Utc>) -> String {
    now.format(POLL_TIMESTAMP_FORMAT).to_string()
}

#[derive(Debug)]
pub enum SnapshotStoreError {
    Io(std::io::Error),
    Csv(csv::Error),
    Json(serde_json::Error),
    Parse { field: &'static str, value: String },
}

impl std::fmt::Display for SnapshotStoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SnapshotStoreError::Io(e) => write!(f, "File error: {}", e),
            SnapshotStoreError::Csv(e) => write!(f, "CSV error: {}", e),
            SnapshotStoreError::Json(e) => write!(f, "JSON error: {}", e),
            SnapshotStoreError::Parse { field, value } => {
                write!(f, "Cannot parse {} from '{}'", field, value)
            }
        }
    }
}

impl std::error::Error for SnapshotStoreError {}

impl From<std::io::Error> for SnapshotStoreError {
    fn from(e: std::io::Error) -> Self {
        SnapshotStoreError::Io(e)
    }
}

impl From<csv::Error> for SnapshotStoreError {
    fn from(e: csv::Error) -> Self {
        SnapshotStoreError::Csv(e)
    }
}

impl From<serde_json::Error> for SnapshotStoreError {
    fn from(e: serde_json::Error) -> Self {
        SnapshotStoreError::Json(e)
    }
}

/// A snapshot row as stored on disk, before re-typing
#[derive(Debug, Deserialize)]
struct StoredRow {
    timestamp: String,
    id: String,
    symbol: String,
    name: String,
    current_price: String,
    market_cap: String,
    market_cap_rank: String,
    price_change_percentage_24h: String,
    high_24h: String,
    low_24h: String,
    total_volume: String,
    last_updated: String,
}

impl StoredRow {
    fn into_entry(self) -> Result<LatestMarketEntry, SnapshotStoreError> {
        let image = coin_images::image_for(&self.id).to_string();

        Ok(LatestMarketEntry {
            current_price: parse_float("current_price", &self.current_price)?,
            market_cap: parse_float("market_cap", &self.market_cap)?,
            market_cap_rank: parse_int("market_cap_rank", &self.market_cap_rank)?,
            price_change_percentage_24h: parse_float(
                "price_change_percentage_24h",
                &self.price_change_percentage_24h,
            )?,
            high_24h: parse_float("high_24h", &self.high_24h)?,
            low_24h: parse_float("low_24h", &self.low_24h)?,
            total_volume: parse_float("total_volume", &self.total_volume)?,
            id: self.id,
            symbol: self.symbol,
            name: self.name,
            last_updated: self.last_updated,
            image,
        })
    }
}

// Empty cells read back as zero, matching the defaults used on write
fn parse_float(field: &'static str, raw: &str) -> Result<f64, SnapshotStoreError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(0.0);
    }
    raw.parse::<f64>().map_err(|_| SnapshotStoreError::Parse {
        field,
        value: raw.to_string(),
    })
}

fn parse_int(field: &'static str, raw: &str) -> Result<i64, SnapshotStoreError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(0);
    }
    raw.parse::<i64>().map_err(|_| SnapshotStoreError::Parse {
        field,
        value: raw.to_string(),
    })
}

fn ensure_parent(path: &Path) -> Result<(), SnapshotStoreError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct SnapshotStore {
    csv_path: PathBuf,
    backup_path: PathBuf,
    backup_mode: BackupMode,
}

impl SnapshotStore {
    pub fn new(
        csv_path: impl Into<PathBuf>,
        backup_path: impl Into<PathBuf>,
        backup_mode: BackupMode,
    ) -> Self {
        Self {
            csv_path: csv_path.into(),
            backup_path: backup_path.into(),
            backup_mode,
        }
    }

    pub fn from_config(config: &CollectorConfig) -> Self {
        Self::new(
            config.output_paths.snapshot_csv.clone(),
            config.output_paths.snapshot_backup.clone(),
            config.backup_mode,
        )
    }

    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }

    pub fn backup_path(&self) -> &Path {
        &self.backup_path
    }

    /// Append one row per entry, all tagged with `poll_timestamp`.
    ///
    /// Writes the header first when the file is new or empty. Returns the
    /// number of rows appended; an empty payload appends nothing.
    pub fn append_poll(
        &self,
        entries: &[Value],
        poll_timestamp: &str,
    ) -> Result<usize, SnapshotStoreError> {
        if entries.is_empty() {
            tracing::warn!("No data to save");
            return Ok(0);
        }

        ensure_parent(&self.csv_path)?;

        let needs_header = match fs::metadata(&self.csv_path) {
            Ok(meta) => meta.len() == 0,
            Err(_) => true,
        };

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.csv_path)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);

        if needs_header {
            tracing::info!("Creating {} with header", self.csv_path.display());
            writer.write_record(SNAPSHOT_HEADER)?;
        }

        for entry in entries {
            writer.serialize(MarketSnapshotRow::from_entry(entry, poll_timestamp))?;
        }
        writer.flush()?;

        tracing::info!(
            rows = entries.len(),
            path = %self.csv_path.display(),
            "Appended snapshot rows"
        );

        Ok(entries.len())
    }

    /// Persist `{timestamp, data}` as the JSON backup
    pub fn write_backup(&self, timestamp: &str, data: &Value) -> Result<(), SnapshotStoreError> {
        ensure_parent(&self.backup_path)?;

        let backup = SnapshotBackup {
            timestamp: timestamp.to_string(),
            data: data.clone(),
        };

        match self.backup_mode {
            BackupMode::Overwrite => {
                let json = serde_json::to_string_pretty(&backup)?;
                fs::write(&self.backup_path, json)?;
            }
            BackupMode::Append => {
                let line = serde_json::to_string(&backup)?;
                let mut file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(&self.backup_path)?;
                writeln!(file, "{}", line)?;
            }
        }

        tracing::info!("Backup written to {}", self.backup_path.display());
        Ok(())
    }

    /// Most recent backup document, if any
    pub fn read_backup(&self) -> Result<Option<SnapshotBackup>, SnapshotStoreError> {
        if !self.backup_path.exists() {
            return Ok(None);
        }

        match self.backup_mode {
            BackupMode::Overwrite => {
                let content = fs::read_to_string(&self.backup_path)?;
                if content.trim().is_empty() {
                    return Ok(None);
                }
                Ok(Some(serde_json::from_str(&content)?))
            }
            BackupMode::Append => {
                let file = fs::File::open(&self.backup_path)?;
                let mut last = None;
                for line in BufReader::new(file).lines() {
                    let line = line?;
                    if !line.trim().is_empty() {
                        last = Some(line);
                    }
                }
                last.map(|line| serde_json::from_str(&line))
                    .transpose()
                    .map_err(SnapshotStoreError::from)
            }
        }
    }

    /// Rows of the most recent poll, re-typed and enriched with image URLs.
    ///
    /// `Ok(None)` when the CSV is missing or holds no rows.
    pub fn read_latest(&self) -> Result<Option<Vec<LatestMarketEntry>>, SnapshotStoreError> {
        if !self.csv_path.exists() {
            tracing::warn!("Snapshot CSV {} does not exist", self.csv_path.display());
            return Ok(None);
        }

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(&self.csv_path)?;

        // A damaged row from an older poll must not hide the latest one
        let mut rows = Vec::new();
        for (index, record) in reader.deserialize::<StoredRow>().enumerate() {
            match record {
                Ok(row) => rows.push(row),
                Err(e) => {
                    tracing::warn!(record = index + 1, "Skipping malformed snapshot row: {}", e);
                }
            }
        }

        let Some(latest) = rows.iter().map(|r| r.timestamp.clone()).max() else {
            tracing::warn!("Snapshot CSV {} is empty", self.csv_path.display());
            return Ok(None);
        };

        let entries = rows
            .into_iter()
            .filter(|r| r.timestamp == latest)
            .map(StoredRow::into_entry)
            .collect::<Result<Vec<_>, _>>()?;

        tracing::info!(
            rows = entries.len(),
            poll = %latest,
            "Read latest snapshot from CSV"
        );

        Ok(Some(entries))
    }
}

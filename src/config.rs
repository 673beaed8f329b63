//! Collector configuration
//!
//! Every job receives a `CollectorConfig` explicitly. `from_env()` reads the
//! process environment (after loading `.env`), `default()` does not.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.coingecko.com/api/v3";

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    InvalidValue { key: String, value: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::InvalidValue { key, value } => {
                write!(f, "Invalid value for {}: '{}'", key, value)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// What happens to the previous JSON backup when a new one is written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackupMode {
    #[default]
    Overwrite,
    /// One compact JSON document per line
    Append,
}

impl FromStr for BackupMode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "overwrite" => Ok(BackupMode::Overwrite),
            "append" => Ok(BackupMode::Append),
            _ => Err(()),
        }
    }
}

/// How the price, market-cap and volume series are lined up before merging
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SeriesAlignment {
    /// Pair samples by array index, truncating to the shortest series
    #[default]
    Position,
    /// Join samples on their formatted timestamp
    Timestamp,
}

impl FromStr for SeriesAlignment {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "position" => Ok(SeriesAlignment::Position),
            "timestamp" => Ok(SeriesAlignment::Timestamp),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OutputPaths {
    pub data_dir: PathBuf,
    pub snapshot_csv: PathBuf,
    pub snapshot_backup: PathBuf,
    pub ohlc_json: PathBuf,
    pub market_chart_dir: PathBuf,
}

impl OutputPaths {
    /// Standard file names under a single data directory
    pub fn under(data_dir: impl Into<PathBuf>) -> Self {
        let data_dir = data_dir.into();
        Self {
            snapshot_csv: data_dir.join("crypto_data.csv"),
            snapshot_backup: data_dir.join("crypto_data_backup.json"),
            ohlc_json: data_dir.join("ohlc_data.json"),
            market_chart_dir: data_dir.clone(),
            data_dir,
        }
    }

    pub fn market_chart_csv(&self, coin_id: &str) -> PathBuf {
        self.market_chart_dir
            .join(format!("{}_market_data_with_ohlc.csv", coin_id))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CollectorConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub coin_ids: Vec<String>,
    pub vs_currency: String,
    pub day_ranges: Vec<u32>,
    pub market_chart_days: u32,
    pub markets_per_page: u32,
    pub poll_interval: Duration,
    pub request_timeout: Duration,
    pub output_paths: OutputPaths,
    pub backup_mode: BackupMode,
    pub alignment: SeriesAlignment,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            coin_ids: vec!["bitcoin".to_string(), "ethereum".to_string()],
            vs_currency: "usd".to_string(),
            day_ranges: vec![1, 7, 30],
            market_chart_days: 1,
            markets_per_page: 10,
            poll_interval: Duration::from_millis(1000),
            request_timeout: Duration::from_secs(10),
            output_paths: OutputPaths::under("data"),
            backup_mode: BackupMode::Overwrite,
            alignment: SeriesAlignment::Position,
        }
    }
}

impl CollectorConfig {
    /// Load `.env` and build a config from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup; unset keys keep their defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let base_url = get("COINGECKO_BASE_URL")
            .map(|v| v.trim_end_matches('/').to_string())
            .unwrap_or(defaults.base_url);
        let api_key = get("COINGECKO_API_KEY");

        let coin_ids = match get("COLLECTOR_COIN_IDS") {
            Some(raw) => {
                let ids = parse_list(&raw);
                if ids.is_empty() {
                    return Err(invalid("COLLECTOR_COIN_IDS", &raw));
                }
                ids
            }
            None => defaults.coin_ids,
        };

        let vs_currency = get("COLLECTOR_VS_CURRENCY")
            .map(|v| v.trim().to_lowercase())
            .unwrap_or(defaults.vs_currency);

        let day_ranges = match get("COLLECTOR_OHLC_DAY_RANGES") {
            Some(raw) => {
                let ranges = parse_list(&raw)
                    .iter()
                    .map(|d| d.parse::<u32>())
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(|_| invalid("COLLECTOR_OHLC_DAY_RANGES", &raw))?;
                if ranges.is_empty() {
                    return Err(invalid("COLLECTOR_OHLC_DAY_RANGES", &raw));
                }
                ranges
            }
            None => defaults.day_ranges,
        };

        let market_chart_days = parse_or(
            "COLLECTOR_MARKET_CHART_DAYS",
            get("COLLECTOR_MARKET_CHART_DAYS"),
            defaults.market_chart_days,
        )?;
        let markets_per_page = parse_or(
            "COLLECTOR_MARKETS_PER_PAGE",
            get("COLLECTOR_MARKETS_PER_PAGE"),
            defaults.markets_per_page,
        )?;

        let poll_interval = get("COLLECTOR_POLL_INTERVAL_MS")
            .map(|raw| {
                raw.trim()
                    .parse::<u64>()
                    .map(Duration::from_millis)
                    .map_err(|_| invalid("COLLECTOR_POLL_INTERVAL_MS", &raw))
            })
            .transpose()?
            .unwrap_or(defaults.poll_interval);
        let request_timeout = get("COLLECTOR_REQUEST_TIMEOUT_SECS")
            .map(|raw| {
                raw.trim()
                    .parse::<u64>()
                    .map(Duration::from_secs)
                    .map_err(|_| invalid("COLLECTOR_REQUEST_TIMEOUT_SECS", &raw))
            })
            .transpose()?
            .unwrap_or(defaults.request_timeout);

        let mut output_paths = match get("COLLECTOR_DATA_DIR") {
            Some(dir) => OutputPaths::under(dir.trim()),
            None => defaults.output_paths,
        };
        if let Some(path) = get("COLLECTOR_SNAPSHOT_CSV") {
            output_paths.snapshot_csv = PathBuf::from(path.trim());
        }
        if let Some(path) = get("COLLECTOR_SNAPSHOT_BACKUP") {
            output_paths.snapshot_backup = PathBuf::from(path.trim());
        }
        if let Some(path) = get("COLLECTOR_OHLC_JSON") {
            output_paths.ohlc_json = PathBuf::from(path.trim());
        }
        if let Some(path) = get("COLLECTOR_MARKET_CHART_DIR") {
            output_paths.market_chart_dir = PathBuf::from(path.trim());
        }

        let backup_mode = match get("COLLECTOR_BACKUP_MODE") {
            Some(raw) => raw
                .parse::<BackupMode>()
                .map_err(|_| invalid("COLLECTOR_BACKUP_MODE", &raw))?,
            None => defaults.backup_mode,
        };
        let alignment = match get("COLLECTOR_SERIES_ALIGNMENT") {
            Some(raw) => raw
                .parse::<SeriesAlignment>()
                .map_err(|_| invalid("COLLECTOR_SERIES_ALIGNMENT", &raw))?,
            None => defaults.alignment,
        };

        Ok(Self {
            base_url,
            api_key,
            coin_ids,
            vs_currency,
            day_ranges,
            market_chart_days,
            markets_per_page,
            poll_interval,
            request_timeout,
            output_paths,
            backup_mode,
            alignment,
        })
    }
}

fn invalid(key: &str, value: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    }
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}

fn parse_or<T: FromStr>(key: &str, raw: Option<String>, default: T) -> Result<T, ConfigError> {
    match raw {
        Some(raw) => raw.trim().parse::<T>().map_err(|_| invalid(key, &raw)),
        None => Ok(default),
    }
}

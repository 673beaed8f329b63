use serde::{Deserialize, Serialize};

/// One `[epoch_ms, value]` sample from a market_chart series
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "(i64, f64)")]
pub struct TimePoint {
    pub timestamp_ms: i64,
    pub value: f64,
}

impl TimePoint {
    pub fn new(timestamp_ms: i64, value: f64) -> Self {
        Self { timestamp_ms, value }
    }
}

impl From<[f64; 2]> for TimePoint {
    fn from(raw: [f64; 2]) -> Self {
        Self {
            timestamp_ms: raw[0] as i64,
            value: raw[1],
        }
    }
}

impl From<TimePoint> for (i64, f64) {
    fn from(point: TimePoint) -> Self {
        (point.timestamp_ms, point.value)
    }
}

/// One `[epoch_ms, open, high, low, close]` bar from the /ohlc endpoint
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 5]", into = "(i64, f64, f64, f64, f64)")]
pub struct OhlcBar {
    pub timestamp_ms: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl From<[f64; 5]> for OhlcBar {
    fn from(raw: [f64; 5]) -> Self {
        Self {
            timestamp_ms: raw[0] as i64,
            open: raw[1],
            high: raw[2],
            low: raw[3],
            close: raw[4],
        }
    }
}

impl From<OhlcBar> for (i64, f64, f64, f64, f64) {
    fn from(bar: OhlcBar) -> Self {
        (bar.timestamp_ms, bar.open, bar.high, bar.low, bar.close)
    }
}

/// Response of GET /coins/{id}/market_chart/range
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MarketChart {
    #[serde(default)]
    pub prices: Vec<TimePoint>,
    #[serde(default)]
    pub market_caps: Vec<TimePoint>,
    #[serde(default)]
    pub total_volumes: Vec<TimePoint>,
}

/// OHLC fields attached to a merged row when a bar shares its formatted time
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OhlcFields {
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl From<&OhlcBar> for OhlcFields {
    fn from(bar: &OhlcBar) -> Self {
        Self {
            open: bar.open,
            high: bar.high,
            low: bar.low,
            close: bar.close,
        }
    }
}

/// One exported CSV row; column order matches the export header
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MergedRow {
    pub time: String,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: Option<f64>,
    pub price: f64,
    pub market_cap: f64,
    pub total_volume: f64,
}

impl MergedRow {
    pub fn new(time: String, price: f64, market_cap: f64, total_volume: f64) -> Self {
        Self {
            time,
            open: None,
            high: None,
            low: None,
            close: None,
            price,
            market_cap,
            total_volume,
        }
    }

    pub fn with_ohlc(mut self, ohlc: Option<&OhlcFields>) -> Self {
        if let Some(fields) = ohlc {
            self.open = Some(fields.open);
            self.high = Some(fields.high);
            self.low = Some(fields.low);
            self.close = Some(fields.close);
        }
        self
    }

    pub fn has_ohlc(&self) -> bool {
        self.open.is_some()
    }
}

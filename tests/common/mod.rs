#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use coingecko_collector::config::{CollectorConfig, OutputPaths};
use coingecko_collector::models::market::MarketsQuery;
use coingecko_collector::models::market_chart::{MarketChart, OhlcBar, TimePoint};
use coingecko_collector::services::coingecko::{CoinGeckoError, MarketDataSource};

/// In-memory stand-in for the CoinGecko API
#[derive(Default)]
pub struct FakeSource {
    pub charts: HashMap<String, MarketChart>,
    pub ohlc: HashMap<(String, u32), Vec<Value>>,
    /// Consumed one per `markets()` call; `None` simulates a network failure
    pub markets: Mutex<VecDeque<Option<Vec<Value>>>>,
    pub calls: Mutex<Vec<String>>,
}

impl FakeSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_chart(mut self, coin_id: &str, chart: MarketChart) -> Self {
        self.charts.insert(coin_id.to_string(), chart);
        self
    }

    pub fn with_ohlc(self, coin_id: &str, days: u32, bars: Vec<OhlcBar>) -> Self {
        let rows = bars.into_iter().map(|b| json!(b)).collect();
        self.with_raw_ohlc(coin_id, days, rows)
    }

    /// OHLC rows served verbatim, for payloads `OhlcBar` cannot hold
    pub fn with_raw_ohlc(mut self, coin_id: &str, days: u32, rows: Vec<Value>) -> Self {
        self.ohlc.insert((coin_id.to_string(), days), rows);
        self
    }

    pub fn with_markets(self, response: Option<Vec<Value>>) -> Self {
        self.markets.lock().unwrap().push_back(response);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl MarketDataSource for FakeSource {
    async fn market_chart_range(
        &self,
        coin_id: &str,
        _vs_currency: &str,
        from_secs: i64,
        to_secs: i64,
    ) -> Result<MarketChart, CoinGeckoError> {
        self.record(format!("market_chart_range:{}:{}", coin_id, to_secs - from_secs));
        self.charts
            .get(coin_id)
            .cloned()
            .ok_or_else(|| CoinGeckoError::Transport(format!("no chart for {}", coin_id)))
    }

    async fn ohlc_raw(
        &self,
        coin_id: &str,
        _vs_currency: &str,
        days: u32,
    ) -> Result<Vec<Value>, CoinGeckoError> {
        self.record(format!("ohlc:{}:{}", coin_id, days));
        self.ohlc
            .get(&(coin_id.to_string(), days))
            .cloned()
            .ok_or_else(|| CoinGeckoError::Decode(format!("no ohlc for {} {}d", coin_id, days)))
    }

    async fn markets(&self, query: &MarketsQuery) -> Result<Vec<Value>, CoinGeckoError> {
        self.record(format!("markets:{}", query.per_page));
        match self.markets.lock().unwrap().pop_front() {
            Some(Some(entries)) => Ok(entries),
            _ => Err(CoinGeckoError::Transport("connection reset".to_string())),
        }
    }
}

pub fn test_config(dir: &Path) -> CollectorConfig {
    CollectorConfig {
        poll_interval: Duration::ZERO,
        output_paths: OutputPaths::under(dir.join("data")),
        ..CollectorConfig::default()
    }
}

pub fn series(start_ms: i64, step_ms: i64, values: &[f64]) -> Vec<TimePoint> {
    values
        .iter()
        .enumerate()
        .map(|(i, v)| TimePoint::new(start_ms + i as i64 * step_ms, *v))
        .collect()
}

pub fn bar(timestamp_ms: i64, open: f64, high: f64, low: f64, close: f64) -> OhlcBar {
    OhlcBar::from([timestamp_ms as f64, open, high, low, close])
}

pub fn market_entries() -> Vec<Value> {
    vec![
        json!({
            "id": "bitcoin", "symbol": "btc", "name": "Bitcoin",
            "image": "https://assets.coingecko.com/coins/images/1/large/bitcoin.png",
            "current_price": 43250.12, "market_cap": 847123456789_u64, "market_cap_rank": 1,
            "price_change_percentage_24h": -1.25, "high_24h": 44000.0, "low_24h": 42800.5,
            "total_volume": 21000000000.0, "last_updated": "2024-01-01T12:00:00.000Z"
        }),
        json!({
            "id": "ethereum", "symbol": "eth", "name": "Ethereum",
            "current_price": 2300.5, "market_cap": 276000000000_u64, "market_cap_rank": 2,
            "price_change_percentage_24h": 0.75, "high_24h": 2350.0, "low_24h": 2250.0,
            "total_volume": 9000000000.0, "last_updated": "2024-01-01T12:00:01.000Z"
        }),
        json!({
            "id": "tether", "symbol": "usdt", "name": "Tether",
            "current_price": 1.0, "market_cap": 91000000000_u64, "market_cap_rank": 3,
            "price_change_percentage_24h": null, "high_24h": 1.001, "low_24h": 0.999,
            "total_volume": 30000000000.0, "last_updated": "2024-01-01T12:00:02.000Z"
        }),
    ]
}

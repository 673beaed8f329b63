use async_trait::async_trait;
use chrono::DateTime;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

use crate::config::CollectorConfig;
use crate::models::market::MarketsQuery;
use crate::models::market_chart::{MarketChart, OhlcBar};

#[derive(Debug)]
pub enum CoinGeckoError {
    Transport(String),
    Status { status: StatusCode, body: String },
    Decode(String),
}

impl std::fmt::Display for CoinGeckoError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CoinGeckoError::Transport(msg) => write!(f, "Network error: {}", msg),
            CoinGeckoError::Status { status, body } => {
                write!(f, "CoinGecko API error {}: {}", status, body)
            }
            CoinGeckoError::Decode(msg) => write!(f, "Unexpected payload: {}", msg),
        }
    }
}

impl std::error::Error for CoinGeckoError {}

impl From<reqwest::Error> for CoinGeckoError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            CoinGeckoError::Decode(e.to_string())
        } else {
            CoinGeckoError::Transport(e.to_string())
        }
    }
}

/// Upstream market data, as consumed by the collector jobs
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// Price, market-cap and volume series between two epoch-second bounds
    async fn market_chart_range(
        &self,
        coin_id: &str,
        vs_currency: &str,
        from_secs: i64,
        to_secs: i64,
    ) -> Result<MarketChart, CoinGeckoError>;

    /// OHLC rows exactly as returned upstream
    async fn ohlc_raw(
        &self,
        coin_id: &str,
        vs_currency: &str,
        days: u32,
    ) -> Result<Vec<Value>, CoinGeckoError>;

    async fn ohlc(
        &self,
        coin_id: &str,
        vs_currency: &str,
        days: u32,
    ) -> Result<Vec<OhlcBar>, CoinGeckoError> {
        let raw = self.ohlc_raw(coin_id, vs_currency, days).await?;
        serde_json::from_value(Value::Array(raw))
            .map_err(|e| CoinGeckoError::Decode(e.to_string()))
    }

    /// Ranked market entries, returned as raw JSON objects
    async fn markets(&self, query: &MarketsQuery) -> Result<Vec<Value>, CoinGeckoError>;
}

#[derive(Clone)]
pub struct CoinGeckoService {
    client: Client,
    api_key: Option<String>,
    base_url: String,
}

impl CoinGeckoService {
    pub fn new(
        api_key: Option<String>,
        base_url: String,
        timeout: Duration,
    ) -> Result<Self, CoinGeckoError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &CollectorConfig) -> Result<Self, CoinGeckoError> {
        Self::new(
            config.api_key.clone(),
            config.base_url.clone(),
            config.request_timeout,
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn get(&self, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let request = self
            .client
            .get(&url)
            .header("accept", "application/json");

        match &self.api_key {
            Some(key) => request.header("x-cg-demo-api-key", key),
            None => request,
        }
    }

    async fn send_json<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, CoinGeckoError> {
        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(CoinGeckoError::Status { status, body });
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| CoinGeckoError::Decode(e.to_string()))
    }
}

#[async_trait]
impl MarketDataSource for CoinGeckoService {
    async fn market_chart_range(
        &self,
        coin_id: &str,
        vs_currency: &str,
        from_secs: i64,
        to_secs: i64,
    ) -> Result<MarketChart, CoinGeckoError> {
        tracing::info!("Fetching market chart for {} from CoinGecko", coin_id);

        let request = self
            .get(&format!("/coins/{}/market_chart/range", coin_id))
            .query(&[
                ("vs_currency", vs_currency.to_string()),
                ("from", from_secs.to_string()),
                ("to", to_secs.to_string()),
            ]);

        let chart: MarketChart = Self::send_json(request).await?;

        if let Some(last_price) = chart.prices.last() {
            let last_date = DateTime::from_timestamp_millis(last_price.timestamp_ms)
                .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_else(|| "Invalid date".to_string());
            tracing::debug!(
                "Fetched {} prices for {}, last: {} @ {}",
                chart.prices.len(),
                coin_id,
                last_price.value,
                last_date
            );
        }

        Ok(chart)
    }

    async fn ohlc_raw(
        &self,
        coin_id: &str,
        vs_currency: &str,
        days: u32,
    ) -> Result<Vec<Value>, CoinGeckoError> {
        tracing::info!("Fetching {}d OHLC for {} from CoinGecko", days, coin_id);

        let request = self
            .get(&format!("/coins/{}/ohlc", coin_id))
            .query(&[("vs_currency", vs_currency.to_string()), ("days", days.to_string())]);

        let rows: Vec<Value> = Self::send_json(request).await?;

        tracing::debug!("Fetched {} OHLC rows for {} ({}d)", rows.len(), coin_id, days);

        Ok(rows)
    }

    async fn markets(&self, query: &MarketsQuery) -> Result<Vec<Value>, CoinGeckoError> {
        tracing::info!("Fetching top {} markets from CoinGecko", query.per_page);

        let request = self.get("/coins/markets").query(&query.to_params());
        let entries: Vec<Value> = Self::send_json(request).await?;

        tracing::info!("Fetched {} market entries", entries.len());

        Ok(entries)
    }
}

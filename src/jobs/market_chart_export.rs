//! Export job: market_chart + OHLC for each configured coin into one CSV per coin.
//!
//! There is no fallback here. A failed fetch aborts the export.

use chrono::{DateTime, Duration, Utc};
use std::path::PathBuf;

use crate::config::CollectorConfig;
use crate::services::coingecko::MarketDataSource;
use crate::services::csv_export;
use crate::services::time_series;

#[derive(Debug, Clone, PartialEq)]
pub struct ExportSummary {
    pub coin_id: String,
    pub rows: usize,
    pub rows_with_ohlc: usize,
    pub path: PathBuf,
}

/// `(from, to)` in epoch seconds covering the last `days` days before `now`
pub fn export_window(now: DateTime<Utc>, days: u32) -> (i64, i64) {
    let from = now - Duration::days(days as i64);
    (from.timestamp(), now.timestamp())
}

pub async fn export_coin<S>(
    source: &S,
    config: &CollectorConfig,
    coin_id: &str,
    now: DateTime<Utc>,
) -> Result<ExportSummary, Box<dyn std::error::Error + Send + Sync>>
where
    S: MarketDataSource + ?Sized,
{
    let (from, to) = export_window(now, config.market_chart_days);

    tracing::info!(
        "Fetching {} market_chart for the last {} day(s)",
        coin_id,
        config.market_chart_days
    );
    let chart = source
        .market_chart_range(coin_id, &config.vs_currency, from, to)
        .await?;

    tracing::info!("Fetching {} OHLC for the last {} day(s)", coin_id, config.market_chart_days);
    let ohlc = source
        .ohlc(coin_id, &config.vs_currency, config.market_chart_days)
        .await?;

    tracing::debug!(
        prices = chart.prices.len(),
        market_caps = chart.market_caps.len(),
        total_volumes = chart.total_volumes.len(),
        ohlc = ohlc.len(),
        "Merging {} series",
        coin_id
    );

    let rows = time_series::merge_market_chart(&chart, &ohlc, config.alignment);
    let rows_with_ohlc = rows.iter().filter(|r| r.has_ohlc()).count();

    let path = config.output_paths.market_chart_csv(coin_id);
    let written = csv_export::write_merged_rows(&path, &rows)?;

    tracing::info!(
        "✅ Saved {} rows ({} with OHLC) to {}",
        written,
        rows_with_ohlc,
        path.display()
    );

    Ok(ExportSummary {
        coin_id: coin_id.to_string(),
        rows: written,
        rows_with_ohlc,
        path,
    })
}

/// Export every configured coin in order, stopping at the first failure
pub async fn run<S>(
    source: &S,
    config: &CollectorConfig,
) -> Result<Vec<ExportSummary>, Box<dyn std::error::Error + Send + Sync>>
where
    S: MarketDataSource + ?Sized,
{
    let now = Utc::now();
    let mut summaries = Vec::with_capacity(config.coin_ids.len());

    for coin_id in &config.coin_ids {
        summaries.push(export_coin(source, config, coin_id, now).await?);
    }

    Ok(summaries)
}

//! Batch job: one OHLC series per (coin, day range), saved as a nested JSON document
//! `{ coin_id: { "<days>d": [[ts, o, h, l, c], ...] } }`.
//!
//! Rows are kept exactly as CoinGecko returned them.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde_json::Value;

use crate::config::CollectorConfig;
use crate::services::coingecko::MarketDataSource;
use crate::services::rate_limiter::MinIntervalLimiter;

pub type OhlcCollection = BTreeMap<String, BTreeMap<String, Vec<Value>>>;

pub fn range_label(days: u32) -> String {
    format!("{}d", days)
}

/// Fetch every (coin, range) pair sequentially, spaced by the limiter.
///
/// Failed or empty ranges are left out; every coin still gets an entry.
pub async fn collect<S>(
    source: &S,
    config: &CollectorConfig,
    limiter: &MinIntervalLimiter,
) -> OhlcCollection
where
    S: MarketDataSource + ?Sized,
{
    let mut collection = OhlcCollection::new();

    for coin_id in &config.coin_ids {
        tracing::info!("Fetching OHLC ranges for {}", coin_id);
        let mut by_range = BTreeMap::new();

        for &days in &config.day_ranges {
            limiter.acquire().await;

            match source.ohlc_raw(coin_id, &config.vs_currency, days).await {
                Ok(rows) if !rows.is_empty() => {
                    by_range.insert(range_label(days), rows);
                }
                Ok(_) => {
                    tracing::warn!("Empty {}d OHLC series for {}, skipping", days, coin_id);
                }
                Err(e) => {
                    tracing::error!("Failed to fetch {}d OHLC for {}: {}", days, coin_id, e);
                }
            }
        }

        collection.insert(coin_id.clone(), by_range);
    }

    collection
}

pub fn write_collection(
    path: &Path,
    collection: &OhlcCollection,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_string_pretty(collection)?;
    fs::write(path, json)?;

    Ok(())
}

pub async fn run<S>(
    source: &S,
    config: &CollectorConfig,
) -> Result<OhlcCollection, Box<dyn std::error::Error + Send + Sync>>
where
    S: MarketDataSource + ?Sized,
{
    let limiter = MinIntervalLimiter::new(config.poll_interval);
    let collection = collect(source, config, &limiter).await;

    let path = &config.output_paths.ohlc_json;
    write_collection(path, &collection)?;

    tracing::info!("All OHLC data saved to {}", path.display());

    Ok(collection)
}

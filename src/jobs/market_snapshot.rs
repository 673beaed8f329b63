//! Snapshot job: poll /coins/markets, append to the CSV store, refresh the JSON backup.
//!
//! When the live fetch fails the latest poll is read back from the CSV and
//! re-published as the backup. Neither path fails the process.

use chrono::Utc;
use serde_json::Value;

use crate::config::CollectorConfig;
use crate::models::market::MarketsQuery;
use crate::services::coingecko::MarketDataSource;
use crate::services::snapshot_store::{self, SnapshotStore};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotOutcome {
    /// Fresh data was fetched; `rows` were appended to the CSV
    Live { rows: usize },
    /// Live fetch failed; `rows` from the latest stored poll were re-published
    Fallback { rows: usize },
    NoData,
}

pub async fn run<S>(source: &S, config: &CollectorConfig) -> SnapshotOutcome
where
    S: MarketDataSource + ?Sized,
{
    let store = SnapshotStore::from_config(config);
    let poll_time = snapshot_store::poll_timestamp(Utc::now());
    let query = MarketsQuery::top_by_market_cap(&config.vs_currency, config.markets_per_page);

    poll_once(source, &store, &query, &poll_time).await
}

/// One poll cycle, with every row of this cycle tagged `poll_time`
pub async fn poll_once<S>(
    source: &S,
    store: &SnapshotStore,
    query: &MarketsQuery,
    poll_time: &str,
) -> SnapshotOutcome
where
    S: MarketDataSource + ?Sized,
{
    tracing::info!("=== Market snapshot poll {} ===", poll_time);

    match source.markets(query).await {
        Ok(entries) if !entries.is_empty() => {
            let rows = match store.append_poll(&entries, poll_time) {
                Ok(rows) => rows,
                Err(e) => {
                    tracing::error!("Failed to append snapshot CSV: {}", e);
                    0
                }
            };
            if let Err(e) = store.write_backup(poll_time, &Value::Array(entries)) {
                tracing::error!("Failed to write JSON backup: {}", e);
            }
            tracing::info!("Snapshot fetch and save complete");
            return SnapshotOutcome::Live { rows };
        }
        Ok(_) => {
            tracing::warn!("CoinGecko returned no market entries, trying local data");
        }
        Err(e) => {
            tracing::warn!("Live fetch failed ({}), trying local data", e);
        }
    }

    fallback(store, poll_time)
}

fn fallback(store: &SnapshotStore, poll_time: &str) -> SnapshotOutcome {
    let latest = match store.read_latest() {
        Ok(Some(latest)) => latest,
        Ok(None) => {
            tracing::error!("No data available from any source");
            return SnapshotOutcome::NoData;
        }
        Err(e) => {
            tracing::error!("Failed to read snapshot CSV: {}", e);
            tracing::error!("No data available from any source");
            return SnapshotOutcome::NoData;
        }
    };

    tracing::info!("Loaded {} rows from local snapshot", latest.len());

    match serde_json::to_value(&latest) {
        Ok(data) => {
            if let Err(e) = store.write_backup(poll_time, &data) {
                tracing::error!("Failed to write JSON backup: {}", e);
            }
        }
        Err(e) => tracing::error!("Failed to serialize local snapshot: {}", e),
    }

    SnapshotOutcome::Fallback { rows: latest.len() }
}

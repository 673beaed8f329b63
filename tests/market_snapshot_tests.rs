mod common;

use serde_json::json;
use std::collections::HashSet;

use coingecko_collector::config::BackupMode;
use coingecko_collector::jobs::market_snapshot::{self, SnapshotOutcome};
use coingecko_collector::models::market::MarketsQuery;
use coingecko_collector::services::snapshot_store::SnapshotStore;

use crate::common::{market_entries, test_config, FakeSource};

const POLL_1200: &str = "2024-01-01T12:00:00.000000Z";
const POLL_1205: &str = "2024-01-01T12:05:00.000000Z";
const POLL_1210: &str = "2024-01-01T12:10:00.000000Z";

fn store_for(dir: &std::path::Path) -> SnapshotStore {
    SnapshotStore::from_config(&test_config(dir))
}

#[tokio::test]
async fn test_live_poll_appends_and_backs_up() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_for(dir.path());
    let source = FakeSource::new().with_markets(Some(market_entries()));
    let query = MarketsQuery::top_by_market_cap("usd", 10);

    let outcome = market_snapshot::poll_once(&source, &store, &query, POLL_1200).await;

    assert_eq!(outcome, SnapshotOutcome::Live { rows: 3 });
    assert_eq!(source.calls(), vec!["markets:10"]);

    let backup = store.read_backup().unwrap().unwrap();
    assert_eq!(backup.timestamp, POLL_1200);
    // Full-fidelity payload, including fields the CSV does not keep
    assert_eq!(
        backup.data[0]["image"],
        json!("https://assets.coingecko.com/coins/images/1/large/bitcoin.png")
    );
}

#[tokio::test]
async fn test_two_polls_share_timestamp_per_cycle() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_for(dir.path());
    let source = FakeSource::new()
        .with_markets(Some(market_entries()))
        .with_markets(Some(market_entries()));
    let query = MarketsQuery::top_by_market_cap("usd", 10);

    market_snapshot::poll_once(&source, &store, &query, POLL_1200).await;
    market_snapshot::poll_once(&source, &store, &query, POLL_1205).await;

    let mut reader = csv::Reader::from_path(store.csv_path()).unwrap();
    let timestamps: Vec<String> = reader
        .records()
        .map(|r| r.unwrap()[0].to_string())
        .collect();

    assert_eq!(timestamps.len(), 6);
    let distinct: HashSet<&String> = timestamps.iter().collect();
    assert_eq!(distinct.len(), 2);
    assert_eq!(timestamps.iter().filter(|t| t.ends_with("12:00:00.000000")).count(), 3);

    let backup = store.read_backup().unwrap().unwrap();
    assert_eq!(backup.timestamp, POLL_1205);
}

#[tokio::test]
async fn test_failed_fetch_falls_back_to_latest_poll() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_for(dir.path());
    let entries = market_entries();
    let source = FakeSource::new()
        .with_markets(Some(entries[..1].to_vec()))
        .with_markets(Some(entries.clone()))
        .with_markets(None);
    let query = MarketsQuery::top_by_market_cap("usd", 10);

    market_snapshot::poll_once(&source, &store, &query, POLL_1200).await;
    market_snapshot::poll_once(&source, &store, &query, POLL_1205).await;
    let outcome = market_snapshot::poll_once(&source, &store, &query, POLL_1210).await;

    assert_eq!(outcome, SnapshotOutcome::Fallback { rows: 3 });

    // CSV is untouched by the fallback
    let content = std::fs::read_to_string(store.csv_path()).unwrap();
    assert_eq!(content.lines().count(), 1 + 1 + 3);

    let backup = store.read_backup().unwrap().unwrap();
    assert_eq!(backup.timestamp, POLL_1210);
    let data = backup.data.as_array().unwrap();
    assert_eq!(data.len(), 3);
    assert_eq!(data[1]["id"], json!("ethereum"));
    assert_eq!(data[1]["market_cap_rank"], json!(2));
    assert_eq!(data[1]["current_price"], json!(2300.5));
    assert_eq!(
        data[1]["image"],
        json!("https://assets.coingecko.com/coins/images/279/small/ethereum.png")
    );
    // null upstream value was stored as the numeric default
    assert_eq!(data[2]["price_change_percentage_24h"], json!(0.0));
}

#[tokio::test]
async fn test_empty_payload_uses_fallback() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_for(dir.path());
    let source = FakeSource::new()
        .with_markets(Some(market_entries()))
        .with_markets(Some(vec![]));
    let query = MarketsQuery::top_by_market_cap("usd", 10);

    market_snapshot::poll_once(&source, &store, &query, POLL_1200).await;
    let outcome = market_snapshot::poll_once(&source, &store, &query, POLL_1205).await;

    assert_eq!(outcome, SnapshotOutcome::Fallback { rows: 3 });
}

#[tokio::test]
async fn test_no_data_from_any_source() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_for(dir.path());
    let source = FakeSource::new().with_markets(None);
    let query = MarketsQuery::top_by_market_cap("usd", 10);

    let outcome = market_snapshot::poll_once(&source, &store, &query, POLL_1200).await;

    assert_eq!(outcome, SnapshotOutcome::NoData);
    assert!(!store.csv_path().exists());
    assert!(!store.backup_path().exists());
}

#[tokio::test]
async fn test_run_uses_config_paths_and_append_backup() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config(dir.path());
    config.backup_mode = BackupMode::Append;
    config.markets_per_page = 3;
    let source = FakeSource::new()
        .with_markets(Some(market_entries()))
        .with_markets(Some(market_entries()));

    assert_eq!(market_snapshot::run(&source, &config).await, SnapshotOutcome::Live { rows: 3 });
    assert_eq!(market_snapshot::run(&source, &config).await, SnapshotOutcome::Live { rows: 3 });

    assert_eq!(source.calls(), vec!["markets:3", "markets:3"]);
    assert!(config.output_paths.snapshot_csv.exists());

    let backups = std::fs::read_to_string(&config.output_paths.snapshot_backup).unwrap();
    assert_eq!(backups.lines().count(), 2);
}

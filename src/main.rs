use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use coingecko_collector::config::CollectorConfig;
use coingecko_collector::jobs::market_snapshot::{self, SnapshotOutcome};
use coingecko_collector::services::coingecko::CoinGeckoService;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,coingecko_collector=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = CollectorConfig::from_env()?;
    let coingecko = CoinGeckoService::from_config(&config)?;

    match market_snapshot::run(&coingecko, &config).await {
        SnapshotOutcome::Live { rows } => {
            tracing::info!(
                "Saved {} live rows to {}",
                rows,
                config.output_paths.snapshot_csv.display()
            );
        }
        SnapshotOutcome::Fallback { rows } => {
            tracing::info!("Re-published {} rows from local snapshot", rows);
        }
        SnapshotOutcome::NoData => {
            tracing::warn!("Nothing was published this run");
        }
    }

    Ok(())
}

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use coingecko_collector::config::CollectorConfig;
use coingecko_collector::jobs::ohlc_batch;
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

    tracing::info!(
        "Fetching OHLC for {} coin(s) x {} range(s), {:?} between requests",
        config.coin_ids.len(),
        config.day_ranges.len(),
        config.poll_interval
    );

    let collection = ohlc_batch::run(&coingecko, &config).await?;

    let series: usize = collection.values().map(|ranges| ranges.len()).sum();
    tracing::info!("Collected {} OHLC series", series);

    Ok(())
}

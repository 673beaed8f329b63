use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use coingecko_collector::config::CollectorConfig;
use coingecko_collector::jobs::market_chart_export;
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

    tracing::info!("Starting market chart export for {} coin(s)", config.coin_ids.len());

    let summaries = market_chart_export::run(&coingecko, &config).await?;

    tracing::info!("=== Export Complete ===");
    for summary in &summaries {
        tracing::info!(
            "{}: {} rows, {} with OHLC -> {}",
            summary.coin_id,
            summary.rows,
            summary.rows_with_ohlc,
            summary.path.display()
        );
    }

    Ok(())
}

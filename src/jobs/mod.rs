pub mod market_chart_export;
pub mod market_snapshot;
pub mod ohlc_batch;

pub mod market;
pub mod market_chart;

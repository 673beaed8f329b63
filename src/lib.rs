// src/lib.rs

pub mod config;

pub mod services {
    pub mod coingecko;
    pub mod rate_limiter;
    pub mod time_series;
    pub mod csv_export;
    pub mod snapshot_store;
    pub mod coin_images;
}

pub mod jobs;
pub mod models;

pub use config::CollectorConfig;

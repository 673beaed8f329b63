//! Aligns market_chart series with OHLC bars into exportable rows.
//!
//! Join key between series is the formatted timestamp: epoch milliseconds
//! truncated to whole seconds and rendered as `YYYY-MM-DD HH:MM:SS` in the
//! given time zone (local time for the exporter).

use chrono::{DateTime, Local, TimeZone};
use std::collections::HashMap;
use std::fmt::Display;

use crate::config::SeriesAlignment;
use crate::models::market_chart::{MarketChart, MergedRow, OhlcBar, OhlcFields, TimePoint};

pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn format_timestamp(timestamp_ms: i64) -> String {
    format_timestamp_in(timestamp_ms, &Local)
}

pub fn format_timestamp_in<Tz>(timestamp_ms: i64, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let secs = timestamp_ms / 1000;
    DateTime::from_timestamp(secs, 0)
        .map(|dt| dt.with_timezone(tz).format(TIME_FORMAT).to_string())
        .unwrap_or_else(|| "Invalid date".to_string())
}

/// Formatted time -> OHLC fields. Later bars overwrite earlier ones on the same key.
pub fn build_ohlc_index<Tz>(bars: &[OhlcBar], tz: &Tz) -> HashMap<String, OhlcFields>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let mut index = HashMap::with_capacity(bars.len());
    for bar in bars {
        index.insert(format_timestamp_in(bar.timestamp_ms, tz), OhlcFields::from(bar));
    }
    index
}

/// Pair the three series by position, keeping only the common prefix.
///
/// Row time comes from the price series; output order is price order.
pub fn merge_by_position<Tz>(
    prices: &[TimePoint],
    market_caps: &[TimePoint],
    total_volumes: &[TimePoint],
    ohlc: &[OhlcBar],
    tz: &Tz,
) -> Vec<MergedRow>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let ohlc_index = build_ohlc_index(ohlc, tz);

    prices
        .iter()
        .zip(market_caps)
        .zip(total_volumes)
        .map(|((price, cap), volume)| {
            let time = format_timestamp_in(price.timestamp_ms, tz);
            let fields = ohlc_index.get(&time);
            MergedRow::new(time, price.value, cap.value, volume.value).with_ohlc(fields)
        })
        .collect()
}

/// Join the three series on formatted timestamp.
///
/// A row is emitted for each price sample whose time is also present in the
/// market-cap and volume series. OHLC stays a left join.
pub fn join_by_timestamp<Tz>(
    prices: &[TimePoint],
    market_caps: &[TimePoint],
    total_volumes: &[TimePoint],
    ohlc: &[OhlcBar],
    tz: &Tz,
) -> Vec<MergedRow>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let ohlc_index = build_ohlc_index(ohlc, tz);
    let caps = index_values(market_caps, tz);
    let volumes = index_values(total_volumes, tz);

    prices
        .iter()
        .filter_map(|price| {
            let time = format_timestamp_in(price.timestamp_ms, tz);
            let cap = *caps.get(&time)?;
            let volume = *volumes.get(&time)?;
            let fields = ohlc_index.get(&time);
            Some(MergedRow::new(time, price.value, cap, volume).with_ohlc(fields))
        })
        .collect()
}

fn index_values<Tz>(series: &[TimePoint], tz: &Tz) -> HashMap<String, f64>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    series
        .iter()
        .map(|point| (format_timestamp_in(point.timestamp_ms, tz), point.value))
        .collect()
}

pub fn merge_market_chart_in<Tz>(
    chart: &MarketChart,
    ohlc: &[OhlcBar],
    alignment: SeriesAlignment,
    tz: &Tz,
) -> Vec<MergedRow>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    match alignment {
        SeriesAlignment::Position => merge_by_position(
            &chart.prices,
            &chart.market_caps,
            &chart.total_volumes,
            ohlc,
            tz,
        ),
        SeriesAlignment::Timestamp => join_by_timestamp(
            &chart.prices,
            &chart.market_caps,
            &chart.total_volumes,
            ohlc,
            tz,
        ),
    }
}

pub fn merge_market_chart(
    chart: &MarketChart,
    ohlc: &[OhlcBar],
    alignment: SeriesAlignment,
) -> Vec<MergedRow> {
    merge_market_chart_in(chart, ohlc, alignment, &Local)
}

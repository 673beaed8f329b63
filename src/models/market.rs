use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Column order of the snapshot CSV
pub const SNAPSHOT_HEADER: [&str; 12] = [
    "timestamp",
    "id",
    "symbol",
    "name",
    "current_price",
    "market_cap",
    "market_cap_rank",
    "price_change_percentage_24h",
    "high_24h",
    "low_24h",
    "total_volume",
    "last_updated",
];

/// Query parameters for GET /coins/markets
#[derive(Debug, Clone, PartialEq)]
pub struct MarketsQuery {
    pub vs_currency: String,
    pub order: String,
    pub per_page: u32,
    pub page: u32,
    pub sparkline: bool,
    pub price_change_percentage: String,
}

impl MarketsQuery {
    pub fn top_by_market_cap(vs_currency: &str, per_page: u32) -> Self {
        Self {
            vs_currency: vs_currency.to_string(),
            order: "market_cap_desc".to_string(),
            per_page,
            page: 1,
            sparkline: false,
            price_change_percentage: "24h".to_string(),
        }
    }

    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        vec![
            ("vs_currency", self.vs_currency.clone()),
            ("order", self.order.clone()),
            ("per_page", self.per_page.to_string()),
            ("page", self.page.to_string()),
            ("sparkline", self.sparkline.to_string()),
            ("price_change_percentage", self.price_change_percentage.clone()),
        ]
    }
}

/// One row of the append-only snapshot CSV
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshotRow {
    pub timestamp: String,
    pub id: String,
    pub symbol: String,
    pub name: String,
    pub current_price: f64,
    pub market_cap: f64,
    pub market_cap_rank: i64,
    pub price_change_percentage_24h: f64,
    pub high_24h: f64,
    pub low_24h: f64,
    pub total_volume: f64,
    pub last_updated: String,
}

impl MarketSnapshotRow {
    /// Build a row from a raw /coins/markets entry.
    ///
    /// Missing or null fields fall back to `""` for text and `0` for numbers.
    pub fn from_entry(entry: &Value, poll_timestamp: &str) -> Self {
        Self {
            timestamp: poll_timestamp.to_string(),
            id: text_field(entry, "id"),
            symbol: text_field(entry, "symbol"),
            name: text_field(entry, "name"),
            current_price: float_field(entry, "current_price"),
            market_cap: float_field(entry, "market_cap"),
            market_cap_rank: int_field(entry, "market_cap_rank"),
            price_change_percentage_24h: float_field(entry, "price_change_percentage_24h"),
            high_24h: float_field(entry, "high_24h"),
            low_24h: float_field(entry, "low_24h"),
            total_volume: float_field(entry, "total_volume"),
            last_updated: text_field(entry, "last_updated"),
        }
    }
}

fn text_field(entry: &Value, key: &str) -> String {
    match entry.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

fn float_field(entry: &Value, key: &str) -> f64 {
    entry.get(key).and_then(Value::as_f64).unwrap_or(0.0)
}

fn int_field(entry: &Value, key: &str) -> i64 {
    entry
        .get(key)
        .and_then(|v| v.as_i64().or_else(|| v.as_f64().map(|f| f as i64)))
        .unwrap_or(0)
}

/// A snapshot row read back from disk, re-typed and enriched for the dashboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatestMarketEntry {
    pub id: String,
    pub symbol: String,
    pub name: String,
    pub current_price: f64,
    pub market_cap: f64,
    pub market_cap_rank: i64,
    pub price_change_percentage_24h: f64,
    pub high_24h: f64,
    pub low_24h: f64,
    pub total_volume: f64,
    pub last_updated: String,
    pub image: String,
}

/// JSON backup document: `{ "timestamp": ..., "data": [...] }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotBackup {
    pub timestamp: String,
    pub data: Value,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_entry_full() {
        let entry = json!({
            "id": "bitcoin",
            "symbol": "btc",
            "name": "Bitcoin",
            "image": "https://example.com/btc.png",
            "current_price": 43250.12,
            "market_cap": 847000000000_u64,
            "market_cap_rank": 1,
            "price_change_percentage_24h": -1.25,
            "high_24h": 44000.0,
            "low_24h": 42800.5,
            "total_volume": 21000000000.0,
            "last_updated": "2024-01-01T12:00:00.000Z"
        });

        let row = MarketSnapshotRow::from_entry(&entry, "2024-01-01T12:00:05.000000Z");

        assert_eq!(row.timestamp, "2024-01-01T12:00:05.000000Z");
        assert_eq!(row.id, "bitcoin");
        assert_eq!(row.current_price, 43250.12);
        assert_eq!(row.market_cap, 847000000000.0);
        assert_eq!(row.market_cap_rank, 1);
        assert_eq!(row.price_change_percentage_24h, -1.25);
        assert_eq!(row.last_updated, "2024-01-01T12:00:00.000Z");
    }

    #[test]
    fn test_from_entry_missing_and_null_fields_default() {
        let entry = json!({
            "id": "newcoin",
            "market_cap_rank": null,
            "current_price": null
        });

        let row = MarketSnapshotRow::from_entry(&entry, "t");

        assert_eq!(row.id, "newcoin");
        assert_eq!(row.symbol, "");
        assert_eq!(row.name, "");
        assert_eq!(row.current_price, 0.0);
        assert_eq!(row.market_cap_rank, 0);
        assert_eq!(row.total_volume, 0.0);
        assert_eq!(row.last_updated, "");
    }

    #[test]
    fn test_markets_query_params() {
        let query = MarketsQuery::top_by_market_cap("usd", 10);
        let params = query.to_params();

        assert!(params.contains(&("order", "market_cap_desc".to_string())));
        assert!(params.contains(&("per_page", "10".to_string())));
        assert!(params.contains(&("sparkline", "false".to_string())));
        assert!(params.contains(&("price_change_percentage", "24h".to_string())));
    }
}

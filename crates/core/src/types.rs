//! Core data types for the cLab minute-factor engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Timestamp in milliseconds since Unix epoch (UTC).
pub type TimestampMs = i64;

/// Length of one aggregation bucket.
pub const MINUTE_MS: TimestampMs = 60_000;

/// Output columns of the minute bar table, in order.
pub const BAR_COLUMNS: [&str; 8] = [
    "minute",
    "open",
    "high",
    "low",
    "close",
    "volume_base",
    "volume_quote",
    "n_trades",
];

/// Output columns of the minute factor table, in order.
pub const FACTOR_COLUMNS: [&str; 13] = [
    "minute",
    "vwap",
    "volume_base",
    "volume_quote",
    "buy_base",
    "sell_base",
    "buy_quote",
    "sell_quote",
    "buy_sell_imbalance_base",
    "n_trades",
    "last_price",
    "high_price",
    "low_price",
];

/// Convert a timestamp to its minute boundary.
///
/// Floors toward negative infinity, so pre-epoch timestamps land in the
/// minute that contains them rather than the next one.
#[inline]
pub fn ts_to_minute(ts_ms: TimestampMs) -> TimestampMs {
    ts_ms.div_euclid(MINUTE_MS) * MINUTE_MS
}

/// Convert milliseconds since epoch to a UTC instant.
#[inline]
pub fn ms_to_datetime(ts_ms: TimestampMs) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_millis(ts_ms)
}

/// An aggregate trade exactly as the exchange reports it.
///
/// Field names follow the exchange wire format; price and quantity stay
/// decimal strings until normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawAggTrade {
    /// Aggregate trade id. Only used for pagination upstream.
    #[serde(rename = "a", default, skip_serializing_if = "Option::is_none")]
    pub agg_id: Option<i64>,
    /// Trade time in milliseconds.
    #[serde(rename = "T")]
    pub ts_ms: TimestampMs,
    /// Price as a decimal string.
    #[serde(rename = "p")]
    pub price: String,
    /// Quantity (base asset) as a decimal string.
    #[serde(rename = "q")]
    pub qty: String,
    /// Buyer was the maker, i.e. the aggressive side sold.
    #[serde(rename = "m")]
    pub buyer_is_maker: bool,
}

impl RawAggTrade {
    /// Build a raw record from typed values.
    pub fn new(ts_ms: TimestampMs, price: &str, qty: &str, buyer_is_maker: bool) -> Self {
        Self {
            agg_id: None,
            ts_ms,
            price: price.to_string(),
            qty: qty.to_string(),
            buyer_is_maker,
        }
    }
}

/// A normalized trade with typed fields and its minute bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    /// Arrival sequence number (position in the input batch).
    pub seq: usize,
    /// Trade time in milliseconds.
    pub ts_ms: TimestampMs,
    /// Trade time as a UTC instant.
    pub time: DateTime<Utc>,
    /// Minute bucket containing the trade (floor-truncated).
    pub minute: DateTime<Utc>,
    /// Trade price.
    pub price: f64,
    /// Quantity in base asset units.
    pub qty: f64,
    /// Quote amount, `price * qty`.
    pub quote: f64,
    /// Aggressive side was a sell.
    pub is_sell: bool,
}

impl Trade {
    /// Aggressive side was a buy.
    #[inline]
    pub fn is_buy(&self) -> bool {
        !self.is_sell
    }
}

/// 1-minute OHLCV bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar1m {
    /// Minute boundary (UTC).
    pub minute: DateTime<Utc>,
    /// Price of the first trade by arrival order.
    pub open: f64,
    /// Highest price.
    pub high: f64,
    /// Lowest price.
    pub low: f64,
    /// Price of the last trade by arrival order.
    pub close: f64,
    /// Sum of quantities.
    pub volume_base: f64,
    /// Sum of `price * qty`.
    pub volume_quote: f64,
    /// Number of trades.
    pub n_trades: u64,
}

impl Bar1m {
    /// Minute boundary in milliseconds.
    #[inline]
    pub fn ts_min(&self) -> TimestampMs {
        self.minute.timestamp_millis()
    }
}

/// Order-flow factors for one minute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MinuteFactors {
    /// Minute boundary (UTC).
    pub minute: DateTime<Utc>,
    /// Volume-weighted average price, `volume_quote / volume_base`.
    pub vwap: f64,
    pub volume_base: f64,
    pub volume_quote: f64,
    /// Base volume of aggressive buys.
    pub buy_base: f64,
    /// Base volume of aggressive sells.
    pub sell_base: f64,
    pub buy_quote: f64,
    pub sell_quote: f64,
    /// `buy_base - sell_base`.
    pub buy_sell_imbalance_base: f64,
    pub n_trades: u64,
    /// Price of the last trade by arrival order.
    pub last_price: f64,
    pub high_price: f64,
    pub low_price: f64,
}

impl MinuteFactors {
    /// Minute boundary in milliseconds.
    #[inline]
    pub fn ts_min(&self) -> TimestampMs {
        self.minute.timestamp_millis()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ts_to_minute() {
        // 2024-01-01 00:01:30.500 -> 2024-01-01 00:01:00.000
        let ts = 1704067290500i64;
        let minute = ts_to_minute(ts);
        assert_eq!(minute, 1704067260000);
    }

    #[test]
    fn test_ts_to_minute_exact_boundary() {
        assert_eq!(ts_to_minute(1704067260000), 1704067260000);
        assert_eq!(ts_to_minute(1704067319999), 1704067260000);
    }

    #[test]
    fn test_ts_to_minute_before_epoch() {
        // -0.5s belongs to the minute starting at -60s.
        assert_eq!(ts_to_minute(-500), -60_000);
        assert_eq!(ts_to_minute(-60_000), -60_000);
    }

    #[test]
    fn test_raw_trade_wire_format() {
        let json = r#"{"a":42,"p":"100.5","q":"0.25","T":1700000000000,"m":true}"#;
        let raw: RawAggTrade = serde_json::from_str(json).unwrap();
        assert_eq!(raw.agg_id, Some(42));
        assert_eq!(raw.ts_ms, 1_700_000_000_000);
        assert_eq!(raw.price, "100.5");
        assert_eq!(raw.qty, "0.25");
        assert!(raw.buyer_is_maker);
    }

    #[test]
    fn test_raw_trade_without_id() {
        let json = r#"{"p":"1","q":"2","T":0,"m":false}"#;
        let raw: RawAggTrade = serde_json::from_str(json).unwrap();
        assert_eq!(raw.agg_id, None);
    }

    #[test]
    fn test_bar_serializes_minute_as_utc_instant() {
        let bar = Bar1m {
            minute: ms_to_datetime(1_699_999_980_000).unwrap(),
            open: 1.0,
            high: 1.0,
            low: 1.0,
            close: 1.0,
            volume_base: 1.0,
            volume_quote: 1.0,
            n_trades: 1,
        };
        let value = serde_json::to_value(&bar).unwrap();
        assert_eq!(value["minute"], "2023-11-14T22:13:00Z");
        assert_eq!(bar.ts_min(), 1_699_999_980_000);
    }
}

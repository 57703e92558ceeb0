//! Minute order-flow factor aggregation.
//!
//! Aggregates normalized trades into per-minute factors: VWAP, buy/sell
//! split volumes, base-volume imbalance and price extrema.

use chrono::{DateTime, Utc};
use clab_core::{MinuteFactors, RawAggTrade, Result, Trade};
use clab_ingestion::normalize;
use std::collections::BTreeMap;
use tracing::debug;

/// Accumulator for order flow within a minute.
#[derive(Debug, Clone)]
struct MinuteAccumulator {
    buy_base: f64,
    sell_base: f64,
    buy_quote: f64,
    sell_quote: f64,
    n_trades: u64,
    /// (seq, price) of the latest-arrived trade.
    last: Option<(usize, f64)>,
    high: f64,
    low: f64,
}

impl Default for MinuteAccumulator {
    fn default() -> Self {
        Self {
            buy_base: 0.0,
            sell_base: 0.0,
            buy_quote: 0.0,
            sell_quote: 0.0,
            n_trades: 0,
            last: None,
            high: f64::NEG_INFINITY,
            low: f64::INFINITY,
        }
    }
}

impl MinuteAccumulator {
    fn add(&mut self, trade: &Trade) {
        if trade.is_buy() {
            self.buy_base += trade.qty;
            self.buy_quote += trade.quote;
        } else {
            self.sell_base += trade.qty;
            self.sell_quote += trade.quote;
        }
        if self.last.map_or(true, |(seq, _)| trade.seq > seq) {
            self.last = Some((trade.seq, trade.price));
        }
        self.high = self.high.max(trade.price);
        self.low = self.low.min(trade.price);
        self.n_trades += 1;
    }

    fn to_factors(&self, minute: DateTime<Utc>) -> Option<MinuteFactors> {
        let (_, last_price) = self.last?;
        let volume_base = self.buy_base + self.sell_base;
        let volume_quote = self.buy_quote + self.sell_quote;
        // True volume weighting; a zero-volume minute has no defined VWAP.
        let vwap = if volume_base > 0.0 {
            volume_quote / volume_base
        } else {
            f64::NAN
        };

        Some(MinuteFactors {
            minute,
            vwap,
            volume_base,
            volume_quote,
            buy_base: self.buy_base,
            sell_base: self.sell_base,
            buy_quote: self.buy_quote,
            sell_quote: self.sell_quote,
            buy_sell_imbalance_base: self.buy_base - self.sell_base,
            n_trades: self.n_trades,
            last_price,
            high_price: self.high,
            low_price: self.low,
        })
    }
}

/// Minute factor aggregator over a batch of trades.
#[derive(Debug, Default)]
pub struct MinuteFactorAggregator {
    /// Accumulators by minute.
    minutes: BTreeMap<DateTime<Utc>, MinuteAccumulator>,
}

impl MinuteFactorAggregator {
    /// Create a new aggregator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a normalized trade.
    pub fn add_trade(&mut self, trade: &Trade) {
        self.minutes.entry(trade.minute).or_default().add(trade);
    }

    /// Add multiple trades.
    pub fn add_trades(&mut self, trades: &[Trade]) {
        for trade in trades {
            self.add_trade(trade);
        }
    }

    /// Get factors for a specific minute.
    pub fn get_minute(&self, minute: DateTime<Utc>) -> Option<MinuteFactors> {
        self.minutes.get(&minute).and_then(|acc| acc.to_factors(minute))
    }

    /// Get the number of minutes tracked.
    pub fn minute_count(&self) -> usize {
        self.minutes.len()
    }

    /// Finalize every minute, ascending. The aggregator is left empty.
    pub fn finish(&mut self) -> Vec<MinuteFactors> {
        let mut rows: Vec<MinuteFactors> = std::mem::take(&mut self.minutes)
            .iter()
            .filter_map(|(&minute, acc)| acc.to_factors(minute))
            .collect();
        rows.sort_by_key(|r| r.minute);
        rows
    }

    /// Clear all data.
    pub fn clear(&mut self) {
        self.minutes.clear();
    }
}

/// Aggregate a full batch of normalized trades into minute factors.
pub fn aggregate_factors(trades: &[Trade]) -> Vec<MinuteFactors> {
    let mut agg = MinuteFactorAggregator::new();
    agg.add_trades(trades);
    let rows = agg.finish();
    debug!(trades = trades.len(), minutes = rows.len(), "aggregated minute factors");
    rows
}

/// Normalize raw records and aggregate them into minute factors.
pub fn factors_from_raw(raw: &[RawAggTrade]) -> Result<Vec<MinuteFactors>> {
    let trades = normalize(raw)?;
    Ok(aggregate_factors(&trades))
}

//! Minute bar building from normalized trades.
//!
//! Builds 1-minute OHLCV bars. Open and close follow arrival order (the
//! trade's sequence number), not trade time, so a batch whose timestamps are
//! out of order inside a minute still opens on the first record received.

use crate::normalizer::normalize;
use chrono::{DateTime, Utc};
use clab_core::{Bar1m, RawAggTrade, Result, Trade};
use std::collections::BTreeMap;
use tracing::debug;

/// Builder for 1-minute bars from normalized trades.
#[derive(Debug, Default)]
pub struct BarBuilder {
    /// Bars being built, keyed by minute.
    bars: BTreeMap<DateTime<Utc>, BarInProgress>,
}

/// A bar that's currently being built.
#[derive(Debug, Clone)]
struct BarInProgress {
    minute: DateTime<Utc>,
    /// (seq, price) of the earliest-arrived trade.
    first: Option<(usize, f64)>,
    /// (seq, price) of the latest-arrived trade.
    last: Option<(usize, f64)>,
    high: f64,
    low: f64,
    volume_base: f64,
    volume_quote: f64,
    n_trades: u64,
}

impl BarInProgress {
    fn new(minute: DateTime<Utc>) -> Self {
        Self {
            minute,
            first: None,
            last: None,
            high: f64::NEG_INFINITY,
            low: f64::INFINITY,
            volume_base: 0.0,
            volume_quote: 0.0,
            n_trades: 0,
        }
    }

    fn add_trade(&mut self, trade: &Trade) {
        if self.first.map_or(true, |(seq, _)| trade.seq < seq) {
            self.first = Some((trade.seq, trade.price));
        }
        if self.last.map_or(true, |(seq, _)| trade.seq > seq) {
            self.last = Some((trade.seq, trade.price));
        }
        self.high = self.high.max(trade.price);
        self.low = self.low.min(trade.price);
        self.volume_base += trade.qty;
        self.volume_quote += trade.quote;
        self.n_trades += 1;
    }

    fn to_bar(&self) -> Option<Bar1m> {
        let (_, open) = self.first?;
        let (_, close) = self.last?;

        Some(Bar1m {
            minute: self.minute,
            open,
            high: self.high,
            low: self.low,
            close,
            volume_base: self.volume_base,
            volume_quote: self.volume_quote,
            n_trades: self.n_trades,
        })
    }
}

impl BarBuilder {
    /// Create a new bar builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a normalized trade.
    pub fn add_trade(&mut self, trade: &Trade) {
        self.bars
            .entry(trade.minute)
            .or_insert_with(|| BarInProgress::new(trade.minute))
            .add_trade(trade);
    }

    /// Add multiple normalized trades.
    pub fn add_trades(&mut self, trades: &[Trade]) {
        for trade in trades {
            self.add_trade(trade);
        }
    }

    /// Finalize every pending bar, ascending by minute.
    ///
    /// The builder is left empty.
    pub fn finish(&mut self) -> Vec<Bar1m> {
        let mut bars: Vec<Bar1m> = std::mem::take(&mut self.bars)
            .values()
            .filter_map(BarInProgress::to_bar)
            .collect();

        // BTreeMap already yields minutes in order; stable sort keeps that
        // guarantee explicit for callers that merge on other keys.
        bars.sort_by_key(|b| b.minute);
        bars
    }

    /// Get the number of bars currently being built.
    pub fn pending_bar_count(&self) -> usize {
        self.bars.len()
    }

    /// Clear all state.
    pub fn clear(&mut self) {
        self.bars.clear();
    }
}

/// Aggregate a full batch of normalized trades into minute bars.
pub fn aggregate_bars(trades: &[Trade]) -> Vec<Bar1m> {
    let mut builder = BarBuilder::new();
    builder.add_trades(trades);
    let bars = builder.finish();
    debug!(trades = trades.len(), bars = bars.len(), "aggregated minute bars");
    bars
}

/// Normalize raw records and aggregate them into minute bars.
pub fn bars_from_raw(raw: &[RawAggTrade]) -> Result<Vec<Bar1m>> {
    let trades = normalize(raw)?;
    Ok(aggregate_bars(&trades))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use clab_core::{ms_to_datetime, ts_to_minute};

    fn make_trade(seq: usize, ts_ms: i64, price: f64, qty: f64) -> Trade {
        Trade {
            seq,
            ts_ms,
            time: ms_to_datetime(ts_ms).unwrap(),
            minute: ms_to_datetime(ts_to_minute(ts_ms)).unwrap(),
            price,
            qty,
            quote: price * qty,
            is_sell: false,
        }
    }

    #[test]
    fn test_single_trade() {
        let bars = aggregate_bars(&[make_trade(0, 60_000 + 30_000, 50000.5, 0.1)]);

        assert_eq!(bars.len(), 1);
        assert_eq!(bars[0].ts_min(), 60_000);
        assert_abs_diff_eq!(bars[0].open, 50000.5);
        assert_abs_diff_eq!(bars[0].close, 50000.5);
        assert_abs_diff_eq!(bars[0].volume_base, 0.1);
        assert_eq!(bars[0].n_trades, 1);
    }

    #[test]
    fn test_multiple_trades_same_minute() {
        let trades = vec![
            make_trade(0, 60_000 + 10_000, 50000.0, 0.1), // Open
            make_trade(1, 60_000 + 20_000, 50005.0, 0.2), // High
            make_trade(2, 60_000 + 30_000, 49995.0, 0.1), // Low
            make_trade(3, 60_000 + 50_000, 50001.0, 0.1), // Close
        ];
        let bars = aggregate_bars(&trades);

        assert_eq!(bars.len(), 1);
        assert_abs_diff_eq!(bars[0].open, 50000.0);
        assert_abs_diff_eq!(bars[0].high, 50005.0);
        assert_abs_diff_eq!(bars[0].low, 49995.0);
        assert_abs_diff_eq!(bars[0].close, 50001.0);
        assert_abs_diff_eq!(bars[0].volume_base, 0.5, epsilon = 1e-10);
        assert_eq!(bars[0].n_trades, 4);
    }

    #[test]
    fn test_volume_quote() {
        let bars = aggregate_bars(&[
            make_trade(0, 60_000 + 10_000, 50000.0, 100.0),
            make_trade(1, 60_000 + 20_000, 50010.0, 200.0),
        ]);
        assert_abs_diff_eq!(bars[0].volume_quote, 100.0 * 50000.0 + 200.0 * 50010.0, epsilon = 1e-6);
    }

    #[test]
    fn test_open_close_follow_arrival_order() {
        // Second record carries an earlier timestamp but arrived later.
        let trades = vec![
            make_trade(0, 60_000 + 40_000, 101.0, 1.0),
            make_trade(1, 60_000 + 5_000, 99.0, 1.0),
            make_trade(2, 60_000 + 20_000, 100.0, 1.0),
        ];
        let bars = aggregate_bars(&trades);

        assert_abs_diff_eq!(bars[0].open, 101.0);
        assert_abs_diff_eq!(bars[0].close, 100.0);
    }

    #[test]
    fn test_sequence_number_wins_over_slice_order() {
        // Slice order disagrees with sequence numbers; sequence numbers decide.
        let trades = vec![
            make_trade(5, 60_000 + 1_000, 10.0, 1.0),
            make_trade(2, 60_000 + 2_000, 20.0, 1.0),
            make_trade(9, 60_000 + 3_000, 30.0, 1.0),
            make_trade(7, 60_000 + 4_000, 40.0, 1.0),
        ];
        let bars = aggregate_bars(&trades);

        assert_abs_diff_eq!(bars[0].open, 20.0);
        assert_abs_diff_eq!(bars[0].close, 30.0);
    }

    #[test]
    fn test_multiple_minutes_sorted() {
        // Minute 2 arrives before minute 1.
        let bars = aggregate_bars(&[
            make_trade(0, 120_000 + 30_000, 50010.5, 0.2),
            make_trade(1, 60_000 + 30_000, 50000.5, 0.1),
        ]);

        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].ts_min(), 60_000);
        assert_eq!(bars[1].ts_min(), 120_000);
    }

    #[test]
    fn test_empty_input() {
        assert!(aggregate_bars(&[]).is_empty());
    }

    #[test]
    fn test_ohlc_invariant() {
        let trades: Vec<Trade> = (0..200)
            .map(|i| {
                let price = 100.0 + ((i * 37) % 23) as f64 * 0.5;
                make_trade(i, (i as i64) * 1_700, price, 0.01 + (i % 7) as f64)
            })
            .collect();

        for bar in aggregate_bars(&trades) {
            assert!(bar.low <= bar.open && bar.open <= bar.high);
            assert!(bar.low <= bar.close && bar.close <= bar.high);
            assert!(bar.volume_base > 0.0);
        }
    }

    #[test]
    fn test_builder_finish_drains() {
        let mut builder = BarBuilder::new();
        builder.add_trade(&make_trade(0, 60_000, 1.0, 1.0));
        assert_eq!(builder.pending_bar_count(), 1);

        let bars = builder.finish();
        assert_eq!(bars.len(), 1);
        assert_eq!(builder.pending_bar_count(), 0);
    }

    #[test]
    fn test_bars_from_raw() {
        let raw = vec![
            RawAggTrade::new(1_700_000_000_000, "100", "1", false),
            RawAggTrade::new(1_700_000_001_000, "110", "2", true),
            RawAggTrade::new(1_700_000_060_000, "120", "1", false),
        ];
        let bars = bars_from_raw(&raw).unwrap();

        assert_eq!(bars.len(), 2);
        assert_abs_diff_eq!(bars[0].open, 100.0);
        assert_abs_diff_eq!(bars[0].close, 110.0);
        assert_abs_diff_eq!(bars[0].volume_base, 3.0);
        assert_abs_diff_eq!(bars[0].volume_quote, 320.0);
        assert_eq!(bars[0].n_trades, 2);
        assert_eq!(bars[1].n_trades, 1);
    }

    #[test]
    fn test_bars_from_raw_propagates_parse_error() {
        let raw = vec![RawAggTrade::new(0, "x", "1", false)];
        assert!(bars_from_raw(&raw).is_err());
    }
}

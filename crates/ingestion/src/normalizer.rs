//! Raw aggregate-trade normalization.
//!
//! Parses the exchange's string-typed fields into numbers, derives the
//! aggressive side and assigns each trade to its minute bucket. Every record
//! is stamped with its position in the batch so later stages can recover
//! arrival order without relying on container iteration order.

use clab_core::{ms_to_datetime, ts_to_minute, Error, RawAggTrade, Result, Trade};
use tracing::debug;

/// Parse a decimal field, rejecting anything that is not a finite number.
fn parse_decimal(index: usize, field: &'static str, text: &str) -> Result<f64> {
    let value: f64 = text
        .trim()
        .parse()
        .map_err(|e| Error::parse(index, field, format!("{e}: {text:?}")))?;
    if !value.is_finite() {
        return Err(Error::parse(index, field, format!("non-finite value: {text:?}")));
    }
    Ok(value)
}

/// Normalize a single raw record.
///
/// `seq` becomes the trade's arrival sequence number and is also used to
/// locate the record in error messages.
pub fn normalize_one(seq: usize, raw: &RawAggTrade) -> Result<Trade> {
    let time = ms_to_datetime(raw.ts_ms)
        .ok_or_else(|| Error::parse(seq, "T", format!("timestamp out of range: {}", raw.ts_ms)))?;
    let minute = ms_to_datetime(ts_to_minute(raw.ts_ms))
        .ok_or_else(|| Error::parse(seq, "T", format!("timestamp out of range: {}", raw.ts_ms)))?;

    let price = parse_decimal(seq, "p", &raw.price)?;
    let qty = parse_decimal(seq, "q", &raw.qty)?;

    Ok(Trade {
        seq,
        ts_ms: raw.ts_ms,
        time,
        minute,
        price,
        qty,
        quote: price * qty,
        // Buyer was maker -> the taker sold.
        is_sell: raw.buyer_is_maker,
    })
}

/// Normalize a batch of raw records.
///
/// Any malformed record fails the whole batch; there is no partial recovery.
pub fn normalize(raw: &[RawAggTrade]) -> Result<Vec<Trade>> {
    let trades = raw
        .iter()
        .enumerate()
        .map(|(seq, r)| normalize_one(seq, r))
        .collect::<Result<Vec<_>>>()?;

    debug!(records = trades.len(), "normalized aggregate trades");
    Ok(trades)
}

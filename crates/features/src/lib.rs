//! Feature computation for the cLab minute-factor engine.
//!
//! This crate handles:
//! - Minute order-flow factors (VWAP, buy/sell split, imbalance)
//! - Price extrema and last price per minute

pub mod minute_factors;

pub use minute_factors::{aggregate_factors, factors_from_raw, MinuteFactorAggregator};

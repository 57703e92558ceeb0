//! Data ingestion and normalization for the cLab minute-factor engine.
//!
//! This crate handles:
//! - Reading raw aggregate trades from JSON
//! - Trade normalization (numeric parsing, aggressive side, minute bucket)
//! - Minute bar building

pub mod bar_builder;
pub mod jsonl;
pub mod normalizer;

pub use bar_builder::{aggregate_bars, bars_from_raw, BarBuilder};
pub use jsonl::{parse_json_array, read_jsonl};
pub use normalizer::{normalize, normalize_one};

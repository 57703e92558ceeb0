//! Factor evaluation for the cLab minute-factor engine.
//!
//! This crate provides:
//! - A columnar minute table with bars/factors conversion and joins
//! - Forward returns at a configurable horizon
//! - Pearson and Spearman correlation over complete observations
//! - Quantile performance tables with duplicate-edge collapsing

pub mod correlation;
pub mod evaluator;
pub mod quantile;
pub mod returns;
pub mod table;

pub use correlation::{corr_scalar, CorrelationMethod};
pub use evaluator::{evaluate, EvaluationResult, FactorEvaluator};
pub use quantile::{quantile_table, QuantileRow};
pub use returns::forward_return;
pub use table::Table;

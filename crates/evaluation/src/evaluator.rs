//! Factor evaluation.
//!
//! Scores a factor column against forward returns of a price column:
//! information coefficient (Pearson), rank IC (Spearman) and a quantile
//! performance table.

use crate::correlation::{corr_scalar, CorrelationMethod};
use crate::quantile::{quantile_table, QuantileRow};
use crate::returns::forward_return;
use crate::table::Table;
use clab_core::config::EvaluationConfig;
use clab_core::{Error, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Outcome of one factor evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub factor_col: String,
    pub price_col: String,
    /// Look-ahead in minute buckets.
    pub horizon: usize,
    /// Information coefficient. NaN when undefined.
    pub ic: f64,
    /// Rank information coefficient. NaN when undefined.
    pub rankic: f64,
    pub quantiles: Vec<QuantileRow>,
}

/// Check every precondition before touching the data.
fn validate(
    table: &Table,
    factor_col: &str,
    price_col: &str,
    horizon: usize,
    n_quantiles: usize,
) -> Result<()> {
    if table.is_empty() {
        return Err(Error::validation("table is empty"));
    }
    if table.column(factor_col).is_none() {
        return Err(Error::validation(format!("missing factor_col={factor_col}")));
    }
    if table.column(price_col).is_none() {
        return Err(Error::validation(format!("missing price_col={price_col}")));
    }
    if horizon == 0 {
        return Err(Error::validation("horizon must be > 0"));
    }
    if n_quantiles == 0 {
        return Err(Error::validation("n_quantiles must be > 0"));
    }
    if !table.is_sorted_by_minute() {
        return Err(Error::validation("table must be sorted ascending by minute"));
    }
    Ok(())
}

/// Evaluate `factor_col` against the `horizon`-minute forward return of
/// `price_col`.
///
/// Rows without a forward return (the trailing `horizon` rows) or with a NaN
/// factor are excluded from every statistic. Thin data yields NaN
/// correlations and a reduced or empty quantile table, not an error.
pub fn evaluate(
    table: &Table,
    factor_col: &str,
    price_col: &str,
    horizon: usize,
    n_quantiles: usize,
) -> Result<EvaluationResult> {
    validate(table, factor_col, price_col, horizon, n_quantiles)?;

    let (Some(factor), Some(prices)) = (table.column(factor_col), table.column(price_col)) else {
        return Err(Error::validation("missing evaluation column"));
    };

    let fwd: Vec<f64> = forward_return(prices, horizon)?
        .into_iter()
        .map(|r| r.unwrap_or(f64::NAN))
        .collect();

    let ic = corr_scalar(factor, &fwd, CorrelationMethod::Pearson);
    let rankic = corr_scalar(factor, &fwd, CorrelationMethod::Spearman);
    let quantiles = quantile_table(factor, &fwd, n_quantiles);

    debug!(
        rows = table.len(),
        buckets = quantiles.len(),
        "factor evaluation inputs"
    );
    info!(factor_col, price_col, horizon, ic, rankic, "evaluated factor");

    Ok(EvaluationResult {
        factor_col: factor_col.to_string(),
        price_col: price_col.to_string(),
        horizon,
        ic,
        rankic,
        quantiles,
    })
}

/// Evaluator bound to configured defaults.
#[derive(Debug, Clone, Default)]
pub struct FactorEvaluator {
    config: EvaluationConfig,
}

impl FactorEvaluator {
    /// Create an evaluator from configuration.
    pub fn from_config(config: &EvaluationConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config: config.clone(),
        })
    }

    /// Configured defaults.
    pub fn config(&self) -> &EvaluationConfig {
        &self.config
    }

    /// Evaluate a factor column with the configured price column, horizon
    /// and quantile count.
    pub fn evaluate(&self, table: &Table, factor_col: &str) -> Result<EvaluationResult> {
        evaluate(
            table,
            factor_col,
            &self.config.price_col,
            self.config.horizon,
            self.config.n_quantiles,
        )
    }

    /// Evaluate several factor columns. Stops at the first failing column.
    pub fn evaluate_many(&self, table: &Table, factor_cols: &[&str]) -> Result<Vec<EvaluationResult>> {
        factor_cols
            .iter()
            .map(|col| self.evaluate(table, col))
            .collect()
    }
}

//! PyO3 bindings for the cLab minute-factor engine.
//!
//! Exposes the Rust implementations to the Python pipelines and dashboard:
//! - Minute bar and minute factor aggregation
//! - Factor evaluation

use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;
use std::collections::HashMap;

use chrono::SecondsFormat;
use clab_core::{
    ms_to_datetime, Bar1m as RustBar1m, Error as RustError, MinuteFactors as RustMinuteFactors,
    RawAggTrade as RustRawAggTrade,
};
use clab_evaluation::{
    evaluate as rust_evaluate, EvaluationResult as RustEvaluationResult,
    QuantileRow as RustQuantileRow, Table,
};

fn to_py_err(err: RustError) -> PyErr {
    match err {
        RustError::Validation(_) | RustError::Parse { .. } | RustError::Config(_) => {
            PyValueError::new_err(err.to_string())
        }
        _ => PyRuntimeError::new_err(err.to_string()),
    }
}

// ============================================================================
// Python-exposed Types
// ============================================================================

/// A raw aggregate trade as reported by the exchange.
#[pyclass]
#[derive(Clone)]
pub struct AggTrade {
    #[pyo3(get, set)]
    pub ts_ms: i64,
    #[pyo3(get, set)]
    pub price: String,
    #[pyo3(get, set)]
    pub qty: String,
    #[pyo3(get, set)]
    pub buyer_is_maker: bool,
    #[pyo3(get, set)]
    pub agg_id: Option<i64>,
}

#[pymethods]
impl AggTrade {
    #[new]
    #[pyo3(signature = (ts_ms, price, qty, buyer_is_maker, agg_id=None))]
    fn new(ts_ms: i64, price: String, qty: String, buyer_is_maker: bool, agg_id: Option<i64>) -> Self {
        AggTrade { ts_ms, price, qty, buyer_is_maker, agg_id }
    }

    fn __repr__(&self) -> String {
        format!(
            "AggTrade(T={}, p={}, q={}, m={})",
            self.ts_ms, self.price, self.qty, self.buyer_is_maker
        )
    }
}

impl From<AggTrade> for RustRawAggTrade {
    fn from(t: AggTrade) -> Self {
        RustRawAggTrade {
            agg_id: t.agg_id,
            ts_ms: t.ts_ms,
            price: t.price,
            qty: t.qty,
            buyer_is_maker: t.buyer_is_maker,
        }
    }
}

/// 1-minute OHLCV bar.
#[pyclass]
#[derive(Clone)]
pub struct Bar1m {
    #[pyo3(get)]
    pub ts_min: i64,
    #[pyo3(get)]
    pub minute: String,
    #[pyo3(get)]
    pub open: f64,
    #[pyo3(get)]
    pub high: f64,
    #[pyo3(get)]
    pub low: f64,
    #[pyo3(get)]
    pub close: f64,
    #[pyo3(get)]
    pub volume_base: f64,
    #[pyo3(get)]
    pub volume_quote: f64,
    #[pyo3(get)]
    pub n_trades: u64,
}

impl From<RustBar1m> for Bar1m {
    fn from(b: RustBar1m) -> Self {
        Bar1m {
            ts_min: b.ts_min(),
            minute: b.minute.to_rfc3339_opts(SecondsFormat::Secs, true),
            open: b.open,
            high: b.high,
            low: b.low,
            close: b.close,
            volume_base: b.volume_base,
            volume_quote: b.volume_quote,
            n_trades: b.n_trades,
        }
    }
}

/// Order-flow factors for one minute.
#[pyclass]
#[derive(Clone)]
pub struct MinuteFactors {
    #[pyo3(get)]
    pub ts_min: i64,
    #[pyo3(get)]
    pub minute: String,
    #[pyo3(get)]
    pub vwap: f64,
    #[pyo3(get)]
    pub volume_base: f64,
    #[pyo3(get)]
    pub volume_quote: f64,
    #[pyo3(get)]
    pub buy_base: f64,
    #[pyo3(get)]
    pub sell_base: f64,
    #[pyo3(get)]
    pub buy_quote: f64,
    #[pyo3(get)]
    pub sell_quote: f64,
    #[pyo3(get)]
    pub buy_sell_imbalance_base: f64,
    #[pyo3(get)]
    pub n_trades: u64,
    #[pyo3(get)]
    pub last_price: f64,
    #[pyo3(get)]
    pub high_price: f64,
    #[pyo3(get)]
    pub low_price: f64,
}

impl From<RustMinuteFactors> for MinuteFactors {
    fn from(f: RustMinuteFactors) -> Self {
        MinuteFactors {
            ts_min: f.ts_min(),
            minute: f.minute.to_rfc3339_opts(SecondsFormat::Secs, true),
            vwap: f.vwap,
            volume_base: f.volume_base,
            volume_quote: f.volume_quote,
            buy_base: f.buy_base,
            sell_base: f.sell_base,
            buy_quote: f.buy_quote,
            sell_quote: f.sell_quote,
            buy_sell_imbalance_base: f.buy_sell_imbalance_base,
            n_trades: f.n_trades,
            last_price: f.last_price,
            high_price: f.high_price,
            low_price: f.low_price,
        }
    }
}

/// One row of the quantile performance table.
#[pyclass]
#[derive(Clone)]
pub struct QuantileRow {
    #[pyo3(get)]
    pub quantile: usize,
    #[pyo3(get)]
    pub mean_fwd_ret: f64,
    #[pyo3(get)]
    pub count: usize,
}

impl From<RustQuantileRow> for QuantileRow {
    fn from(q: RustQuantileRow) -> Self {
        QuantileRow {
            quantile: q.quantile,
            mean_fwd_ret: q.mean_fwd_ret,
            count: q.count,
        }
    }
}

/// Outcome of one factor evaluation.
#[pyclass]
#[derive(Clone)]
pub struct EvaluationResult {
    #[pyo3(get)]
    pub factor_col: String,
    #[pyo3(get)]
    pub price_col: String,
    #[pyo3(get)]
    pub horizon: usize,
    #[pyo3(get)]
    pub ic: f64,
    #[pyo3(get)]
    pub rankic: f64,
    #[pyo3(get)]
    pub quantiles: Vec<QuantileRow>,
}

#[pymethods]
impl EvaluationResult {
    fn __repr__(&self) -> String {
        format!(
            "EvaluationResult(factor_col={}, horizon={}, ic={:.4}, rankic={:.4}, quantiles={})",
            self.factor_col,
            self.horizon,
            self.ic,
            self.rankic,
            self.quantiles.len()
        )
    }
}

impl From<RustEvaluationResult> for EvaluationResult {
    fn from(r: RustEvaluationResult) -> Self {
        EvaluationResult {
            factor_col: r.factor_col,
            price_col: r.price_col,
            horizon: r.horizon,
            ic: r.ic,
            rankic: r.rankic,
            quantiles: r.quantiles.into_iter().map(|q| q.into()).collect(),
        }
    }
}

// ============================================================================
// Python-exposed Functions
// ============================================================================

fn to_raw(trades: Vec<AggTrade>) -> Vec<RustRawAggTrade> {
    trades.into_iter().map(|t| t.into()).collect()
}

/// Aggregate raw trades into 1-minute bars.
#[pyfunction]
fn aggregate_bars(trades: Vec<AggTrade>) -> PyResult<Vec<Bar1m>> {
    let bars = clab_ingestion::bars_from_raw(&to_raw(trades)).map_err(to_py_err)?;
    Ok(bars.into_iter().map(|b| b.into()).collect())
}

/// Aggregate raw trades into 1-minute order-flow factors.
#[pyfunction]
fn aggregate_factors(trades: Vec<AggTrade>) -> PyResult<Vec<MinuteFactors>> {
    let rows = clab_features::factors_from_raw(&to_raw(trades)).map_err(to_py_err)?;
    Ok(rows.into_iter().map(|r| r.into()).collect())
}

/// Evaluate a factor column against forward returns.
///
/// `columns` maps column names to values aligned with `minutes_ms`.
#[pyfunction]
#[pyo3(signature = (minutes_ms, columns, factor_col, price_col="close", horizon=60, n_quantiles=5))]
fn evaluate(
    minutes_ms: Vec<i64>,
    columns: HashMap<String, Vec<f64>>,
    factor_col: &str,
    price_col: &str,
    horizon: usize,
    n_quantiles: usize,
) -> PyResult<EvaluationResult> {
    let minutes = minutes_ms
        .iter()
        .map(|&ts| {
            ms_to_datetime(ts)
                .ok_or_else(|| PyValueError::new_err(format!("minute out of range: {ts}")))
        })
        .collect::<PyResult<Vec<_>>>()?;

    let mut table = Table::new(minutes);
    for (name, values) in columns {
        table = table.with_column(name, values).map_err(to_py_err)?;
    }

    rust_evaluate(&table, factor_col, price_col, horizon, n_quantiles)
        .map(|r| r.into())
        .map_err(to_py_err)
}

// ============================================================================
// Module Definition
// ============================================================================

/// cLab engine - Rust minute-factor engine for Python.
#[pymodule]
fn clab_engine(m: &Bound<'_, PyModule>) -> PyResult<()> {
    // Types
    m.add_class::<AggTrade>()?;
    m.add_class::<Bar1m>()?;
    m.add_class::<MinuteFactors>()?;
    m.add_class::<QuantileRow>()?;
    m.add_class::<EvaluationResult>()?;

    // Functions
    m.add_function(wrap_pyfunction!(aggregate_bars, m)?)?;
    m.add_function(wrap_pyfunction!(aggregate_factors, m)?)?;
    m.add_function(wrap_pyfunction!(evaluate, m)?)?;

    Ok(())
}

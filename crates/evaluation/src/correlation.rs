//! Linear and rank correlation over pairwise-complete observations.

use serde::{Deserialize, Serialize};
use statrs::statistics::{Data, OrderStatistics, RankTieBreaker, Statistics};

/// Below this many complete pairs a correlation is reported as NaN.
pub const MIN_CORR_PAIRS: usize = 3;

/// Correlation method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CorrelationMethod {
    /// Linear correlation of the raw values.
    Pearson,
    /// Pearson correlation of average ranks.
    Spearman,
}

/// Keep only index positions where both values are present (not NaN).
pub fn complete_pairs(a: &[f64], b: &[f64]) -> (Vec<f64>, Vec<f64>) {
    a.iter()
        .zip(b)
        .filter(|(x, y)| !x.is_nan() && !y.is_nan())
        .map(|(&x, &y)| (x, y))
        .unzip()
}

/// Pearson correlation of equal-length, NaN-free series.
///
/// NaN when there are fewer than [`MIN_CORR_PAIRS`] points or either series
/// has zero variance.
pub fn pearson(a: &[f64], b: &[f64]) -> f64 {
    let n = a.len().min(b.len());
    if n < MIN_CORR_PAIRS {
        return f64::NAN;
    }
    let (a, b) = (&a[..n], &b[..n]);

    let sd_a = a.iter().std_dev();
    let sd_b = b.iter().std_dev();
    let denom = sd_a * sd_b;
    if !(denom > 0.0) {
        return f64::NAN;
    }

    let r = a.iter().covariance(b.iter()) / denom;
    r.clamp(-1.0, 1.0)
}

/// Average ranks (1-based, ties share the mean of their positions).
pub fn average_ranks(values: &[f64]) -> Vec<f64> {
    Data::new(values.to_vec()).ranks(RankTieBreaker::Average)
}

/// Spearman rank correlation of equal-length, NaN-free series.
pub fn spearman(a: &[f64], b: &[f64]) -> f64 {
    if a.len().min(b.len()) < MIN_CORR_PAIRS {
        return f64::NAN;
    }
    pearson(&average_ranks(a), &average_ranks(b))
}

/// Correlation between two aligned series, dropping any position where
/// either side is NaN first.
pub fn corr_scalar(a: &[f64], b: &[f64], method: CorrelationMethod) -> f64 {
    let (a, b) = complete_pairs(a, b);
    match method {
        CorrelationMethod::Pearson => pearson(&a, &b),
        CorrelationMethod::Spearman => spearman(&a, &b),
    }
}

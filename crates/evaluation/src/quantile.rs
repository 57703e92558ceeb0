//! Equal-count quantile bucketing of a factor against forward returns.
//!
//! Edges are the empirical quantiles at `k / n` (linear interpolation
//! between order statistics). Repeated edges collapse, so a factor with few
//! distinct values yields fewer buckets instead of an error. Buckets are
//! right-closed; the lowest one also includes the minimum.

use crate::correlation::complete_pairs;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// One row of the quantile performance table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuantileRow {
    /// Bucket index, 0-based, ascending by factor value.
    pub quantile: usize,
    /// Mean forward return of the bucket.
    pub mean_fwd_ret: f64,
    /// Observations in the bucket.
    pub count: usize,
}

/// Empirical quantile of sorted data with linear interpolation.
fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    if lo == hi {
        sorted[lo]
    } else {
        sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
    }
}

/// Bucket edges for `n_quantiles` equal-count buckets, duplicates removed.
///
/// Returns an empty vector when `values` is empty or `n_quantiles` is 0.
pub fn quantile_edges(values: &[f64], n_quantiles: usize) -> Vec<f64> {
    if values.is_empty() || n_quantiles == 0 {
        return Vec::new();
    }
    let mut sorted = values.to_vec();
    sorted.sort_by_key(|&v| OrderedFloat(v));

    let mut edges: Vec<f64> = (0..=n_quantiles)
        .map(|k| quantile_sorted(&sorted, k as f64 / n_quantiles as f64))
        .collect();
    edges.dedup();
    edges
}

/// Bucket index of `value` given ascending, distinct `edges`.
fn bucket_of(edges: &[f64], value: f64) -> usize {
    let n_buckets = edges.len() - 1;
    let above = edges.partition_point(|&e| e < value);
    above.saturating_sub(1).min(n_buckets - 1)
}

/// Mean forward return per factor quantile.
///
/// Rows where either the factor or the forward return is NaN are dropped
/// first. If fewer than two distinct edges remain (no data, or a constant
/// factor) the table is empty.
pub fn quantile_table(factor: &[f64], fwd_ret: &[f64], n_quantiles: usize) -> Vec<QuantileRow> {
    let (factor, fwd_ret) = complete_pairs(factor, fwd_ret);

    let edges = quantile_edges(&factor, n_quantiles);
    if edges.len() < 2 {
        return Vec::new();
    }
    let n_buckets = edges.len() - 1;
    if n_buckets < n_quantiles {
        warn!(
            requested = n_quantiles,
            realized = n_buckets,
            "duplicate quantile edges collapsed"
        );
    }

    let mut sums = vec![0.0; n_buckets];
    let mut counts = vec![0usize; n_buckets];
    for (&f, &r) in factor.iter().zip(&fwd_ret) {
        let b = bucket_of(&edges, f);
        sums[b] += r;
        counts[b] += 1;
    }

    sums.into_iter()
        .zip(counts)
        .enumerate()
        .filter(|(_, (_, count))| *count > 0)
        .map(|(quantile, (sum, count))| QuantileRow {
            quantile,
            mean_fwd_ret: sum / count as f64,
            count,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_edges_linear_interpolation() {
        let edges = quantile_edges(&[4.0, 1.0, 3.0, 2.0], 2);
        assert_eq!(edges, vec![1.0, 2.5, 4.0]);
    }

    #[test]
    fn test_equal_count_buckets() {
        let factor: Vec<f64> = (1..=10).map(|v| v as f64).collect();
        let fwd: Vec<f64> = factor.iter().map(|v| v / 100.0).collect();

        let table = quantile_table(&factor, &fwd, 5);
        assert_eq!(table.len(), 5);
        for (i, row) in table.iter().enumerate() {
            assert_eq!(row.quantile, i);
            assert_eq!(row.count, 2);
        }
        // Bucket 0 holds factor 1 and 2.
        assert_abs_diff_eq!(table[0].mean_fwd_ret, 0.015, epsilon = 1e-12);
        assert_abs_diff_eq!(table[4].mean_fwd_ret, 0.095, epsilon = 1e-12);
    }

    #[test]
    fn test_duplicate_edges_reduce_bucket_count() {
        // Mostly zeros: edges are [0, 0, 0, 0, 1.2, 3] -> [0, 1.2, 3].
        let factor = [0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 2.0, 3.0];
        let fwd = [0.1; 10];

        let table = quantile_table(&factor, &fwd, 5);
        assert_eq!(table.len(), 2);
        // The zeros and 1.0 land in the first bucket (minimum is included).
        assert_eq!(table[0].quantile, 0);
        assert_eq!(table[0].count, 8);
        assert_eq!(table[1].quantile, 1);
        assert_eq!(table[1].count, 2);
    }

    #[test]
    fn test_constant_factor_gives_empty_table() {
        let table = quantile_table(&[5.0; 8], &[0.01; 8], 4);
        assert!(table.is_empty());
    }

    #[test]
    fn test_nan_rows_dropped() {
        let factor = [1.0, 2.0, f64::NAN, 3.0, 4.0];
        let fwd = [0.1, f64::NAN, 0.5, 0.3, 0.4];

        let table = quantile_table(&factor, &fwd, 2);
        let total: usize = table.iter().map(|r| r.count).sum();
        assert_eq!(total, 3);
    }

    #[test]
    fn test_empty_input() {
        assert!(quantile_table(&[], &[], 5).is_empty());
        assert!(quantile_edges(&[1.0, 2.0], 0).is_empty());
    }

    #[test]
    fn test_bucket_boundaries_right_closed() {
        let edges = [0.0, 1.0, 2.0];
        assert_eq!(bucket_of(&edges, 0.0), 0);
        assert_eq!(bucket_of(&edges, 1.0), 0);
        assert_eq!(bucket_of(&edges, 1.5), 1);
        assert_eq!(bucket_of(&edges, 2.0), 1);
    }
}

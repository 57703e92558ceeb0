//! Forward returns.

use clab_core::{Error, Result};

/// Simple forward return at `horizon` rows ahead: `p[i + h] / p[i] - 1`.
///
/// The trailing `horizon` rows have no look-ahead price and are `None`.
pub fn forward_return(prices: &[f64], horizon: usize) -> Result<Vec<Option<f64>>> {
    if horizon == 0 {
        return Err(Error::validation("horizon must be > 0"));
    }

    Ok((0..prices.len())
        .map(|i| {
            i.checked_add(horizon)
                .and_then(|j| prices.get(j))
                .map(|&ahead| ahead / prices[i] - 1.0)
        })
        .collect())
}

//! Columnar minute table.
//!
//! A minimal in-memory frame keyed by minute: one `minute` key column plus
//! any number of named `f64` columns. Bars and factor rows convert into it
//! with their full column set even when there are no rows, and two tables
//! can be inner-joined on minute to form the evaluation input.

use chrono::{DateTime, Utc};
use clab_core::{Bar1m, Error, MinuteFactors, Result, BAR_COLUMNS, FACTOR_COLUMNS};
use std::collections::HashMap;

/// Name of the key column.
pub const MINUTE_COLUMN: &str = "minute";

/// Columnar table keyed by minute.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    minutes: Vec<DateTime<Utc>>,
    columns: Vec<(String, Vec<f64>)>,
}

impl Table {
    /// Create a table with only the key column.
    pub fn new(minutes: Vec<DateTime<Utc>>) -> Self {
        Self {
            minutes,
            columns: Vec::new(),
        }
    }

    /// Add or replace a value column.
    pub fn with_column(mut self, name: impl Into<String>, values: Vec<f64>) -> Result<Self> {
        let name = name.into();
        if name == MINUTE_COLUMN {
            return Err(Error::validation("`minute` is the key column and cannot be replaced"));
        }
        if values.len() != self.minutes.len() {
            return Err(Error::validation(format!(
                "column `{name}` has {} rows, table has {}",
                values.len(),
                self.minutes.len()
            )));
        }
        self.put(name, values);
        Ok(self)
    }

    fn put(&mut self, name: String, values: Vec<f64>) {
        match self.columns.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = values,
            None => self.columns.push((name, values)),
        }
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.minutes.len()
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.minutes.is_empty()
    }

    /// The key column.
    pub fn minutes(&self) -> &[DateTime<Utc>] {
        &self.minutes
    }

    /// Values of a named column.
    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.columns
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_slice())
    }

    /// Whether a column exists (the key column counts).
    pub fn has_column(&self, name: &str) -> bool {
        name == MINUTE_COLUMN || self.column(name).is_some()
    }

    /// Column names, key column first.
    pub fn column_names(&self) -> Vec<&str> {
        std::iter::once(MINUTE_COLUMN)
            .chain(self.columns.iter().map(|(n, _)| n.as_str()))
            .collect()
    }

    /// Whether minutes are strictly ascending.
    pub fn is_sorted_by_minute(&self) -> bool {
        self.minutes.windows(2).all(|w| w[0] < w[1])
    }

    /// Build a table from minute bars.
    pub fn from_bars(bars: &[Bar1m]) -> Self {
        let mut table = Self::new(bars.iter().map(|b| b.minute).collect());
        for &name in &BAR_COLUMNS[1..] {
            let values = bars
                .iter()
                .map(|b| match name {
                    "open" => b.open,
                    "high" => b.high,
                    "low" => b.low,
                    "close" => b.close,
                    "volume_base" => b.volume_base,
                    "volume_quote" => b.volume_quote,
                    _ => b.n_trades as f64,
                })
                .collect();
            table.put(name.to_string(), values);
        }
        table
    }

    /// Build a table from minute factor rows.
    pub fn from_factors(rows: &[MinuteFactors]) -> Self {
        let mut table = Self::new(rows.iter().map(|r| r.minute).collect());
        for &name in &FACTOR_COLUMNS[1..] {
            let values = rows
                .iter()
                .map(|r| match name {
                    "vwap" => r.vwap,
                    "volume_base" => r.volume_base,
                    "volume_quote" => r.volume_quote,
                    "buy_base" => r.buy_base,
                    "sell_base" => r.sell_base,
                    "buy_quote" => r.buy_quote,
                    "sell_quote" => r.sell_quote,
                    "buy_sell_imbalance_base" => r.buy_sell_imbalance_base,
                    "n_trades" => r.n_trades as f64,
                    "last_price" => r.last_price,
                    "high_price" => r.high_price,
                    _ => r.low_price,
                })
                .collect();
            table.put(name.to_string(), values);
        }
        table
    }

    /// Inner join on minute.
    ///
    /// Rows keep this table's order. When both sides carry a column with the
    /// same name, this table's column wins.
    pub fn inner_join(&self, other: &Table) -> Table {
        let index: HashMap<DateTime<Utc>, usize> = other
            .minutes
            .iter()
            .enumerate()
            .map(|(j, m)| (*m, j))
            .collect();

        let pairs: Vec<(usize, usize)> = self
            .minutes
            .iter()
            .enumerate()
            .filter_map(|(i, m)| index.get(m).map(|&j| (i, j)))
            .collect();

        let mut joined = Table::new(pairs.iter().map(|&(i, _)| self.minutes[i]).collect());
        for (name, values) in &self.columns {
            joined.put(name.clone(), pairs.iter().map(|&(i, _)| values[i]).collect());
        }
        for (name, values) in &other.columns {
            if joined.column(name).is_none() {
                joined.put(name.clone(), pairs.iter().map(|&(_, j)| values[j]).collect());
            }
        }
        joined
    }
}

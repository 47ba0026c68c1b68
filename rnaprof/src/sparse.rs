//! Sparse score tables for the dynamic-programming passes.

use super::logsumexp::{LogSumExp, NEG_INF};
use rustc_hash::FxHashMap;

/// Two-dimensional sparse store of log-space scores.
///
/// The outer axis is dense over the right endpoint `j`; each column maps a
/// left endpoint `i` to a score. Absent cells read as [`NEG_INF`], and the
/// sentinel itself is never stored, so membership doubles as "some
/// derivation reached this cell".
#[derive(Clone, Debug, Default)]
pub struct SparseTable {
    columns: Vec<FxHashMap<usize, f64>>,
}

impl SparseTable {
    /// Constructs an empty table with no columns.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops all contents and re-shapes the table to `n` empty columns.
    pub fn resize(&mut self, n: usize) {
        self.columns.clear();
        self.columns.resize_with(n, FxHashMap::default);
    }

    /// Drops all contents and columns.
    pub fn clear(&mut self) {
        self.columns.clear();
    }

    /// Log-adds `score` into the `(i, j)` cell and returns the stored value.
    /// Sentinel scores leave the table untouched.
    pub fn update_sum(&mut self, lse: LogSumExp, i: usize, j: usize, score: f64) -> f64 {
        if score <= NEG_INF {
            return self.get(i, j);
        }
        let cell = self.columns[j].entry(i).or_insert(NEG_INF);
        *cell = lse.lse(*cell, score);
        *cell
    }

    /// Score at `(i, j)`, or [`NEG_INF`] when no derivation reached it.
    #[must_use]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.columns[j].get(&i).copied().unwrap_or(NEG_INF)
    }

    /// Whether any derivation reached `(i, j)`.
    #[must_use]
    pub fn contains(&self, i: usize, j: usize) -> bool {
        self.columns[j].contains_key(&i)
    }

    /// All states with right endpoint `j`.
    #[must_use]
    pub fn column(&self, j: usize) -> &FxHashMap<usize, f64> {
        &self.columns[j]
    }

    /// Mutable access to the states with right endpoint `j`.
    pub fn column_mut(&mut self, j: usize) -> &mut FxHashMap<usize, f64> {
        &mut self.columns[j]
    }

    /// Snapshot of column `j`, detached from the table's borrows so the
    /// caller can keep writing while walking the states.
    #[must_use]
    pub fn states(&self, j: usize) -> Vec<(usize, f64)> {
        self.columns[j].iter().map(|(&i, &s)| (i, s)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::assert_approx_eq;

    #[test]
    fn absent_cells_read_as_sentinel() {
        let mut table = SparseTable::new();
        table.resize(4);
        assert_eq!(table.get(0, 3), NEG_INF);
        assert!(!table.contains(0, 3));
    }

    #[test]
    fn update_sum_accumulates() {
        let mode = LogSumExp::Legacy;
        let mut table = SparseTable::new();
        table.resize(4);
        assert_approx_eq!(f64, table.update_sum(mode, 1, 3, -2.0), -2.0, ulps = 2);
        let expected = ((-2.0_f64).exp() + (-3.0_f64).exp()).ln();
        assert_approx_eq!(f64, table.update_sum(mode, 1, 3, -3.0), expected, ulps = 4);
        assert!(table.contains(1, 3));
        assert_eq!(table.column(3).len(), 1);
    }

    #[test]
    fn sentinel_updates_do_not_materialise() {
        let mode = LogSumExp::Legacy;
        let mut table = SparseTable::new();
        table.resize(2);
        table.update_sum(mode, 0, 1, NEG_INF);
        assert!(!table.contains(0, 1));
    }

    #[test]
    fn resize_drops_contents() {
        let mut table = SparseTable::new();
        table.resize(2);
        table.update_sum(LogSumExp::Legacy, 0, 1, 1.0);
        table.resize(5);
        assert!(!table.contains(0, 1));
        assert!(table.column(4).is_empty());
    }
}

//! Fixed-bin histogram of position errors.

use serde::{Deserialize, Serialize};

/// Number of position-error bins.
pub const BIN_COUNT: usize = 1000;
/// Width of one bin in meters.
pub const BIN_WIDTH: f64 = 0.01;

/// Histogram of position errors over `[0, BIN_COUNT * BIN_WIDTH]` meters.
///
/// Bins are half-open `[edge_i, edge_{i+1})` except the last one, which also
/// contains its right edge. Errors outside the range are not binned and are
/// reported through [`ErrorHistogram::exceeding`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorHistogram {
    /// `BIN_COUNT + 1` bin edges in meters.
    pub bin_edges: Vec<f64>,
    /// `BIN_COUNT` counts.
    pub counts: Vec<usize>,
    /// Number of errors the histogram was built from, binned or not.
    pub total: usize,
}

impl ErrorHistogram {
    pub fn from_errors(errors: &[f64]) -> Self {
        let bin_edges: Vec<f64> = (0..=BIN_COUNT).map(|i| BIN_WIDTH * i as f64).collect();
        let first = bin_edges[0];
        let last = bin_edges[BIN_COUNT];

        let mut counts = vec![0_usize; BIN_COUNT];
        for &error in errors {
            if error < first || error > last || error.is_nan() {
                continue;
            }
            let idx = bin_edges.partition_point(|&edge| edge <= error) - 1;
            counts[idx.min(BIN_COUNT - 1)] += 1;
        }

        ErrorHistogram {
            bin_edges,
            counts,
            total: errors.len(),
        }
    }

    /// Number of errors that landed in a bin.
    pub fn binned(&self) -> usize {
        self.counts.iter().sum()
    }

    /// Number of errors beyond the last bin edge.
    pub fn exceeding(&self) -> usize {
        self.total - self.binned()
    }

    /// Upper range of the histogram in meters.
    pub fn max_edge(&self) -> f64 {
        self.bin_edges[self.bin_edges.len() - 1]
    }

    /// Cumulative share of all errors up to and including each bin.
    pub fn cumulative_ratio(&self) -> Vec<f64> {
        let total = self.total as f64;
        let mut running = 0_usize;
        self.counts
            .iter()
            .map(|count| {
                running += count;
                if self.total == 0 {
                    0.0
                } else {
                    running as f64 / total
                }
            })
            .collect()
    }
}

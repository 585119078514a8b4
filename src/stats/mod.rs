//! Order statistics over raw coverage arrays.
//!
//! Conventions, applied identically to every source and region of a run so
//! that statistics columns stay comparable:
//!
//! - quartiles use the lower nearest-rank rule on a sorted copy,
//!   `q(p) = sorted[floor(p * (n - 1))]`, which is the same lower-middle
//!   tie-break the median sampler uses;
//! - the standard deviation is the population form (divides by `n`).

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CoverageStatistics {
    pub min: u32,
    pub q1: u32,
    pub median: u32,
    pub q3: u32,
    pub max: u32,
    pub mean: f64,
    pub stddev: f64,
}

impl CoverageStatistics {
    /// Summarize a coverage array. Returns `None` for an empty array.
    ///
    /// The input is copied before sorting and never modified.
    pub fn compute(coverage: &[u32]) -> Option<Self> {
        if coverage.is_empty() {
            return None;
        }

        let mut sorted = coverage.to_vec();
        sorted.sort_unstable();

        #[allow(clippy::cast_precision_loss)] // Coverage arrays are far below 2^52 values
        let n = sorted.len() as f64;
        let mean = sorted.iter().map(|&v| f64::from(v)).sum::<f64>() / n;
        let variance = sorted
            .iter()
            .map(|&v| (f64::from(v) - mean).powi(2))
            .sum::<f64>()
            / n;

        Some(Self {
            min: sorted[0],
            q1: lower_rank(&sorted, 1, 4),
            median: lower_rank(&sorted, 1, 2),
            q3: lower_rank(&sorted, 3, 4),
            max: sorted[sorted.len() - 1],
            mean,
            stddev: variance.sqrt(),
        })
    }

    /// Tab-prefixed fields in column order: min, q1, median, q3, max, mean, stddev
    pub fn tsv_fields(&self) -> String {
        format!(
            "\t{}\t{}\t{}\t{}\t{}\t{:.2}\t{:.2}",
            self.min, self.q1, self.median, self.q3, self.max, self.mean, self.stddev
        )
    }
}

/// Value at rank `floor(num / den * (n - 1))` of a sorted slice
fn lower_rank(sorted: &[u32], num: usize, den: usize) -> u32 {
    sorted[(sorted.len() - 1) * num / den]
}

//! Per-treatment summaries.
//!
//! Each treatment gets its mean, its own standard error, the raw values and a
//! five-number summary for box plots.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::letters::LetterGroup;
use crate::observation::TreatmentId;

/// Five-number summary used to draw a box plot.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BoxPlot {
    /// Smallest value.
    pub min: f64,
    /// 25th percentile.
    pub q1: f64,
    /// 50th percentile.
    pub median: f64,
    /// 75th percentile.
    pub q3: f64,
    /// Largest value.
    pub max: f64,
}

impl BoxPlot {
    /// Compute the five-number summary of `values`.
    ///
    /// Percentiles use linear interpolation between nearest ranks. An empty
    /// slice gives all zeros.
    #[must_use]
    pub fn from_values(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self::default();
        }

        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);

        Self {
            min: sorted[0],
            q1: percentile_sorted(&sorted, 25.0),
            median: percentile_sorted(&sorted, 50.0),
            q3: percentile_sorted(&sorted, 75.0),
            max: sorted[sorted.len() - 1],
        }
    }

    /// Interquartile range (q3 − q1).
    #[must_use]
    pub fn iqr(&self) -> f64 {
        self.q3 - self.q1
    }
}

/// Percentile of an already sorted, non-empty slice.
fn percentile_sorted(sorted: &[f64], percentile: f64) -> f64 {
    let n = sorted.len();
    if n == 1 {
        return sorted[0];
    }

    let rank = percentile / 100.0 * (n - 1) as f64;
    let lower_idx = rank.floor() as usize;
    let upper_idx = (lower_idx + 1).min(n - 1);
    let fraction = rank - lower_idx as f64;

    sorted[lower_idx] + fraction * (sorted[upper_idx] - sorted[lower_idx])
}

/// Summary of one treatment within an assessment.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TreatmentSummary {
    /// The treatment.
    pub treatment: TreatmentId,
    /// Arithmetic mean of the treatment's values.
    pub mean: f64,
    /// Standard error of the mean: sample standard deviation / sqrt(n), or 0
    /// with fewer than two values.
    pub std_error: f64,
    /// Number of values.
    pub count: usize,
    /// Raw values in input order.
    pub values: Vec<f64>,
    /// Box-plot statistics of the values.
    pub box_plot: BoxPlot,
    /// Significance group, or not applicable.
    pub letter_group: LetterGroup,
}

impl TreatmentSummary {
    /// Summarise the values of one treatment. The letter group starts out as
    /// not applicable.
    #[must_use]
    pub fn from_values(treatment: TreatmentId, values: Vec<f64>) -> Self {
        let count = values.len();
        let mean = if count > 0 {
            values.iter().sum::<f64>() / count as f64
        } else {
            0.0
        };

        let std_error = if count > 1 {
            let variance =
                values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (count - 1) as f64;
            (variance / count as f64).sqrt()
        } else {
            0.0
        };

        Self {
            treatment,
            mean,
            std_error,
            count,
            box_plot: BoxPlot::from_values(&values),
            values,
            letter_group: LetterGroup::NotApplicable,
        }
    }
}

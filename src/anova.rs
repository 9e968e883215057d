//! ANOVA (Analysis of Variance) for randomized complete block designs.
//!
//! Partitions the total variation of one assessment into block, treatment and
//! residual components, then tests the treatment effect against the residual.

use std::collections::BTreeMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::config::ResidualDf;
use crate::distribution::DistributionOracle;
use crate::observation::ObservationSet;

/// Fixed significance level of the treatment F test.
pub const SIGNIFICANCE_LEVEL: f64 = 0.05;

/// One line of the ANOVA table.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AnovaEntry {
    /// Sum of squares.
    pub sum_of_squares: f64,
    /// Degrees of freedom.
    pub degrees_of_freedom: usize,
    /// Mean square (SS / df, or 0 when df is 0).
    pub mean_square: f64,
}

impl AnovaEntry {
    fn new(sum_of_squares: f64, degrees_of_freedom: usize) -> Self {
        let mean_square = if degrees_of_freedom > 0 {
            sum_of_squares / degrees_of_freedom as f64
        } else {
            0.0
        };
        Self {
            sum_of_squares,
            degrees_of_freedom,
            mean_square,
        }
    }
}

/// Complete RCBD ANOVA result for one assessment.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AnovaResult {
    /// Mean of all observations.
    pub grand_mean: f64,
    /// Number of observations analysed.
    pub observations: usize,
    /// Block (replicate) line.
    pub blocks: AnovaEntry,
    /// Treatment line.
    pub treatments: AnovaEntry,
    /// Residual line. The sum of squares is the remainder of the partition and
    /// may be slightly negative under severe imbalance.
    pub residual: AnovaEntry,
    /// Total sum of squares.
    pub total_ss: f64,
    /// Total degrees of freedom (n − 1).
    pub total_df: usize,
    /// F statistic for the treatment effect (0 when it cannot be formed).
    pub f_statistic: f64,
    /// Upper-tail p-value of the F statistic (1 when the test cannot be run).
    pub p_value: f64,
    /// Whether `p_value < 0.05`.
    pub significant: bool,
    /// Residual standard deviation as a percentage of the grand mean.
    pub coefficient_of_variation: f64,
}

impl AnovaResult {
    /// Residual sum of squares for display, with rounding-induced negatives
    /// shown as zero.
    #[must_use]
    pub fn reported_residual_ss(&self) -> f64 {
        self.residual.sum_of_squares.max(0.0)
    }

    /// Residual mean square for display, with negatives shown as zero.
    #[must_use]
    pub fn reported_residual_ms(&self) -> f64 {
        self.residual.mean_square.max(0.0)
    }

    /// Whether the treatment effect could not be tested: no treatment or
    /// residual degrees of freedom, or no residual variance.
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        self.treatments.degrees_of_freedom == 0
            || self.residual.degrees_of_freedom == 0
            || self.residual.mean_square <= 0.0
    }
}

/// Calculate the RCBD ANOVA table.
///
/// # Arguments
/// * `set` - Observations of one assessment date and trait
/// * `residual_df` - Residual degrees of freedom policy
/// * `oracle` - Source of the F distribution
///
/// # Algorithm
/// With grand total T, count n and correction factor CF = T²/n:
/// 1. Grand mean = T / n
/// 2. Total SS = Σy² − CF
/// 3. Block SS = Σ(blockTotal² / blockN) − CF
/// 4. Treatment SS = Σ(treatmentTotal² / treatmentN) − CF
/// 5. Residual SS = Total SS − Block SS − Treatment SS
/// 6. df: blocks b − 1, treatments t − 1, residual per `residual_df`, total n − 1
/// 7. Mean squares = SS / df (0 when df = 0)
/// 8. F = MS_treatment / MS_residual (0 when MS_residual ≤ 0)
/// 9. p = P(F > f); 1 when either df is 0 or F ≤ 0
/// 10. Significant when p < 0.05
/// 11. CV = sqrt(MS_residual) / grand mean × 100
///
/// Degenerate designs never fail; they fall back to `F = 0, p = 1`. An empty
/// set produces an all-zero table with `p = 1`.
pub fn calculate_anova<O>(set: &ObservationSet, residual_df: ResidualDf, oracle: &O) -> AnovaResult
where
    O: DistributionOracle + ?Sized,
{
    let n = set.len();
    if n == 0 {
        return AnovaResult {
            p_value: 1.0,
            ..AnovaResult::default()
        };
    }

    // Grand total and uncorrected sum of squares
    let mut grand_total = 0.0;
    let mut sum_sq = 0.0;
    let mut block_totals: BTreeMap<_, (f64, usize)> = BTreeMap::new();
    let mut treatment_totals: BTreeMap<_, (f64, usize)> = BTreeMap::new();

    for obs in set {
        let y = obs.value();
        grand_total += y;
        sum_sq += y * y;

        let block = block_totals.entry(obs.block()).or_insert((0.0, 0));
        block.0 += y;
        block.1 += 1;

        let treatment = treatment_totals.entry(obs.treatment()).or_insert((0.0, 0));
        treatment.0 += y;
        treatment.1 += 1;
    }

    let n_f = n as f64;
    let correction = grand_total * grand_total / n_f;
    let grand_mean = grand_total / n_f;

    let total_ss = sum_sq - correction;
    let block_ss = factor_ss(&block_totals, correction);
    let treatment_ss = factor_ss(&treatment_totals, correction);
    let residual_ss = total_ss - block_ss - treatment_ss;

    let num_blocks = block_totals.len();
    let num_treatments = treatment_totals.len();
    let block_df = num_blocks - 1;
    let treatment_df = num_treatments - 1;
    let total_df = n - 1;
    let error_df = match residual_df {
        ResidualDf::Balanced => block_df * treatment_df,
        ResidualDf::FromObservations => total_df.saturating_sub(block_df + treatment_df),
    };

    let blocks = AnovaEntry::new(block_ss, block_df);
    let treatments = AnovaEntry::new(treatment_ss, treatment_df);
    let residual = AnovaEntry::new(residual_ss, error_df);

    if residual_ss < 0.0 {
        tracing::debug!(residual_ss, "residual sum of squares is negative; reported as zero");
    }

    let f_statistic = if residual.mean_square > 0.0 {
        treatments.mean_square / residual.mean_square
    } else {
        0.0
    };

    let p_value = if treatment_df == 0 || error_df == 0 || f_statistic <= 0.0 {
        1.0
    } else {
        oracle
            .f_sf(f_statistic, treatment_df as f64, error_df as f64)
            .clamp(0.0, 1.0)
    };

    let coefficient_of_variation = if residual.mean_square > 0.0 && grand_mean != 0.0 {
        residual.mean_square.sqrt() / grand_mean * 100.0
    } else {
        0.0
    };

    let result = AnovaResult {
        grand_mean,
        observations: n,
        blocks,
        treatments,
        residual,
        total_ss,
        total_df,
        f_statistic,
        p_value,
        significant: p_value < SIGNIFICANCE_LEVEL,
        coefficient_of_variation,
    };

    if result.is_degenerate() {
        tracing::debug!(
            treatments = num_treatments,
            blocks = num_blocks,
            residual_df = error_df,
            "degenerate design; treatment effect not tested"
        );
    }

    result
}

/// SS for one factor: Σ(total² / count) − CF.
fn factor_ss<K>(totals: &BTreeMap<K, (f64, usize)>, correction: f64) -> f64 {
    totals
        .values()
        .map(|&(total, count)| total * total / count as f64)
        .sum::<f64>()
        - correction
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distribution::IncompleteBeta;
    use crate::observation::PlotRecord;

    fn set_from_rows(rows: &[&[f64]]) -> ObservationSet {
        // rows[treatment][block]
        let records = rows.iter().enumerate().flat_map(|(t, row)| {
            row.iter()
                .enumerate()
                .map(move |(b, &v)| PlotRecord::new(t as u32, b as u32, v))
        });
        ObservationSet::from_records(records)
    }

    fn scenario_a() -> ObservationSet {
        set_from_rows(&[
            &[4.8, 5.2, 5.1, 4.9],
            &[5.3, 4.9, 5.0, 5.2],
            &[8.1, 7.8, 8.2, 7.9],
        ])
    }

    #[test]
    fn test_anova_balanced_design() {
        let anova = calculate_anova(&scenario_a(), ResidualDf::Balanced, &IncompleteBeta);

        assert_eq!(anova.observations, 12);
        assert!((anova.grand_mean - 72.4 / 12.0).abs() < 1e-12);

        assert!((anova.total_ss - 23.526_666_666_666_7).abs() < 1e-9);
        assert!((anova.treatments.sum_of_squares - 23.226_666_666_666_7).abs() < 1e-9);
        assert!((anova.blocks.sum_of_squares - 0.033_333_333_333_3).abs() < 1e-9);
        assert!((anova.residual.sum_of_squares - 0.266_666_666_666_7).abs() < 1e-9);

        assert_eq!(anova.blocks.degrees_of_freedom, 3);
        assert_eq!(anova.treatments.degrees_of_freedom, 2);
        assert_eq!(anova.residual.degrees_of_freedom, 6);
        assert_eq!(anova.total_df, 11);

        assert!((anova.residual.mean_square - 0.044_444_444_444_4).abs() < 1e-9);
        assert!((anova.f_statistic - 261.3).abs() < 1e-6);

        // F(2, 6): P(F > f) = (1 + f/3)^(-3)
        let expected_p = (1.0 + anova.f_statistic / 3.0).powi(-3);
        assert!((anova.p_value - expected_p).abs() < 1e-12);
        assert!(anova.significant);

        assert!((anova.coefficient_of_variation - 3.494_229_458_750_6).abs() < 1e-6);
        assert!(!anova.is_degenerate());
    }

    #[test]
    fn test_anova_single_block() {
        let set = set_from_rows(&[&[5.0], &[6.0], &[9.0]]);
        let anova = calculate_anova(&set, ResidualDf::Balanced, &IncompleteBeta);

        assert_eq!(anova.blocks.degrees_of_freedom, 0);
        assert_eq!(anova.residual.degrees_of_freedom, 0);
        assert_eq!(anova.residual.mean_square, 0.0);
        assert_eq!(anova.f_statistic, 0.0);
        assert_eq!(anova.p_value, 1.0);
        assert!(!anova.significant);
        assert!(anova.is_degenerate());
    }

    #[test]
    fn test_anova_single_treatment() {
        let set = set_from_rows(&[&[5.0, 6.0, 7.0]]);
        let anova = calculate_anova(&set, ResidualDf::Balanced, &IncompleteBeta);

        assert_eq!(anova.treatments.degrees_of_freedom, 0);
        assert_eq!(anova.treatments.mean_square, 0.0);
        assert_eq!(anova.f_statistic, 0.0);
        assert_eq!(anova.p_value, 1.0);
        assert!(!anova.significant);
    }

    #[test]
    fn test_anova_additive_data_has_no_residual() {
        // Perfectly additive treatment + block effects leave no residual variance.
        let set = set_from_rows(&[&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0]]);
        let anova = calculate_anova(&set, ResidualDf::Balanced, &IncompleteBeta);

        assert!(anova.residual.sum_of_squares.abs() < 1e-9);
        assert!(anova.reported_residual_ss() >= 0.0);
        assert_eq!(anova.p_value, 1.0);
        assert!(!anova.significant);
    }

    #[test]
    fn test_anova_empty_set() {
        let anova = calculate_anova(&ObservationSet::default(), ResidualDf::Balanced, &IncompleteBeta);
        assert_eq!(anova.observations, 0);
        assert_eq!(anova.p_value, 1.0);
        assert!(!anova.significant);
        assert!(!anova.grand_mean.is_nan());
    }

    #[test]
    fn test_anova_zero_grand_mean_cv() {
        let set = set_from_rows(&[&[-1.0, 1.5], &[1.0, -1.5]]);
        let anova = calculate_anova(&set, ResidualDf::Balanced, &IncompleteBeta);
        assert_eq!(anova.grand_mean, 0.0);
        assert_eq!(anova.coefficient_of_variation, 0.0);
    }

    #[test]
    fn test_residual_df_policies_on_missing_cell() {
        // Treatment 2 is missing in block 3.
        let set = ObservationSet::from_records(vec![
            PlotRecord::new(0, 0, 4.8),
            PlotRecord::new(0, 1, 5.2),
            PlotRecord::new(0, 2, 5.1),
            PlotRecord::new(0, 3, 4.9),
            PlotRecord::new(1, 0, 5.3),
            PlotRecord::new(1, 1, 4.9),
            PlotRecord::new(1, 2, 5.0),
            PlotRecord::new(1, 3, 5.2),
            PlotRecord::new(2, 0, 8.1),
            PlotRecord::new(2, 1, 7.8),
            PlotRecord::new(2, 2, 8.2),
            PlotRecord::new(2, 3, ""),
        ]);

        let balanced = calculate_anova(&set, ResidualDf::Balanced, &IncompleteBeta);
        let counted = calculate_anova(&set, ResidualDf::FromObservations, &IncompleteBeta);

        assert_eq!(balanced.residual.degrees_of_freedom, 6);
        assert_eq!(counted.residual.degrees_of_freedom, 5);
        assert_eq!(balanced.total_df, 10);

        // The SS partition does not depend on the policy.
        assert_eq!(balanced.residual.sum_of_squares, counted.residual.sum_of_squares);
    }

    #[test]
    fn test_policies_agree_when_balanced() {
        let set = scenario_a();
        let balanced = calculate_anova(&set, ResidualDf::Balanced, &IncompleteBeta);
        let counted = calculate_anova(&set, ResidualDf::FromObservations, &IncompleteBeta);
        assert_eq!(balanced, counted);
    }

    #[test]
    fn test_reported_residual_clamps_negative() {
        let anova = AnovaResult {
            residual: AnovaEntry {
                sum_of_squares: -1e-12,
                degrees_of_freedom: 4,
                mean_square: -2.5e-13,
            },
            ..AnovaResult::default()
        };
        assert_eq!(anova.reported_residual_ss(), 0.0);
        assert_eq!(anova.reported_residual_ms(), 0.0);
        assert!(anova.is_degenerate());
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn balanced_grid() -> impl Strategy<Value = Vec<Vec<f64>>> {
            (2usize..6, 2usize..6).prop_flat_map(|(t, b)| {
                proptest::collection::vec(proptest::collection::vec(-50.0f64..150.0, b), t)
            })
        }

        fn to_set(grid: &[Vec<f64>]) -> ObservationSet {
            let rows: Vec<&[f64]> = grid.iter().map(Vec::as_slice).collect();
            set_from_rows(&rows)
        }

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(200))]

            #[test]
            fn ss_partition_adds_up(grid in balanced_grid()) {
                let anova = calculate_anova(&to_set(&grid), ResidualDf::Balanced, &IncompleteBeta);
                let parts = anova.blocks.sum_of_squares
                    + anova.treatments.sum_of_squares
                    + anova.residual.sum_of_squares;
                let scale = anova.total_ss.abs().max(1.0);
                prop_assert!((anova.total_ss - parts).abs() <= 1e-9 * scale);
            }

            #[test]
            fn df_partition_adds_up(grid in balanced_grid()) {
                let anova = calculate_anova(&to_set(&grid), ResidualDf::Balanced, &IncompleteBeta);
                prop_assert_eq!(
                    anova.blocks.degrees_of_freedom
                        + anova.treatments.degrees_of_freedom
                        + anova.residual.degrees_of_freedom,
                    anova.total_df
                );
            }

            #[test]
            fn p_value_is_a_probability(grid in balanced_grid()) {
                let anova = calculate_anova(&to_set(&grid), ResidualDf::Balanced, &IncompleteBeta);
                prop_assert!((0.0..=1.0).contains(&anova.p_value));
                prop_assert!(anova.f_statistic >= 0.0);
                prop_assert!(anova.coefficient_of_variation.is_finite());
            }

            #[test]
            fn recomputation_is_bit_identical(grid in balanced_grid()) {
                let set = to_set(&grid);
                let first = calculate_anova(&set, ResidualDf::Balanced, &IncompleteBeta);
                let second = calculate_anova(&set, ResidualDf::Balanced, &IncompleteBeta);
                prop_assert_eq!(first.total_ss.to_bits(), second.total_ss.to_bits());
                prop_assert_eq!(first.p_value.to_bits(), second.p_value.to_bits());
                prop_assert_eq!(first, second);
            }
        }
    }
}

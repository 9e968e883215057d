//! The analysis pipeline for one assessment.
//!
//! Observations flow through the ANOVA, the standard error calculator and,
//! when the treatment effect is significant, the letter group assigner:
//!
//! ```rust
//! use rcbd::{analyze, ObservationSet, PlotRecord};
//!
//! // rows are treatments, columns are blocks
//! let scores = [
//!     [4.8, 5.2, 5.1, 4.9],
//!     [5.3, 4.9, 5.0, 5.2],
//!     [8.1, 7.8, 8.2, 7.9],
//! ];
//! let records = scores.iter().enumerate().flat_map(|(t, row)| {
//!     row.iter()
//!         .enumerate()
//!         .map(move |(b, &v)| PlotRecord::new(t as u32, b as u32, v))
//! });
//! let set = ObservationSet::from_records(records);
//!
//! let outcome = analyze(&set);
//! let report = outcome.report().expect("scores were entered");
//!
//! assert!(report.significant());
//! assert_eq!(report.anova.residual.degrees_of_freedom, 6);
//! let labels: Vec<_> = report
//!     .treatments
//!     .iter()
//!     .map(|t| t.letter_group.to_string())
//!     .collect();
//! assert_eq!(labels, ["a", "a", "b"]);
//! ```

use crate::anova::calculate_anova;
use crate::config::AnalysisConfig;
use crate::distribution::{DistributionOracle, IncompleteBeta};
use crate::error::Result;
use crate::letters::{assign_letter_groups, LetterGroupAssignment};
use crate::observation::ObservationSet;
use crate::report::{AnalysisOutcome, NoDataResult, TrialAnalysisReport};
use crate::standard_error::calculate_standard_errors;
use crate::summary::TreatmentSummary;

/// Runs RCBD analyses with a fixed configuration and distribution oracle.
///
/// An analyzer holds no mutable state; one instance can serve any number of
/// assessments, including from several threads at once.
#[derive(Debug, Clone)]
pub struct Analyzer<O = IncompleteBeta> {
    config: AnalysisConfig,
    oracle: O,
}

impl Default for Analyzer<IncompleteBeta> {
    fn default() -> Self {
        Self {
            config: AnalysisConfig::default(),
            oracle: IncompleteBeta,
        }
    }
}

impl Analyzer<IncompleteBeta> {
    /// Create an analyzer using the built-in distribution oracle.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(config: AnalysisConfig) -> Result<Self> {
        Self::with_oracle(config, IncompleteBeta)
    }
}

impl<O: DistributionOracle> Analyzer<O> {
    /// Create an analyzer using a custom distribution oracle.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn with_oracle(config: AnalysisConfig, oracle: O) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, oracle })
    }

    /// Get the configuration.
    #[must_use]
    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Get the distribution oracle.
    #[must_use]
    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    /// Analyse one assessment.
    ///
    /// Returns [`AnalysisOutcome::NoData`] for an empty set. Degenerate
    /// designs (a single block or treatment, no residual variance) still
    /// produce a report, with `F = 0`, `p = 1` and every letter group not
    /// applicable.
    #[must_use]
    pub fn analyze(&self, set: &ObservationSet) -> AnalysisOutcome {
        if set.is_empty() {
            tracing::debug!(excluded = set.excluded(), "no usable observations");
            return AnalysisOutcome::NoData(NoDataResult {
                excluded: set.excluded(),
            });
        }

        let anova = calculate_anova(set, self.config.residual_df, &self.oracle);

        let num_blocks = set.num_blocks();
        let standard_errors = calculate_standard_errors(
            anova.residual.mean_square,
            num_blocks,
            anova.residual.degrees_of_freedom,
            &self.oracle,
        );

        let mut treatments: Vec<TreatmentSummary> = set
            .treatments()
            .into_iter()
            .map(|t| TreatmentSummary::from_values(t, set.values_for(t)))
            .collect();

        let assignment = if anova.significant {
            let means: Vec<f64> = treatments.iter().map(|s| s.mean).collect();
            assign_letter_groups(&means, standard_errors.lsd)
        } else {
            LetterGroupAssignment::not_applicable(treatments.len())
        };
        for (summary, label) in treatments.iter_mut().zip(assignment.into_labels()) {
            summary.letter_group = label;
        }

        tracing::trace!(
            observations = set.len(),
            treatments = treatments.len(),
            blocks = num_blocks,
            f = anova.f_statistic,
            p = anova.p_value,
            lsd = standard_errors.lsd,
            "assessment analysed"
        );

        AnalysisOutcome::Report(TrialAnalysisReport {
            grand_mean: anova.grand_mean,
            num_treatments: treatments.len(),
            num_blocks,
            excluded: set.excluded(),
            not_applicable_label: self.config.not_applicable_label.clone(),
            anova,
            standard_errors,
            treatments,
        })
    }
}

/// Analyse one assessment with the default configuration and the built-in
/// distribution oracle.
#[must_use]
pub fn analyze(set: &ObservationSet) -> AnalysisOutcome {
    Analyzer::<IncompleteBeta>::default().analyze(set)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ResidualDf;
    use crate::letters::LetterGroup;
    use crate::observation::{PlotRecord, RawValue, TreatmentId};
    use crate::standard_error::FALLBACK_T_CRITICAL;

    fn set_from_rows(rows: &[&[f64]]) -> ObservationSet {
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
    fn test_scenario_balanced_significant() {
        let outcome = analyze(&scenario_a());
        let report = outcome.report().unwrap();

        assert_eq!(report.num_treatments, 3);
        assert_eq!(report.num_blocks, 4);
        assert_eq!(report.anova.residual.degrees_of_freedom, 6);
        assert!(report.significant());

        let means: Vec<f64> = report.treatments.iter().map(|t| t.mean).collect();
        assert!((means[0] - 5.0).abs() < 1e-12);
        assert!((means[1] - 5.1).abs() < 1e-12);
        assert!((means[2] - 8.0).abs() < 1e-12);

        assert_eq!(report.label(TreatmentId(0)), Some("a"));
        assert_eq!(report.label(TreatmentId(1)), Some("a"));
        assert_eq!(report.label(TreatmentId(2)), Some("b"));

        assert_eq!(report.standard_errors.replicates, 4);
        assert!((report.standard_errors.lsd - 0.364_764_082_25).abs() < 1e-8);
        assert!((report.grand_mean - report.anova.grand_mean).abs() < f64::EPSILON);
    }

    #[test]
    fn test_scenario_single_block() {
        let set = set_from_rows(&[&[5.0], &[6.0], &[9.0]]);
        let report = analyze(&set).into_report().unwrap();

        assert_eq!(report.num_blocks, 1);
        assert_eq!(report.anova.residual.degrees_of_freedom, 0);
        assert_eq!(report.anova.residual.mean_square, 0.0);
        assert_eq!(report.anova.f_statistic, 0.0);
        assert_eq!(report.anova.p_value, 1.0);
        assert!(!report.significant());

        assert_eq!(report.standard_errors.t_critical, FALLBACK_T_CRITICAL);
        assert_eq!(report.standard_errors.lsd, 0.0);

        for summary in &report.treatments {
            assert_eq!(summary.letter_group, LetterGroup::NotApplicable);
        }
        assert_eq!(report.label(TreatmentId(1)), Some("NS"));
    }

    #[test]
    fn test_scenario_no_data() {
        let outcome = analyze(&ObservationSet::default());
        assert!(outcome.is_no_data());
        assert!(outcome.report().is_none());

        let set = ObservationSet::from_records(vec![
            PlotRecord::new(0, 0, RawValue::Missing),
            PlotRecord::new(1, 0, ""),
            PlotRecord::new(2, 0, "n/a"),
        ]);
        assert_eq!(
            analyze(&set),
            AnalysisOutcome::NoData(NoDataResult { excluded: 3 })
        );
    }

    #[test]
    fn test_not_significant_uses_configured_label() {
        let set = set_from_rows(&[&[5.0, 6.1, 4.4], &[5.2, 4.3, 6.0], &[4.9, 5.5, 5.1]]);
        let analyzer = Analyzer::new(AnalysisConfig {
            not_applicable_label: "-".to_string(),
            ..Default::default()
        })
        .unwrap();

        let report = analyzer.analyze(&set).into_report().unwrap();
        assert!(!report.significant());
        assert!(report
            .treatments
            .iter()
            .all(|t| t.letter_group == LetterGroup::NotApplicable));
        assert_eq!(report.label(TreatmentId(0)), Some("-"));
        assert_eq!(report.label(TreatmentId(9)), None);
    }

    #[test]
    fn test_missing_value_shrinks_design() {
        let set = ObservationSet::from_records(vec![
            PlotRecord::new(0, 0, 4.8),
            PlotRecord::new(0, 1, 5.2),
            PlotRecord::new(1, 0, 5.3),
            PlotRecord::new(1, 1, 4.9),
            PlotRecord::new(2, 0, ""),
            PlotRecord::new(2, 1, RawValue::Missing),
        ]);
        let report = analyze(&set).into_report().unwrap();
        assert_eq!(report.num_treatments, 2);
        assert_eq!(report.excluded, 2);
        assert!(report.summary(TreatmentId(2)).is_none());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = AnalysisConfig {
            not_applicable_label: String::new(),
            ..Default::default()
        };
        assert!(Analyzer::new(config).is_err());
    }

    #[test]
    fn test_residual_policy_flows_through() {
        let set = ObservationSet::from_records(vec![
            PlotRecord::new(0, 0, 4.8),
            PlotRecord::new(0, 1, 5.2),
            PlotRecord::new(0, 2, 5.1),
            PlotRecord::new(1, 0, 5.3),
            PlotRecord::new(1, 1, 4.9),
            PlotRecord::new(1, 2, 5.0),
            PlotRecord::new(2, 0, 8.1),
            PlotRecord::new(2, 1, 7.8),
        ]);
        let analyzer = Analyzer::new(AnalysisConfig {
            residual_df: ResidualDf::FromObservations,
            ..Default::default()
        })
        .unwrap();
        let report = analyzer.analyze(&set).into_report().unwrap();
        assert_eq!(report.anova.residual.degrees_of_freedom, 3);
        assert_eq!(analyzer.config().residual_df, ResidualDf::FromObservations);
    }

    #[test]
    fn test_recomputation_is_identical() {
        let set = scenario_a();
        assert_eq!(analyze(&set), analyze(&set));
    }

    #[test]
    fn test_analyzer_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Analyzer>();
        assert_send_sync::<TrialAnalysisReport>();
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_report_serde_roundtrip() {
        let outcome = analyze(&scenario_a());
        let json = serde_json::to_string(&outcome).unwrap();
        assert!(json.contains("\"Letters\":\"a\""));

        let restored: AnalysisOutcome = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, outcome);
    }

    #[cfg(feature = "statrs")]
    #[test]
    fn test_statrs_oracle_gives_same_letters() {
        use crate::distribution::StatrsOracle;

        let analyzer = Analyzer::with_oracle(AnalysisConfig::default(), StatrsOracle).unwrap();
        let report = analyzer.analyze(&scenario_a()).into_report().unwrap();
        let builtin = analyze(&scenario_a()).into_report().unwrap();

        assert!((report.anova.p_value - builtin.anova.p_value).abs() < 1e-9);
        assert!((report.standard_errors.lsd - builtin.standard_errors.lsd).abs() < 1e-6);
        for (a, b) in report.treatments.iter().zip(&builtin.treatments) {
            assert_eq!(a.letter_group, b.letter_group);
        }
    }
}

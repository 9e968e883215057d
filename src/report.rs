//! Analysis results for one assessment date and trait.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::anova::AnovaResult;
use crate::observation::TreatmentId;
use crate::standard_error::StandardErrors;
use crate::summary::TreatmentSummary;

/// Complete analysis of one assessment.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TrialAnalysisReport {
    /// ANOVA table and treatment F test.
    pub anova: AnovaResult,
    /// e.s.e., s.e.d. and LSD.
    pub standard_errors: StandardErrors,
    /// One summary per treatment present, by ascending treatment id.
    pub treatments: Vec<TreatmentSummary>,
    /// Mean of all observations.
    pub grand_mean: f64,
    /// Distinct treatments present in the data.
    pub num_treatments: usize,
    /// Distinct blocks present in the data.
    pub num_blocks: usize,
    /// Raw records dropped because their value was unusable.
    pub excluded: usize,
    /// Rendering of treatments without a letter group.
    pub not_applicable_label: String,
}

impl TrialAnalysisReport {
    /// Whether the treatment effect is significant at the 5% level.
    #[must_use]
    pub fn significant(&self) -> bool {
        self.anova.significant
    }

    /// Look up the summary of one treatment.
    #[must_use]
    pub fn summary(&self, treatment: TreatmentId) -> Option<&TreatmentSummary> {
        self.treatments
            .binary_search_by_key(&treatment, |s| s.treatment)
            .ok()
            .map(|idx| &self.treatments[idx])
    }

    /// Rendered letter group of one treatment (the configured sentinel when
    /// grouping does not apply).
    #[must_use]
    pub fn label(&self, treatment: TreatmentId) -> Option<&str> {
        self.summary(treatment)
            .map(|s| s.letter_group.render(&self.not_applicable_label))
    }
}

/// Marker result for an assessment without any usable observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NoDataResult {
    /// Raw records dropped because their value was unusable.
    pub excluded: usize,
}

/// Outcome of analysing one assessment.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum AnalysisOutcome {
    /// The analysis ran.
    Report(TrialAnalysisReport),
    /// No usable observation; render a placeholder.
    NoData(NoDataResult),
}

impl AnalysisOutcome {
    /// Get the report, if there was data.
    #[must_use]
    pub fn report(&self) -> Option<&TrialAnalysisReport> {
        match self {
            Self::Report(report) => Some(report),
            Self::NoData(_) => None,
        }
    }

    /// Consume the outcome, returning the report if there was data.
    #[must_use]
    pub fn into_report(self) -> Option<TrialAnalysisReport> {
        match self {
            Self::Report(report) => Some(report),
            Self::NoData(_) => None,
        }
    }

    /// Whether the assessment had no usable observation.
    #[must_use]
    pub fn is_no_data(&self) -> bool {
        matches!(self, Self::NoData(_))
    }
}

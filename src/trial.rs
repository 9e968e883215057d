//! Trial-level analysis across assessment dates and traits.
//!
//! A trial is scored repeatedly: every assessment date and every measured
//! trait forms an independent RCBD analysis. [`TrialData`] groups the flat
//! per-plot scores by [`AssessmentKey`] and analyses each group on its own.
//! There is no state shared between assessments, so with the `parallel`
//! feature the groups are simply fanned out over rayon's thread pool.

use std::collections::BTreeMap;
use std::fmt;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::analysis::Analyzer;
use crate::distribution::DistributionOracle;
use crate::observation::{ObservationSet, PlotRecord};
use crate::report::AnalysisOutcome;

/// Identifies one assessment: a scoring date and a trait.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AssessmentKey {
    /// Assessment date as recorded (ISO dates sort chronologically).
    pub date: String,
    /// Name of the measured trait.
    pub trait_name: String,
}

impl AssessmentKey {
    /// Create a new assessment key.
    pub fn new(date: impl Into<String>, trait_name: impl Into<String>) -> Self {
        Self {
            date: date.into(),
            trait_name: trait_name.into(),
        }
    }
}

impl fmt::Display for AssessmentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} / {}", self.date, self.trait_name)
    }
}

/// One per-plot score tagged with its assessment.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PlotScore {
    /// Date and trait the score belongs to.
    pub key: AssessmentKey,
    /// Treatment, block and raw value.
    pub record: PlotRecord,
}

/// Observations of a whole trial, grouped by assessment.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrialData {
    assessments: BTreeMap<AssessmentKey, ObservationSet>,
}

impl TrialData {
    /// Create an empty trial.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Group flat plot scores by assessment and filter each group.
    ///
    /// An assessment whose scores are all unusable is kept, so that it is
    /// reported as no data rather than silently disappearing.
    pub fn from_scores<I>(scores: I) -> Self
    where
        I: IntoIterator<Item = PlotScore>,
    {
        let mut grouped: BTreeMap<AssessmentKey, Vec<PlotRecord>> = BTreeMap::new();
        for score in scores {
            grouped.entry(score.key).or_default().push(score.record);
        }

        let assessments = grouped
            .into_iter()
            .map(|(key, records)| (key, ObservationSet::from_records(records)))
            .collect();
        Self { assessments }
    }

    /// Add or replace the observations of one assessment.
    pub fn insert(&mut self, key: AssessmentKey, set: ObservationSet) -> Option<ObservationSet> {
        self.assessments.insert(key, set)
    }

    /// Get the observations of one assessment.
    #[must_use]
    pub fn get(&self, key: &AssessmentKey) -> Option<&ObservationSet> {
        self.assessments.get(key)
    }

    /// Assessment keys in order (date, then trait).
    pub fn keys(&self) -> impl Iterator<Item = &AssessmentKey> {
        self.assessments.keys()
    }

    /// Number of assessments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.assessments.len()
    }

    /// Whether the trial has no assessments.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.assessments.is_empty()
    }

    /// Analyse every assessment independently.
    pub fn analyze<O>(&self, analyzer: &Analyzer<O>) -> BTreeMap<AssessmentKey, AnalysisOutcome>
    where
        O: DistributionOracle,
    {
        self.assessments
            .iter()
            .map(|(key, set)| {
                let _span = tracing::debug_span!("assessment", %key).entered();
                (key.clone(), analyzer.analyze(set))
            })
            .collect()
    }

    /// Analyse every assessment independently, in parallel.
    #[cfg(feature = "parallel")]
    pub fn par_analyze<O>(&self, analyzer: &Analyzer<O>) -> BTreeMap<AssessmentKey, AnalysisOutcome>
    where
        O: DistributionOracle,
    {
        self.assessments
            .par_iter()
            .map(|(key, set)| {
                let _span = tracing::debug_span!("assessment", %key).entered();
                (key.clone(), analyzer.analyze(set))
            })
            .collect()
    }
}

impl FromIterator<PlotScore> for TrialData {
    fn from_iter<I: IntoIterator<Item = PlotScore>>(iter: I) -> Self {
        Self::from_scores(iter)
    }
}

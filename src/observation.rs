//! Observation core types.
//!
//! This module provides the validated input of the analysis engine:
//!
//! - [`PlotRecord`]: a raw per-plot score as supplied by the plot/grid layout,
//!   possibly missing or unparseable
//! - [`Observation`]: a single finite (treatment, block, value) triple
//! - [`ObservationSet`]: every usable observation for one assessment date and
//!   trait
//!
//! The number of treatments and blocks is always derived from the observations
//! themselves. Missing values can shrink either count for a given date, so the
//! nominal trial layout is never trusted.

use std::collections::{BTreeSet, HashSet};
use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Identifier of a treatment (experimental factor level).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct TreatmentId(pub u32);

/// Identifier of a block (replicate).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct BlockId(pub u32);

impl fmt::Display for TreatmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A raw score as entered for one plot.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum RawValue {
    /// Nothing was entered.
    Missing,
    /// A numeric entry.
    Number(f64),
    /// A free-text entry that may or may not hold a number.
    Text(String),
}

impl RawValue {
    /// Parse the entry into a usable value.
    ///
    /// Returns `None` for missing entries, empty or unparseable text, and
    /// non-finite numbers. Surrounding whitespace is ignored.
    #[must_use]
    pub fn parse_value(&self) -> Option<f64> {
        let value = match self {
            Self::Missing => return None,
            Self::Number(v) => *v,
            Self::Text(text) => {
                let trimmed = text.trim();
                if trimmed.is_empty() {
                    return None;
                }
                trimmed.parse::<f64>().ok()?
            }
        };
        value.is_finite().then_some(value)
    }
}

impl From<f64> for RawValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<Option<f64>> for RawValue {
    fn from(value: Option<f64>) -> Self {
        value.map_or(Self::Missing, Self::Number)
    }
}

impl From<&str> for RawValue {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for RawValue {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

/// A per-plot record for one assessment date and trait.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PlotRecord {
    /// Treatment assigned to the plot.
    pub treatment: TreatmentId,
    /// Block containing the plot.
    pub block: BlockId,
    /// The score as entered.
    pub value: RawValue,
}

impl PlotRecord {
    /// Create a new plot record.
    pub fn new(treatment: u32, block: u32, value: impl Into<RawValue>) -> Self {
        Self {
            treatment: TreatmentId(treatment),
            block: BlockId(block),
            value: value.into(),
        }
    }
}

/// A single validated observation.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Observation {
    treatment: TreatmentId,
    block: BlockId,
    value: f64,
}

impl Observation {
    /// Create a new observation.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NonFiniteValue`] if `value` is NaN or infinite.
    pub fn new(treatment: TreatmentId, block: BlockId, value: f64) -> Result<Self> {
        if !value.is_finite() {
            return Err(Error::NonFiniteValue {
                treatment,
                block,
                value,
            });
        }
        Ok(Self {
            treatment,
            block,
            value,
        })
    }

    /// Get the treatment.
    #[must_use]
    pub fn treatment(&self) -> TreatmentId {
        self.treatment
    }

    /// Get the block.
    #[must_use]
    pub fn block(&self) -> BlockId {
        self.block
    }

    /// Get the observed value.
    #[must_use]
    pub fn value(&self) -> f64 {
        self.value
    }
}

/// All usable observations for one assessment date and trait.
///
/// An empty set is valid: analysing it yields
/// [`AnalysisOutcome::NoData`](crate::AnalysisOutcome::NoData).
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct ObservationSet {
    observations: Vec<Observation>,
    excluded: usize,
}

impl ObservationSet {
    /// Create a set from already-validated observations.
    ///
    /// Duplicate treatment/block cells are kept as they are; the plot grid is
    /// expected to hold a single entry per plot.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NonFiniteValue`] for the first NaN or infinite value.
    /// Observations built through [`Observation::new`] can never trigger it.
    pub fn new(observations: Vec<Observation>) -> Result<Self> {
        if let Some(bad) = observations.iter().find(|o| !o.value.is_finite()) {
            return Err(Error::NonFiniteValue {
                treatment: bad.treatment,
                block: bad.block,
                value: bad.value,
            });
        }
        warn_on_duplicate_cells(&observations);
        Ok(Self {
            observations,
            excluded: 0,
        })
    }

    /// Build a set from raw plot records, dropping every record whose value is
    /// missing, unparseable or non-finite.
    pub fn from_records<I>(records: I) -> Self
    where
        I: IntoIterator<Item = PlotRecord>,
    {
        let mut observations = Vec::new();
        let mut excluded = 0;

        for record in records {
            match record.value.parse_value() {
                Some(value) => observations.push(Observation {
                    treatment: record.treatment,
                    block: record.block,
                    value,
                }),
                None => excluded += 1,
            }
        }

        warn_on_duplicate_cells(&observations);
        Self {
            observations,
            excluded,
        }
    }

    /// Get the observations in input order.
    #[must_use]
    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    /// Iterate over the observations.
    pub fn iter(&self) -> impl Iterator<Item = &Observation> {
        self.observations.iter()
    }

    /// Number of usable observations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.observations.len()
    }

    /// Whether there are no usable observations.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// Number of raw records dropped while building the set.
    #[must_use]
    pub fn excluded(&self) -> usize {
        self.excluded
    }

    /// Distinct treatments, in ascending order.
    #[must_use]
    pub fn treatments(&self) -> Vec<TreatmentId> {
        let set: BTreeSet<TreatmentId> = self.observations.iter().map(|o| o.treatment).collect();
        set.into_iter().collect()
    }

    /// Distinct blocks, in ascending order.
    #[must_use]
    pub fn blocks(&self) -> Vec<BlockId> {
        let set: BTreeSet<BlockId> = self.observations.iter().map(|o| o.block).collect();
        set.into_iter().collect()
    }

    /// Number of distinct treatments present.
    #[must_use]
    pub fn num_treatments(&self) -> usize {
        self.treatments().len()
    }

    /// Number of distinct blocks present.
    #[must_use]
    pub fn num_blocks(&self) -> usize {
        self.blocks().len()
    }

    /// Values observed for one treatment, in input order.
    #[must_use]
    pub fn values_for(&self, treatment: TreatmentId) -> Vec<f64> {
        self.observations
            .iter()
            .filter(|o| o.treatment == treatment)
            .map(|o| o.value)
            .collect()
    }
}

impl<'a> IntoIterator for &'a ObservationSet {
    type Item = &'a Observation;
    type IntoIter = std::slice::Iter<'a, Observation>;

    fn into_iter(self) -> Self::IntoIter {
        self.observations.iter()
    }
}

fn warn_on_duplicate_cells(observations: &[Observation]) {
    let mut seen = HashSet::with_capacity(observations.len());
    let duplicates = observations
        .iter()
        .filter(|o| !seen.insert((o.treatment, o.block)))
        .count();
    if duplicates > 0 {
        tracing::warn!(
            duplicates,
            "observation set holds repeated treatment/block cells"
        );
    }
}

//! # rcbd
//!
//! Statistical analysis of randomized complete block design (RCBD) field trials.
//!
//! ## Overview
//!
//! Field trials score every plot repeatedly, on several dates and for several
//! traits. For each (date, trait) assessment this library turns the raw plot
//! scores into defensible treatment comparisons:
//!
//! - **ANOVA**: block, treatment and residual sums of squares, the treatment
//!   F test and the coefficient of variation
//! - **Standard errors**: e.s.e., s.e.d. and Fisher's least significant
//!   difference (LSD)
//! - **Letter groups**: treatments sharing a letter are not significantly
//!   different (only assigned when the F test is significant)
//!
//! Assessments are analysed independently and every calculator is a pure
//! function, so a trial can be processed in parallel without coordination.
//!
//! ## Quick Start
//!
//! ```rust
//! use rcbd::{analyze, ObservationSet, PlotRecord, RawValue};
//!
//! let set = ObservationSet::from_records(vec![
//!     PlotRecord::new(0, 0, 4.8),
//!     PlotRecord::new(0, 1, 5.2),
//!     PlotRecord::new(0, 2, 5.1),
//!     PlotRecord::new(1, 0, 7.9),
//!     PlotRecord::new(1, 1, 8.3),
//!     PlotRecord::new(1, 2, "8.0"),
//!     PlotRecord::new(2, 0, RawValue::Missing),
//! ]);
//!
//! let outcome = analyze(&set);
//! let report = outcome.report().unwrap();
//!
//! assert_eq!(report.num_treatments, 2);
//! assert_eq!(report.excluded, 1);
//! println!("p = {:.4}, LSD = {:.3}", report.anova.p_value, report.standard_errors.lsd);
//! for t in &report.treatments {
//!     println!("{}: {:.2} {}", t.treatment, t.mean, t.letter_group);
//! }
//! ```
//!
//! ## Degenerate data
//!
//! The engine never fails on insufficient data. An assessment without usable
//! scores yields [`AnalysisOutcome::NoData`]. Designs that cannot be tested
//! (a single block or treatment, no residual variance) report `F = 0`,
//! `p = 1`, a fallback t critical value of 2.064 and no letter groups.
//!
//! ## Features
//!
//! - `serde`: Enable serialization/deserialization of inputs and results
//! - `parallel`: Enable parallel trial analysis using rayon
//! - `statrs`: Enable a distribution oracle backed by the `statrs` crate

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_precision_loss)]

pub mod analysis;
pub mod anova;
pub mod config;
pub mod distribution;
pub mod error;
pub mod letters;
pub mod observation;
pub mod report;
pub mod standard_error;
pub mod summary;
pub mod trial;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::analysis::{analyze, Analyzer};
    pub use crate::anova::{calculate_anova, AnovaEntry, AnovaResult, SIGNIFICANCE_LEVEL};
    pub use crate::config::{AnalysisConfig, ResidualDf};
    pub use crate::distribution::{DistributionOracle, IncompleteBeta};
    pub use crate::error::{Error, Result};
    pub use crate::letters::{assign_letter_groups, LetterGroup, LetterGroupAssignment};
    pub use crate::observation::{
        BlockId, Observation, ObservationSet, PlotRecord, RawValue, TreatmentId,
    };
    pub use crate::report::{AnalysisOutcome, NoDataResult, TrialAnalysisReport};
    pub use crate::standard_error::{
        calculate_standard_errors, StandardErrors, FALLBACK_T_CRITICAL, LSD_QUANTILE,
    };
    pub use crate::summary::{BoxPlot, TreatmentSummary};
    pub use crate::trial::{AssessmentKey, PlotScore, TrialData};

    #[cfg(feature = "statrs")]
    pub use crate::distribution::StatrsOracle;
}

// Re-export commonly used items at crate root
pub use analysis::{analyze, Analyzer};
pub use anova::AnovaResult;
pub use config::{AnalysisConfig, ResidualDf};
pub use distribution::{DistributionOracle, IncompleteBeta};
pub use error::{Error, Result};
pub use letters::LetterGroup;
pub use observation::{BlockId, Observation, ObservationSet, PlotRecord, RawValue, TreatmentId};
pub use report::{AnalysisOutcome, NoDataResult, TrialAnalysisReport};
pub use standard_error::StandardErrors;
pub use summary::TreatmentSummary;
pub use trial::{AssessmentKey, PlotScore, TrialData};

//! Analysis configuration.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// How the residual degrees of freedom are counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ResidualDf {
    /// `(blocks − 1) × (treatments − 1)`.
    ///
    /// Exact for complete blocks. Under missing cells it under-counts the
    /// residual df, but it reproduces historically reported p-values.
    #[default]
    Balanced,
    /// `(n − 1) − (blocks − 1) − (treatments − 1)`, counted from the
    /// observations actually present. Equal to `Balanced` for complete blocks.
    FromObservations,
}

/// Configuration for an RCBD analysis.
///
/// The significance level (0.05) and the LSD quantile (0.975) are fixed and
/// deliberately not part of the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AnalysisConfig {
    /// Residual degrees of freedom policy (default: `Balanced`).
    pub residual_df: ResidualDf,
    /// Label rendered for treatments without a letter group (default: `"NS"`).
    pub not_applicable_label: String,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            residual_df: ResidualDf::Balanced,
            not_applicable_label: "NS".to_string(),
        }
    }
}

impl AnalysisConfig {
    /// Check that the configuration is usable.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParams`] if the not-applicable label is blank.
    pub fn validate(&self) -> Result<()> {
        if self.not_applicable_label.trim().is_empty() {
            return Err(Error::invalid_params(
                "not_applicable_label must not be blank",
            ));
        }
        Ok(())
    }
}

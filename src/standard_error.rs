//! Standard errors and Fisher's least significant difference.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::distribution::DistributionOracle;

/// Cumulative probability of the two-sided 95% t critical value.
pub const LSD_QUANTILE: f64 = 0.975;

/// Critical value used when the residual has no degrees of freedom.
pub const FALLBACK_T_CRITICAL: f64 = 2.064;

/// Standard errors derived from the residual mean square.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StandardErrors {
    /// Standard error of a single treatment mean (e.s.e.).
    pub ese: f64,
    /// Standard error of the difference between two means (s.e.d.).
    pub sed: f64,
    /// Two-sided 95% t critical value used for the LSD.
    pub t_critical: f64,
    /// Least significant difference: `sed × t_critical`.
    pub lsd: f64,
    /// Number of replicates the means are based on (the block count).
    pub replicates: usize,
}

/// Calculate e.s.e., s.e.d. and LSD.
///
/// # Arguments
/// * `ms_residual` - Residual mean square
/// * `replicates` - Replicates per treatment (number of blocks)
/// * `residual_df` - Residual degrees of freedom
/// * `oracle` - Source of the t distribution
///
/// A non-positive residual mean square or zero replicates give zero standard
/// errors and therefore a zero LSD. Without residual degrees of freedom the
/// critical value falls back to [`FALLBACK_T_CRITICAL`].
pub fn calculate_standard_errors<O>(
    ms_residual: f64,
    replicates: usize,
    residual_df: usize,
    oracle: &O,
) -> StandardErrors
where
    O: DistributionOracle + ?Sized,
{
    let (ese, sed) = if ms_residual > 0.0 && replicates > 0 {
        let r = replicates as f64;
        ((ms_residual / r).sqrt(), (2.0 * ms_residual / r).sqrt())
    } else {
        (0.0, 0.0)
    };

    let t_critical = if residual_df == 0 {
        FALLBACK_T_CRITICAL
    } else {
        match oracle.try_t_quantile(LSD_QUANTILE, residual_df as f64) {
            Ok(t) if t.is_finite() => t,
            outcome => {
                tracing::debug!(
                    residual_df,
                    ?outcome,
                    "t quantile unavailable; using fallback critical value"
                );
                FALLBACK_T_CRITICAL
            }
        }
    };

    StandardErrors {
        ese,
        sed,
        t_critical,
        lsd: sed * t_critical,
        replicates,
    }
}

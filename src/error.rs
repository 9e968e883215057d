//! Error types for the rcbd library.
//!
//! The engine degrades gracefully for insufficient or degenerate data, so the
//! error surface is narrow: only malformed input that breaks a constructor's
//! contract, or a bad argument to a checked distribution call, is reported
//! here. Missing data is a value
//! ([`AnalysisOutcome::NoData`](crate::AnalysisOutcome::NoData)), not an error.

use thiserror::Error;

use crate::observation::{BlockId, TreatmentId};

/// The main error type for the rcbd library.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    // ============ Input Validation Errors ============
    /// An observation value was NaN or infinite.
    #[error("non-finite value {value} for treatment {treatment}, block {block}")]
    NonFiniteValue {
        /// Treatment of the offending observation.
        treatment: TreatmentId,
        /// Block of the offending observation.
        block: BlockId,
        /// The offending value.
        value: f64,
    },

    // ============ Distribution Errors ============
    /// A quantile was requested for a probability outside the open interval (0, 1).
    #[error("probability {0} is outside the open interval (0, 1)")]
    InvalidProbability(f64),

    // ============ Parameter Validation Errors ============
    /// Invalid analysis parameters.
    #[error("invalid analysis parameters: {message}")]
    InvalidParams {
        /// Description of what is invalid.
        message: String,
    },
}

/// A specialized `Result` type for rcbd operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
    /// Create a new `InvalidParams` error.
    #[must_use]
    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::InvalidParams {
            message: message.into(),
        }
    }
}

//! Unified error types for the ehub workspace
//!
//! [`EhubError`] covers everything that makes construction of a technology
//! sub-model impossible. Configuration warnings are not errors; they are
//! collected in [`crate::diagnostics::Diagnostics`] instead.
//!
//! # Example
//!
//! ```ignore
//! use ehub_core::{EhubError, EhubResult};
//!
//! fn build(path: &Path) -> EhubResult<()> {
//!     let model = load_model_from_path(path)?;
//!     construct_all(&model)?;
//!     Ok(())
//! }
//! ```

use thiserror::Error;

/// Unified error type for all ehub operations.
///
/// Every variant is fatal for the technology being built. The construction
/// driver never skips a technology that failed; it aborts the whole run.
#[derive(Error, Debug)]
pub enum EhubError {
    /// I/O errors (reading model files)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Parsing/deserialization errors
    #[error("Parse error: {0}")]
    Parse(String),

    /// Generic configuration error for a technology
    #[error("Configuration error in {technology}: {message}")]
    Config { technology: String, message: String },

    /// `performance_function_type` outside {1, 2, 3}
    #[error("Unknown performance function type {0} (expected 1, 2 or 3)")]
    UnknownPerformanceFunction(u8),

    /// Curtailment code outside {0, 1, 2}
    #[error("Unknown curtailment mode {0} (expected 0, 1 or 2)")]
    UnknownCurtailment(u8),

    /// Breakpoints of a piecewise fit must be strictly increasing
    #[error("Breakpoints of {technology} are not strictly increasing at index {index}")]
    BreakpointsNotIncreasing { technology: String, index: usize },

    /// Carrier-indexed coefficients lack a declared carrier
    #[error("Coefficient {coefficient} of {technology} has no entry for carrier {carrier}")]
    MissingCarrierCoefficient {
        technology: String,
        coefficient: &'static str,
        carrier: String,
    },

    /// Coefficients lack a value for a curve segment
    #[error("Coefficient {coefficient} of {technology} has no value for segment {segment}")]
    MissingSegmentCoefficient {
        technology: String,
        coefficient: &'static str,
        segment: usize,
    },

    /// A startup or shutdown trajectory does not fit into the horizon
    #[error(
        "{kind} trajectory of {technology} spans {length} steps but the horizon has {horizon}"
    )]
    TrajectoryExceedsHorizon {
        technology: String,
        kind: &'static str,
        length: usize,
        horizon: usize,
    },

    /// "No curtailment" and discrete curtailment requested together
    #[error("Conflicting curtailment settings for {technology}: {message}")]
    ConflictingCurtailment { technology: String, message: String },

    /// A time series does not cover the horizon
    #[error("Series {series} of {technology} has {found} values, horizon has {expected}")]
    SeriesLength {
        technology: String,
        series: &'static str,
        expected: usize,
        found: usize,
    },

    /// A disjunct constraint has no finite bound and no fallback big-M is set
    #[error("Cannot derive big-M for constraint {constraint}: expression is unbounded")]
    UnboundedBigM { constraint: String },

    /// A disjunction reached the solver bridge without being relaxed
    #[error("Disjunction {0} has not been relaxed")]
    NotRelaxed(String),

    /// Solver errors (LP relaxation bridge)
    #[error("Solver error: {0}")]
    Solver(String),
}

impl EhubError {
    /// Shorthand for [`EhubError::Config`].
    pub fn config(technology: impl Into<String>, message: impl Into<String>) -> Self {
        EhubError::Config {
            technology: technology.into(),
            message: message.into(),
        }
    }
}

/// Convenience type alias for Results using EhubError.
pub type EhubResult<T> = Result<T, EhubError>;

impl From<serde_json::Error> for EhubError {
    fn from(err: serde_json::Error) -> Self {
        EhubError::Parse(err.to_string())
    }
}

impl From<serde_yaml::Error> for EhubError {
    fn from(err: serde_yaml::Error) -> Self {
        EhubError::Parse(err.to_string())
    }
}

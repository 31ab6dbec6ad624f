//! Error taxonomy shared by the loaders, the estimator, and the simulators.

use thiserror::Error;

use crate::config::ConfigError;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Every failure the core can report to its caller.
///
/// Growth-rate fallbacks and the advanced-to-simple simulator fallback are
/// not errors; they surface as tags on the returned values instead.
#[derive(Debug, Error)]
pub enum Error {
    /// A table is missing required columns or carries malformed rows.
    #[error("validation error: {0}")]
    Validation(String),

    /// Unknown state code, or no rows for that state.
    #[error("not found: {0}")]
    NotFound(String),

    /// Caller-supplied arguments are missing or out of range.
    #[error("invalid input: {0}")]
    Input(String),

    /// Design matrix, targets, or coefficients disagree on shape.
    #[error("dimension mismatch in {what}: expected {expected}, found {found}")]
    Dimension {
        what: &'static str,
        expected: usize,
        found: usize,
    },

    /// The least-squares decomposition could not produce a solution.
    #[error("least-squares solve failed: {0}")]
    Solve(String),

    /// An optional table was not loaded at start-up.
    #[error("{0} data not available")]
    Unavailable(&'static str),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Whether the failure was caused by the request rather than the data or
    /// the environment (an HTTP front end maps these to 400-class responses).
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::NotFound(_) | Self::Input(_) | Self::Validation(_)
        )
    }
}

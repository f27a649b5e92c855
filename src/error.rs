//! Error types for the projection engine and its loaders

use thiserror::Error;

/// Errors surfaced by the projection engine, the return solver and the config loaders
#[derive(Debug, Error)]
pub enum ProjectionError {
    /// XIRR exhausted its iteration budget without the NPV falling below tolerance
    #[error("XIRR did not converge after {iterations} iterations (rate: {rate}, npv: {npv})")]
    Convergence { iterations: u32, rate: f64, npv: f64 },

    /// Guess outside the NPV domain, or the derivative vanished before the
    /// root was bracketed
    #[error("XIRR diverged at iteration {iteration} (rate: {rate})")]
    Divergence { iteration: u32, rate: f64 },

    #[error("Cash flow values ({values}) and month offsets ({months}) must have the same length")]
    LengthMismatch { values: usize, months: usize },

    #[error("Invalid configuration: {field} - {reason}")]
    Configuration { field: String, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl ProjectionError {
    pub(crate) fn config(field: &str, reason: impl Into<String>) -> Self {
        ProjectionError::Configuration {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ProjectionError>;

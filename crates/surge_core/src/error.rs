use thiserror::Error;

pub type SurgeResult<T> = Result<T, SurgeError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SurgeError {
    /// Non-positive steps, inverted ranges or non-finite bounds.
    #[error("Invalid grid: {reason}")]
    InvalidGrid { reason: String },

    #[error("Invalid equation parameters: {reason}")]
    InvalidParameters { reason: String },

    /// A diagnostic was asked to reduce a series too short to be meaningful.
    #[error("Degenerate series: {reason}")]
    DegenerateSeries { reason: String },
}

impl SurgeError {
    pub(crate) fn grid(reason: impl Into<String>) -> Self {
        Self::InvalidGrid {
            reason: reason.into(),
        }
    }

    pub(crate) fn parameters(reason: impl Into<String>) -> Self {
        Self::InvalidParameters {
            reason: reason.into(),
        }
    }

    pub(crate) fn degenerate(reason: impl Into<String>) -> Self {
        Self::DegenerateSeries {
            reason: reason.into(),
        }
    }
}

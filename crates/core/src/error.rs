use thiserror::Error;

/// Rejected construction inputs. Raised before anything is written.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Pattern {0:?} is empty after normalization")]
    EmptyPattern(String),
    #[error("Unknown match type: '{0}'")]
    UnknownMatchType(String),
    #[error("Confidence delta must be finite, got {0}")]
    NonFiniteDelta(f64),
    #[error("Confidence must be finite, got {0}")]
    NonFiniteConfidence(f64),
    #[error("Invalid confidence policy: {0}")]
    InvalidPolicy(String),
}

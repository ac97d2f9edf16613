use tagwise_core::{CorrectionId, ValidationError};
use thiserror::Error;

/// Failures from [`CorrectionStore`](crate::CorrectionStore). Backend errors
/// are carried as the backend's own type.
#[derive(Debug, Error)]
pub enum LearnError<E: std::error::Error + 'static> {
    #[error("Correction not found: {0}")]
    NotFound(CorrectionId),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Backend(E),
}

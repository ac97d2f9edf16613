use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Malformed tags column: {0}")]
    Tags(#[from] serde_json::Error),
    #[error("Malformed correction id: {0}")]
    Id(#[from] uuid::Error),
    #[error("Malformed correction row {id}: {reason}")]
    InvalidRow { id: String, reason: String },
}

use crate::schema::SchemaViolation;

/// Errors from reading or writing documents on disk.
#[derive(thiserror::Error, Debug)]
pub enum PersistError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("invalid annotation document: {0}")]
    Schema(#[from] SchemaViolation),
}

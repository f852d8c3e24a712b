//! Error types for emleak-format.

use emleak_em::EmError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FormatError {
    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error(transparent)]
    Field(#[from] EmError),
}

pub type Result<T> = std::result::Result<T, FormatError>;

//! Error types for artifact generation.

use thiserror::Error;

/// Result type alias for generation operations.
pub type GenResult<T> = Result<T, GenError>;

/// Errors that can occur during artifact generation.
#[derive(Error, Debug)]
pub enum GenError {
    #[error("Document rendering failed: {0}")]
    Render(#[from] serde_yaml::Error),
}

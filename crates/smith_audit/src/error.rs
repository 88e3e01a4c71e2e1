use std::path::PathBuf;

use thiserror::Error;

pub type AuditResult<T> = Result<T, AuditError>;

/// Errors from audit logging and artifact persistence.
#[derive(Error, Debug)]
pub enum AuditError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl AuditError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

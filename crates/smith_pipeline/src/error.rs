//! Pipeline error taxonomy.
//!
//! Structural problems in generated artifacts are report issues, never
//! errors; this enum covers only failures that stop a request outright.

use thiserror::Error;

pub type PipelineResult<T> = Result<T, PipelineError>;

#[derive(Error, Debug)]
pub enum PipelineError {
    /// Classification confidence fell below the configured threshold and
    /// the caller opted in to hard failure.
    #[error("Could not resolve intent: confidence {confidence:.2} below threshold {threshold:.2}")]
    UnresolvableIntent { confidence: f64, threshold: f64 },

    #[error("Unsupported artifact format: {0}")]
    UnsupportedFormat(String),

    /// An external collaborator (text generator, retriever) failed.
    #[error("Collaborator failure: {0}")]
    Collaborator(String),

    #[error(transparent)]
    Gen(#[from] smith_gen::GenError),

    #[error(transparent)]
    Audit(#[from] smith_audit::AuditError),

    #[error("Configuration error: {0}")]
    Config(String),
}

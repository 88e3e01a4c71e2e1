//! # smith_audit
//!
//! Append-only audit logging and artifact persistence. The audit log keeps
//! one JSONL record per pipeline attempt; the recorder writes passing
//! artifacts with a metadata sidecar describing where they came from.

pub mod error;
pub mod log;
pub mod recorder;

pub use error::{AuditError, AuditResult};
pub use log::{AuditEvent, AuditLog, EventKind, FileAuditLog};
pub use recorder::{ArtifactMetadata, ArtifactRecorder, FsRecorder};

//! Append-only audit logging.
//!
//! Every generation and validation attempt leaves one record. The file
//! format is JSONL so the log can be tailed and grepped without tooling.

use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;
use uuid::Uuid;

use crate::error::{AuditError, AuditResult};

/// What an audit record describes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Generation,
    Validation,
    Repair,
    Session,
}

/// One audit record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub kind: EventKind,
    pub details: Value,
    pub success: bool,
}

/// Append-only event sink.
pub trait AuditLog: Send + Sync {
    /// Append one event. Failures must not lose earlier records.
    fn record(&self, kind: EventKind, details: Value, success: bool) -> AuditResult<AuditEvent>;
}

/// JSONL-backed audit log.
pub struct FileAuditLog {
    path: PathBuf,
}

impl FileAuditLog {
    /// Opens (creating parents as needed) the audit file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> AuditResult<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| AuditError::io(parent, e))?;
        }
        info!(path = %path.display(), "audit log opened");
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The most recent `limit` events, oldest first.
    pub fn recent(&self, limit: usize) -> AuditResult<Vec<AuditEvent>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let file = fs::File::open(&self.path).map_err(|e| AuditError::io(&self.path, e))?;
        let mut events = Vec::new();
        for line in BufReader::new(file).lines() {
            let line = line.map_err(|e| AuditError::io(&self.path, e))?;
            if line.trim().is_empty() {
                continue;
            }
            events.push(serde_json::from_str(&line)?);
        }
        let skip = events.len().saturating_sub(limit);
        Ok(events.split_off(skip))
    }
}

impl AuditLog for FileAuditLog {
    fn record(&self, kind: EventKind, details: Value, success: bool) -> AuditResult<AuditEvent> {
        let event = AuditEvent {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            kind,
            details,
            success,
        };

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| AuditError::io(&self.path, e))?;
        let mut line = serde_json::to_string(&event)?;
        line.push('\n');
        file.write_all(line.as_bytes())
            .map_err(|e| AuditError::io(&self.path, e))?;

        Ok(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_records_are_appended_as_jsonl() {
        let dir = tempfile::tempdir().unwrap();
        let log = FileAuditLog::new(dir.path().join("audit.jsonl")).unwrap();

        log.record(EventKind::Generation, json!({"format": "terraform"}), true)
            .unwrap();
        log.record(EventKind::Validation, json!({"passed": false}), false)
            .unwrap();

        let events = log.recent(10).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].kind, EventKind::Generation);
        assert!(events[0].success);
        assert_eq!(events[1].kind, EventKind::Validation);
        assert!(!events[1].success);
        assert_ne!(events[0].id, events[1].id);
    }

    #[test]
    fn test_recent_limits_from_the_tail() {
        let dir = tempfile::tempdir().unwrap();
        let log = FileAuditLog::new(dir.path().join("audit.jsonl")).unwrap();
        for i in 0..5 {
            log.record(EventKind::Session, json!({"turn": i}), true)
                .unwrap();
        }
        let events = log.recent(2).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].details["turn"], 3);
        assert_eq!(events[1].details["turn"], 4);
    }

    #[test]
    fn test_missing_file_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let log = FileAuditLog::new(dir.path().join("audit.jsonl")).unwrap();
        assert!(log.recent(10).unwrap().is_empty());
    }

    #[test]
    fn test_parent_directories_are_created() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b").join("audit.jsonl");
        let log = FileAuditLog::new(&nested).unwrap();
        log.record(EventKind::Generation, json!({}), true).unwrap();
        assert!(nested.exists());
    }
}

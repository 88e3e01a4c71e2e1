//! Artifact persistence with sidecar metadata.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use smith_gen::Artifact;
use smith_intent::{Action, CloudProvider, IacFormat};

use crate::error::{AuditError, AuditResult};

/// Provenance stored next to a persisted artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactMetadata {
    /// The request text the artifact was generated from.
    pub request: String,
    pub format: IacFormat,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<CloudProvider>,
    pub action: Action,
    pub created_at: DateTime<Utc>,
}

impl ArtifactMetadata {
    pub fn new(
        request: impl Into<String>,
        format: IacFormat,
        provider: Option<CloudProvider>,
        action: Action,
    ) -> Self {
        Self {
            request: request.into(),
            format,
            provider,
            action,
            created_at: Utc::now(),
        }
    }
}

/// Persists passing artifacts.
pub trait ArtifactRecorder: Send + Sync {
    /// Store the artifact and its metadata, returning the artifact's path.
    fn save(&self, artifact: &Artifact, metadata: &ArtifactMetadata) -> AuditResult<PathBuf>;
}

/// Writes artifacts into a directory, with a `<name>.meta.json` sidecar.
pub struct FsRecorder {
    target_dir: PathBuf,
}

impl FsRecorder {
    pub fn new(target_dir: impl Into<PathBuf>) -> Self {
        Self {
            target_dir: target_dir.into(),
        }
    }

    pub fn target_dir(&self) -> &Path {
        &self.target_dir
    }
}

impl ArtifactRecorder for FsRecorder {
    fn save(&self, artifact: &Artifact, metadata: &ArtifactMetadata) -> AuditResult<PathBuf> {
        fs::create_dir_all(&self.target_dir).map_err(|e| AuditError::io(&self.target_dir, e))?;

        let filename = artifact.suggested_filename();
        let artifact_path = self.target_dir.join(&filename);
        fs::write(&artifact_path, &artifact.content)
            .map_err(|e| AuditError::io(&artifact_path, e))?;

        let meta_path = self.target_dir.join(format!("{filename}.meta.json"));
        let meta_json = serde_json::to_string_pretty(metadata)?;
        fs::write(&meta_path, meta_json).map_err(|e| AuditError::io(&meta_path, e))?;

        info!(path = %artifact_path.display(), "artifact recorded");
        Ok(artifact_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn artifact() -> Artifact {
        Artifact {
            format: IacFormat::Terraform,
            provider: Some(CloudProvider::Aws),
            content: "provider \"aws\" {}\n".to_string(),
        }
    }

    #[test]
    fn test_artifact_and_sidecar_are_written() {
        let dir = tempfile::tempdir().unwrap();
        let recorder = FsRecorder::new(dir.path());
        let metadata = ArtifactMetadata::new(
            "Create an instance",
            IacFormat::Terraform,
            Some(CloudProvider::Aws),
            Action::Create,
        );

        let path = recorder.save(&artifact(), &metadata).unwrap();
        assert_eq!(path, dir.path().join("main.tf"));
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "provider \"aws\" {}\n"
        );

        let sidecar = dir.path().join("main.tf.meta.json");
        let meta: ArtifactMetadata =
            serde_json::from_str(&fs::read_to_string(sidecar).unwrap()).unwrap();
        assert_eq!(meta.request, "Create an instance");
        assert_eq!(meta.format, IacFormat::Terraform);
        assert_eq!(meta.action, Action::Create);
    }

    #[test]
    fn test_target_directory_is_created() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("out").join("artifacts");
        let recorder = FsRecorder::new(&nested);
        let metadata =
            ArtifactMetadata::new("x", IacFormat::Terraform, None, Action::Create);
        recorder.save(&artifact(), &metadata).unwrap();
        assert!(nested.join("main.tf").exists());
    }
}

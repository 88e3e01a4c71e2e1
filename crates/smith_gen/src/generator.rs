//! The generator trait and format dispatch.

use serde::{Deserialize, Serialize};

use smith_intent::{CloudProvider, IacFormat, ResolvedRequest};

use crate::ansible::AnsibleGenerator;
use crate::docker::DockerGenerator;
use crate::error::GenResult;
use crate::kubernetes::KubernetesGenerator;
use crate::terraform::TerraformGenerator;

/// Generated description text. Immutable; persistence is the recorder's job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Artifact {
    pub format: IacFormat,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<CloudProvider>,
    pub content: String,
}

impl Artifact {
    /// Conventional filename for this artifact (each format owns its
    /// on-disk convention).
    pub fn suggested_filename(&self) -> String {
        match self.format {
            IacFormat::Terraform => "main.tf".to_string(),
            IacFormat::Kubernetes => "manifests.yaml".to_string(),
            IacFormat::Ansible => "playbook.yml".to_string(),
            IacFormat::Docker => {
                if self.content.trim_start().starts_with("services:")
                    || self.content.contains("\nservices:")
                {
                    "docker-compose.yml".to_string()
                } else {
                    "Dockerfile".to_string()
                }
            }
        }
    }
}

/// Capability set every format variant implements.
pub trait ArtifactGenerator: Send + Sync {
    /// The format this variant produces.
    fn format(&self) -> IacFormat;

    /// File suffix for artifacts of this format.
    fn file_suffix(&self) -> &'static str {
        self.format().file_suffix()
    }

    /// Produce a complete artifact from a resolved request.
    fn generate(&self, request: &ResolvedRequest) -> GenResult<Artifact>;

    /// Join generated sub-documents using the format's own separator.
    fn merge_documents(&self, docs: Vec<String>) -> String;
}

/// Closed dispatch over the supported formats.
pub fn generator_for(format: IacFormat) -> Box<dyn ArtifactGenerator> {
    match format {
        IacFormat::Terraform => Box::new(TerraformGenerator::new()),
        IacFormat::Kubernetes => Box::new(KubernetesGenerator::new()),
        IacFormat::Ansible => Box::new(AnsibleGenerator::new()),
        IacFormat::Docker => Box::new(DockerGenerator::new()),
    }
}

//! Structural validation: per-format required fields and well-formedness.
//!
//! Malformed input always comes back as issues, never as an error or a
//! panic, so one broken artifact cannot take down a validation run.

use async_trait::async_trait;
use serde_yaml::Value;
use tracing::debug;

use smith_gen::Artifact;
use smith_intent::IacFormat;

use crate::checker::ArtifactChecker;
use crate::report::{Issue, Severity};

const SOURCE: &str = "structural";

/// Checks that an artifact has the shape its format requires.
#[derive(Debug, Default)]
pub struct StructuralChecker;

impl StructuralChecker {
    pub fn new() -> Self {
        Self
    }

    fn check_terraform(&self, content: &str) -> Vec<Issue> {
        let mut issues = Vec::new();

        let opens = content.matches('{').count();
        let closes = content.matches('}').count();
        if opens != closes {
            issues.push(Issue::new(
                Severity::High,
                SOURCE,
                "Unbalanced braces",
                format!("Found {opens} opening and {closes} closing braces"),
            ));
        }

        let has_block = content.contains("terraform {")
            || content.contains("provider \"")
            || content.contains("resource \"");
        if !has_block {
            issues.push(Issue::new(
                Severity::High,
                SOURCE,
                "No Terraform blocks",
                "Expected at least one terraform, provider or resource block",
            ));
        }

        // Formatting nits are warnings only.
        if content.contains('\t') {
            issues.push(Issue::new(
                Severity::Low,
                SOURCE,
                "Tab indentation",
                "Terraform convention is two-space indentation",
            ));
        }

        issues
    }

    fn check_kubernetes(&self, content: &str) -> Vec<Issue> {
        let mut issues = Vec::new();

        for (i, doc) in content.split("\n---\n").enumerate() {
            let doc_num = i + 1;
            let value: Value = match serde_yaml::from_str(doc) {
                Ok(v) => v,
                Err(e) => {
                    issues.push(
                        Issue::new(Severity::High, SOURCE, "YAML parse error", e.to_string())
                            .with_location(format!("document {doc_num}")),
                    );
                    continue;
                }
            };
            if value.is_null() {
                continue;
            }

            for field in ["apiVersion", "kind", "metadata"] {
                if value.get(field).is_none() {
                    issues.push(
                        Issue::new(
                            Severity::High,
                            SOURCE,
                            format!("Missing '{field}'"),
                            format!("Every manifest needs a '{field}' field"),
                        )
                        .with_location(format!("document {doc_num}")),
                    );
                }
            }
            if value.get("metadata").map_or(false, |m| m.get("name").is_none()) {
                issues.push(
                    Issue::new(
                        Severity::High,
                        SOURCE,
                        "Missing 'metadata.name'",
                        "Every manifest needs a name",
                    )
                    .with_location(format!("document {doc_num}")),
                );
            }

            match value.get("kind").and_then(Value::as_str) {
                Some("Deployment") => self.check_deployment(&value, doc_num, &mut issues),
                Some("Service") => self.check_service(&value, doc_num, &mut issues),
                _ => {}
            }
        }

        issues
    }

    fn check_deployment(&self, doc: &Value, doc_num: usize, issues: &mut Vec<Issue>) {
        let spec = doc.get("spec");
        if spec.and_then(|s| s.get("selector")).is_none() {
            issues.push(
                Issue::new(
                    Severity::High,
                    SOURCE,
                    "Deployment missing 'spec.selector'",
                    "A Deployment selector is required",
                )
                .with_location(format!("document {doc_num}")),
            );
        }
        let containers = spec
            .and_then(|s| s.get("template"))
            .and_then(|t| t.get("spec"))
            .and_then(|s| s.get("containers"))
            .and_then(Value::as_sequence);
        match containers {
            Some(list) if !list.is_empty() => {
                for container in list {
                    for field in ["name", "image"] {
                        if container.get(field).is_none() {
                            issues.push(
                                Issue::new(
                                    Severity::High,
                                    SOURCE,
                                    format!("Container missing '{field}'"),
                                    format!("Each container needs a '{field}'"),
                                )
                                .with_location(format!("document {doc_num}")),
                            );
                        }
                    }
                }
            }
            _ => issues.push(
                Issue::new(
                    Severity::High,
                    SOURCE,
                    "Deployment has no containers",
                    "spec.template.spec.containers must list at least one container",
                )
                .with_location(format!("document {doc_num}")),
            ),
        }
    }

    fn check_service(&self, doc: &Value, doc_num: usize, issues: &mut Vec<Issue>) {
        let spec = doc.get("spec");
        for field in ["selector", "ports"] {
            if spec.and_then(|s| s.get(field)).is_none() {
                issues.push(
                    Issue::new(
                        Severity::High,
                        SOURCE,
                        format!("Service missing 'spec.{field}'"),
                        format!("A Service needs 'spec.{field}'"),
                    )
                    .with_location(format!("document {doc_num}")),
                );
            }
        }
    }

    fn check_ansible(&self, content: &str) -> Vec<Issue> {
        let mut issues = Vec::new();

        let value: Value = match serde_yaml::from_str(content) {
            Ok(v) => v,
            Err(e) => {
                issues.push(Issue::new(
                    Severity::High,
                    SOURCE,
                    "YAML parse error",
                    e.to_string(),
                ));
                return issues;
            }
        };

        let plays = match value.as_sequence() {
            Some(p) => p,
            None => {
                issues.push(Issue::new(
                    Severity::High,
                    SOURCE,
                    "Playbook is not a list",
                    "An Ansible playbook must be a top-level list of plays",
                ));
                return issues;
            }
        };

        for (i, play) in plays.iter().enumerate() {
            let play_num = i + 1;
            if play.get("hosts").is_none() {
                issues.push(
                    Issue::new(
                        Severity::High,
                        SOURCE,
                        "Play missing 'hosts'",
                        "Every play must declare its target hosts",
                    )
                    .with_location(format!("play {play_num}")),
                );
            }
            if play.get("tasks").is_none() && play.get("roles").is_none() {
                issues.push(
                    Issue::new(
                        Severity::Low,
                        SOURCE,
                        "Play has no tasks or roles",
                        "A play without tasks or roles does nothing",
                    )
                    .with_location(format!("play {play_num}")),
                );
            }
            if let Some(tasks) = play.get("tasks").and_then(Value::as_sequence) {
                for (j, task) in tasks.iter().enumerate() {
                    if task.get("name").is_none() {
                        issues.push(
                            Issue::new(
                                Severity::Low,
                                SOURCE,
                                "Unnamed task",
                                "Tasks should be named for readable play output",
                            )
                            .with_location(format!("play {play_num}, task {}", j + 1)),
                        );
                    }
                }
            }
        }

        issues
    }

    fn check_docker(&self, content: &str) -> Vec<Issue> {
        if content.trim_start().starts_with("services:") || content.contains("\nservices:") {
            return self.check_compose(content);
        }
        self.check_dockerfile(content)
    }

    fn check_dockerfile(&self, content: &str) -> Vec<Issue> {
        const INSTRUCTIONS: &[&str] = &[
            "FROM", "RUN", "CMD", "LABEL", "EXPOSE", "ENV", "ADD", "COPY", "ENTRYPOINT",
            "VOLUME", "USER", "WORKDIR", "ARG", "ONBUILD", "STOPSIGNAL", "HEALTHCHECK", "SHELL",
        ];

        let mut issues = Vec::new();
        let mut has_from = false;
        let mut continuation = false;

        for (i, raw) in content.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if continuation {
                continuation = line.ends_with('\\');
                continue;
            }
            continuation = line.ends_with('\\');

            let instruction = line.split_whitespace().next().unwrap_or("").to_uppercase();
            if instruction == "FROM" {
                has_from = true;
            }
            if !INSTRUCTIONS.contains(&instruction.as_str()) {
                issues.push(
                    Issue::new(
                        Severity::High,
                        SOURCE,
                        format!("Invalid instruction '{instruction}'"),
                        "Not a recognized Dockerfile instruction",
                    )
                    .with_location(format!("line {}", i + 1)),
                );
            }
        }

        if !has_from {
            issues.push(Issue::new(
                Severity::High,
                SOURCE,
                "Missing FROM instruction",
                "A Dockerfile must have at least one FROM instruction",
            ));
        }

        issues
    }

    fn check_compose(&self, content: &str) -> Vec<Issue> {
        let mut issues = Vec::new();

        let value: Value = match serde_yaml::from_str(content) {
            Ok(v) => v,
            Err(e) => {
                issues.push(Issue::new(
                    Severity::High,
                    SOURCE,
                    "YAML parse error",
                    e.to_string(),
                ));
                return issues;
            }
        };

        match value.get("services").and_then(Value::as_mapping) {
            None => issues.push(Issue::new(
                Severity::High,
                SOURCE,
                "Missing 'services' section",
                "A compose file needs a services mapping",
            )),
            Some(services) => {
                for (name, service) in services {
                    let name = name.as_str().unwrap_or("?");
                    if service.get("image").is_none() && service.get("build").is_none() {
                        issues.push(
                            Issue::new(
                                Severity::High,
                                SOURCE,
                                "Service without image or build",
                                format!("Service '{name}' must define 'image' or 'build'"),
                            )
                            .with_location(format!("services.{name}")),
                        );
                    }
                }
            }
        }

        issues
    }
}

#[async_trait]
impl ArtifactChecker for StructuralChecker {
    fn name(&self) -> &'static str {
        SOURCE
    }

    async fn check(&self, artifact: &Artifact) -> Vec<Issue> {
        debug!(format = %artifact.format, "running structural checks");
        match artifact.format {
            IacFormat::Terraform => self.check_terraform(&artifact.content),
            IacFormat::Kubernetes => self.check_kubernetes(&artifact.content),
            IacFormat::Ansible => self.check_ansible(&artifact.content),
            IacFormat::Docker => self.check_docker(&artifact.content),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn artifact(format: IacFormat, content: &str) -> Artifact {
        Artifact {
            format,
            provider: None,
            content: content.to_string(),
        }
    }

    #[tokio::test]
    async fn test_terraform_unbalanced_braces() {
        let issues = StructuralChecker::new()
            .check(&artifact(IacFormat::Terraform, "resource \"aws_instance\" \"x\" {\n"))
            .await;
        assert!(issues.iter().any(|i| i.title == "Unbalanced braces"));
    }

    #[tokio::test]
    async fn test_terraform_requires_a_block() {
        let issues = StructuralChecker::new()
            .check(&artifact(IacFormat::Terraform, "# just a comment\n"))
            .await;
        assert!(issues.iter().any(|i| i.title == "No Terraform blocks"));

        let issues = StructuralChecker::new()
            .check(&artifact(
                IacFormat::Terraform,
                "provider \"aws\" {\n  region = \"us-east-1\"\n}\n",
            ))
            .await;
        assert!(issues.is_empty());
    }

    #[tokio::test]
    async fn test_generated_single_instance_terraform_is_structurally_clean() {
        use smith_gen::{ArtifactGenerator, TerraformGenerator};
        use smith_intent::{IntentClassifier, ParameterExtractor, SessionContext};

        let text = "Create an EC2 instance with t3.micro on AWS";
        let intent = IntentClassifier::new().classify(text);
        let params = ParameterExtractor::new().extract(text);
        let resolved = SessionContext::new(1).reconcile(text, intent, params);

        let generated = TerraformGenerator::new().generate(&resolved).unwrap();
        let issues = StructuralChecker::new().check(&generated).await;
        assert!(
            !issues
                .iter()
                .any(|i| matches!(i.severity, Severity::Critical | Severity::High)),
            "unexpected blocking issues: {issues:?}"
        );
    }

    #[tokio::test]
    async fn test_kubernetes_missing_fields() {
        let issues = StructuralChecker::new()
            .check(&artifact(IacFormat::Kubernetes, "kind: Pod\nmetadata:\n  name: x\n"))
            .await;
        assert!(issues.iter().any(|i| i.title == "Missing 'apiVersion'"));
    }

    #[tokio::test]
    async fn test_kubernetes_deployment_needs_containers() {
        let manifest = "apiVersion: apps/v1\nkind: Deployment\nmetadata:\n  name: d\nspec:\n  selector:\n    matchLabels:\n      app: d\n";
        let issues = StructuralChecker::new()
            .check(&artifact(IacFormat::Kubernetes, manifest))
            .await;
        assert!(issues.iter().any(|i| i.title == "Deployment has no containers"));
    }

    #[tokio::test]
    async fn test_malformed_yaml_is_an_issue_not_a_panic() {
        let issues = StructuralChecker::new()
            .check(&artifact(IacFormat::Kubernetes, ":\n  - ]["))
            .await;
        assert!(issues.iter().any(|i| i.title == "YAML parse error"));
    }

    #[tokio::test]
    async fn test_ansible_requires_list_of_plays() {
        let issues = StructuralChecker::new()
            .check(&artifact(IacFormat::Ansible, "hosts: all\n"))
            .await;
        assert!(issues.iter().any(|i| i.title == "Playbook is not a list"));
    }

    #[tokio::test]
    async fn test_ansible_unnamed_task_is_a_warning() {
        let playbook = "- hosts: all\n  tasks:\n    - apt:\n        name: nginx\n";
        let issues = StructuralChecker::new()
            .check(&artifact(IacFormat::Ansible, playbook))
            .await;
        let unnamed: Vec<_> = issues.iter().filter(|i| i.title == "Unnamed task").collect();
        assert_eq!(unnamed.len(), 1);
        assert_eq!(unnamed[0].severity, Severity::Low);
    }

    #[tokio::test]
    async fn test_dockerfile_requires_from() {
        let issues = StructuralChecker::new()
            .check(&artifact(IacFormat::Docker, "RUN echo hi\n"))
            .await;
        assert!(issues.iter().any(|i| i.title == "Missing FROM instruction"));
    }

    #[tokio::test]
    async fn test_dockerfile_invalid_instruction() {
        let issues = StructuralChecker::new()
            .check(&artifact(IacFormat::Docker, "FROM ubuntu:22.04\nFRMO x\n"))
            .await;
        assert!(issues.iter().any(|i| i.title.contains("FRMO")));
    }

    #[tokio::test]
    async fn test_compose_service_needs_image_or_build() {
        let compose = "services:\n  app:\n    restart: always\n";
        let issues = StructuralChecker::new()
            .check(&artifact(IacFormat::Docker, compose))
            .await;
        assert!(issues.iter().any(|i| i.title == "Service without image or build"));
    }
}

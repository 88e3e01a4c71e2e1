//! Security scanning across all artifact formats.

use async_trait::async_trait;
use regex::{Regex, RegexBuilder};
use tracing::debug;

use smith_gen::Artifact;
use smith_intent::IacFormat;

use crate::checker::ArtifactChecker;
use crate::report::{Issue, Severity};

const SOURCE: &str = "security";

/// Pattern-based scanner for common security problems.
pub struct SecurityChecker {
    secret_patterns: Vec<(Regex, &'static str)>,
    public_acl: Regex,
    open_ingress: Regex,
    from_latest: Regex,
    user_instruction: Regex,
    run_as_non_root: Regex,
    resource_limits: Regex,
    storage_encrypted: Regex,
    ebs_encrypted: Regex,
}

impl Default for SecurityChecker {
    fn default() -> Self {
        Self::new()
    }
}

impl SecurityChecker {
    pub fn new() -> Self {
        let secret_patterns = [
            (r#"password\s*=\s*["']"#, "Hardcoded password"),
            (r#"api[_-]?key\s*=\s*["']"#, "Hardcoded API key"),
            (r#"secret[_-]?key\s*=\s*["']"#, "Hardcoded secret key"),
            (r#"access[_-]?key\s*=\s*["']"#, "Hardcoded access key"),
            (r#"token\s*=\s*["']"#, "Hardcoded token"),
        ]
        .into_iter()
        .map(|(pattern, title)| {
            let re = RegexBuilder::new(pattern)
                .case_insensitive(true)
                .build()
                .expect("static regex");
            (re, title)
        })
        .collect();

        Self {
            secret_patterns,
            public_acl: RegexBuilder::new(r#"acl\s*=\s*["']public"#)
                .case_insensitive(true)
                .build()
                .expect("static regex"),
            open_ingress: Regex::new(r"(?s)ingress.*0\.0\.0\.0/0").expect("static regex"),
            from_latest: Regex::new(r"FROM\s+\S+:latest").expect("static regex"),
            user_instruction: Regex::new(r"(?m)^USER\s+\w+").expect("static regex"),
            run_as_non_root: Regex::new(r"runAsNonRoot:\s*true").expect("static regex"),
            resource_limits: Regex::new(r"(?s)resources:.*limits:").expect("static regex"),
            storage_encrypted: Regex::new(r"storage_encrypted\s*=\s*true").expect("static regex"),
            ebs_encrypted: Regex::new(r"encrypted\s*=\s*true").expect("static regex"),
        }
    }

    fn check_secrets(&self, content: &str) -> Vec<Issue> {
        let mut issues = Vec::new();
        for (re, title) in &self.secret_patterns {
            for m in re.find_iter(content) {
                // A reference right after the quote means the value comes
                // from a variable, not a literal.
                let rest = &content[m.end()..];
                if rest.starts_with("var.") || rest.starts_with("data.") || rest.starts_with("{{") {
                    continue;
                }
                let line = content[..m.start()].matches('\n').count() + 1;
                issues.push(
                    Issue::new(
                        Severity::Critical,
                        SOURCE,
                        *title,
                        format!("{title} found in artifact. Use variables or a secret manager."),
                    )
                    .with_location(format!("line {line}"))
                    .with_remediation("Reference a variable or secret store instead of a literal"),
                );
            }
        }
        issues
    }

    fn check_public_access(&self, content: &str) -> Vec<Issue> {
        let mut issues = Vec::new();
        if self.open_ingress.is_match(content) {
            issues.push(
                Issue::new(
                    Severity::High,
                    SOURCE,
                    "Overly permissive ingress rule",
                    "Security group allows ingress from 0.0.0.0/0",
                )
                .with_remediation("Limit ingress to specific IP ranges or security groups"),
            );
        }
        if self.public_acl.is_match(content) {
            issues.push(
                Issue::new(
                    Severity::High,
                    SOURCE,
                    "Public bucket ACL",
                    "Storage bucket configured with a public ACL",
                )
                .with_remediation("Use a private ACL and explicit bucket policies"),
            );
        }
        if content.contains("type: LoadBalancer") || content.contains("type: NodePort") {
            issues.push(
                Issue::new(
                    Severity::Medium,
                    SOURCE,
                    "Service exposed externally",
                    "Service is reachable from outside the cluster",
                )
                .with_remediation("Confirm external exposure is intentional"),
            );
        }
        issues
    }

    fn check_encryption(&self, content: &str) -> Vec<Issue> {
        let mut issues = Vec::new();
        if content.contains("aws_s3_bucket") && !content.contains("server_side_encryption") {
            issues.push(
                Issue::new(
                    Severity::High,
                    SOURCE,
                    "S3 bucket without encryption",
                    "S3 bucket has no server-side encryption configured",
                )
                .with_remediation("Enable SSE-S3 or SSE-KMS"),
            );
        }
        if content.contains("aws_db_instance") && !self.storage_encrypted.is_match(content) {
            issues.push(
                Issue::new(
                    Severity::High,
                    SOURCE,
                    "Unencrypted database",
                    "Database instance has encryption disabled",
                )
                .with_remediation("Set storage_encrypted = true"),
            );
        }
        if content.contains("aws_ebs_volume") && !self.ebs_encrypted.is_match(content) {
            issues.push(
                Issue::new(
                    Severity::Medium,
                    SOURCE,
                    "Unencrypted EBS volume",
                    "EBS volume is not encrypted",
                )
                .with_remediation("Enable EBS volume encryption"),
            );
        }
        issues
    }

    fn check_kubernetes(&self, content: &str) -> Vec<Issue> {
        let mut issues = Vec::new();
        if content.contains("privileged: true") {
            issues.push(
                Issue::new(
                    Severity::Critical,
                    SOURCE,
                    "Privileged container",
                    "Container runs in privileged mode",
                )
                .with_remediation("Drop privileged mode unless strictly required"),
            );
        }
        if !self.run_as_non_root.is_match(content) {
            issues.push(
                Issue::new(
                    Severity::High,
                    SOURCE,
                    "Container may run as root",
                    "No securityContext.runAsNonRoot: true found",
                )
                .with_remediation("Set securityContext.runAsNonRoot: true"),
            );
        }
        if content.contains("hostNetwork: true") {
            issues.push(
                Issue::new(
                    Severity::High,
                    SOURCE,
                    "Host network enabled",
                    "Pod shares the node's network namespace",
                )
                .with_remediation("Remove hostNetwork unless required"),
            );
        }
        if content.contains("containers:") && !self.resource_limits.is_match(content) {
            issues.push(
                Issue::new(
                    Severity::Medium,
                    SOURCE,
                    "Missing resource limits",
                    "Containers have no CPU or memory limits",
                )
                .with_remediation("Define resources.limits for every container"),
            );
        }
        issues
    }

    fn check_docker(&self, content: &str) -> Vec<Issue> {
        let mut issues = Vec::new();
        if content.contains("USER root") || !self.user_instruction.is_match(content) {
            issues.push(
                Issue::new(
                    Severity::High,
                    SOURCE,
                    "Container runs as root",
                    "Dockerfile does not switch to a non-root user",
                )
                .with_remediation("Add a USER instruction for a non-root user"),
            );
        }
        if self.from_latest.is_match(content) {
            issues.push(
                Issue::new(
                    Severity::Medium,
                    SOURCE,
                    "Using 'latest' tag",
                    "Base image is pinned to 'latest'",
                )
                .with_remediation("Pin the base image to a specific version"),
            );
        }
        issues
    }
}

#[async_trait]
impl ArtifactChecker for SecurityChecker {
    fn name(&self) -> &'static str {
        SOURCE
    }

    async fn check(&self, artifact: &Artifact) -> Vec<Issue> {
        debug!(format = %artifact.format, "running security checks");
        let content = &artifact.content;

        let mut issues = self.check_secrets(content);
        issues.extend(self.check_public_access(content));
        issues.extend(self.check_encryption(content));

        match artifact.format {
            IacFormat::Kubernetes => issues.extend(self.check_kubernetes(content)),
            IacFormat::Docker => {
                // Compose files carry their own services, not instructions.
                if !content.contains("services:") {
                    issues.extend(self.check_docker(content));
                }
            }
            _ => {}
        }

        issues
    }
}

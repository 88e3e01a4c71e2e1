//! Organizational policy compliance.
//!
//! Policies are an ordered list of independently toggleable rules. Adding a
//! rule means appending to the list; the evaluation loop never changes.

use async_trait::async_trait;
use regex::Regex;
use tracing::debug;

use smith_gen::Artifact;
use smith_intent::IacFormat;

use crate::checker::ArtifactChecker;
use crate::report::{Issue, Severity};

const SOURCE: &str = "compliance";

type RuleFn = fn(&Artifact, Severity) -> Vec<Issue>;

/// One policy: a stable id, a default severity, an on/off switch and the
/// check itself.
pub struct PolicyRule {
    pub id: &'static str,
    pub severity: Severity,
    pub enabled: bool,
    check: RuleFn,
}

/// Evaluates every enabled policy rule against an artifact.
pub struct ComplianceChecker {
    rules: Vec<PolicyRule>,
}

impl Default for ComplianceChecker {
    fn default() -> Self {
        Self::new()
    }
}

impl ComplianceChecker {
    pub fn new() -> Self {
        Self {
            rules: vec![
                PolicyRule {
                    id: "required-tags",
                    severity: Severity::Medium,
                    enabled: true,
                    check: check_tagging,
                },
                PolicyRule {
                    id: "encryption-at-rest",
                    severity: Severity::High,
                    enabled: true,
                    check: check_encryption,
                },
                PolicyRule {
                    id: "backup-retention",
                    severity: Severity::Medium,
                    enabled: true,
                    check: check_backup,
                },
                PolicyRule {
                    id: "no-default-vpc",
                    severity: Severity::High,
                    enabled: true,
                    check: check_default_vpc,
                },
                PolicyRule {
                    id: "access-logging",
                    severity: Severity::Medium,
                    enabled: true,
                    check: check_logging,
                },
            ],
        }
    }

    /// Toggle one rule by id; unknown ids are ignored.
    pub fn set_enabled(&mut self, id: &str, enabled: bool) {
        if let Some(rule) = self.rules.iter_mut().find(|r| r.id == id) {
            rule.enabled = enabled;
        }
    }

    pub fn rule_ids(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.id).collect()
    }
}

const MIN_BACKUP_RETENTION_DAYS: i64 = 7;

fn check_tagging(artifact: &Artifact, severity: Severity) -> Vec<Issue> {
    let mut issues = Vec::new();
    match artifact.format {
        IacFormat::Terraform => {
            let resource_re =
                Regex::new(r#"resource\s+"(\w+)"\s+"(\w+)"\s*\{"#).expect("static regex");
            for caps in resource_re.captures_iter(&artifact.content) {
                let start = caps.get(0).map(|m| m.start()).unwrap_or(0);
                let block = extract_block(&artifact.content, start);
                if !block.contains("tags") && !block.contains("tag {") {
                    issues.push(
                        Issue::new(
                            severity,
                            SOURCE,
                            "Resource without tags",
                            format!("Resource '{}' has no tags", &caps[2]),
                        )
                        .with_location(format!("{}.{}", &caps[1], &caps[2]))
                        .with_remediation("Tag resources for ownership and cost allocation"),
                    );
                }
            }
        }
        IacFormat::Kubernetes => {
            if !artifact.content.contains("labels:") {
                issues.push(
                    Issue::new(
                        Severity::Low,
                        SOURCE,
                        "Resources without labels",
                        "Kubernetes resources should carry labels",
                    )
                    .with_remediation("Add labels to every manifest"),
                );
            }
        }
        _ => {}
    }
    issues
}

fn check_encryption(artifact: &Artifact, severity: Severity) -> Vec<Issue> {
    let mut issues = Vec::new();
    if artifact.format != IacFormat::Terraform {
        return issues;
    }
    let content = &artifact.content;
    if content.contains("aws_s3_bucket")
        && !content.contains("server_side_encryption_configuration")
    {
        issues.push(
            Issue::new(
                severity,
                SOURCE,
                "Storage without encryption at rest",
                "S3 bucket has no server-side encryption configuration",
            )
            .with_remediation("Add a server_side_encryption_configuration block"),
        );
    }
    let encrypted = Regex::new(r"storage_encrypted\s*=\s*true").expect("static regex");
    if content.contains("aws_db_instance") && !encrypted.is_match(content) {
        issues.push(
            Issue::new(
                severity,
                SOURCE,
                "Database without encryption at rest",
                "RDS instance must enable storage encryption",
            )
            .with_remediation("Set storage_encrypted = true"),
        );
    }
    issues
}

fn check_backup(artifact: &Artifact, severity: Severity) -> Vec<Issue> {
    let mut issues = Vec::new();
    if artifact.format != IacFormat::Terraform {
        return issues;
    }
    let content = &artifact.content;
    if content.contains("aws_db_instance") {
        let retention_re =
            Regex::new(r"backup_retention_period\s*=\s*(\d+)").expect("static regex");
        match retention_re.captures(content) {
            None => issues.push(
                Issue::new(
                    severity,
                    SOURCE,
                    "No backup retention configured",
                    "RDS instance must configure backup retention",
                )
                .with_remediation(format!(
                    "Set backup_retention_period >= {MIN_BACKUP_RETENTION_DAYS}"
                )),
            ),
            Some(caps) => {
                let days: i64 = caps[1].parse().unwrap_or(0);
                if days < MIN_BACKUP_RETENTION_DAYS {
                    issues.push(
                        Issue::new(
                            Severity::Low,
                            SOURCE,
                            "Backup retention below minimum",
                            format!(
                                "Retention is {days} days, minimum is {MIN_BACKUP_RETENTION_DAYS}"
                            ),
                        )
                        .with_remediation(format!(
                            "Increase backup_retention_period to at least {MIN_BACKUP_RETENTION_DAYS}"
                        )),
                    );
                }
            }
        }
    }
    if content.contains("aws_s3_bucket") && !content.contains("status = \"Enabled\"") {
        issues.push(
            Issue::new(
                Severity::Low,
                SOURCE,
                "Bucket versioning disabled",
                "S3 bucket should enable versioning for data protection",
            )
            .with_remediation("Enable bucket versioning"),
        );
    }
    issues
}

fn check_default_vpc(artifact: &Artifact, severity: Severity) -> Vec<Issue> {
    let lower = artifact.content.to_lowercase();
    if lower.contains("default_vpc") || lower.contains("default-vpc") {
        vec![Issue::new(
            severity,
            SOURCE,
            "Default VPC in use",
            "Workloads must not run in the default VPC",
        )
        .with_remediation("Create a dedicated VPC with proper segmentation")]
    } else {
        Vec::new()
    }
}

fn check_logging(artifact: &Artifact, severity: Severity) -> Vec<Issue> {
    let mut issues = Vec::new();
    if artifact.format != IacFormat::Terraform {
        return issues;
    }
    let content = &artifact.content;
    if content.contains("aws_s3_bucket") && !content.contains("logging {") {
        issues.push(
            Issue::new(
                severity,
                SOURCE,
                "Bucket without access logging",
                "S3 bucket has no access logging configured",
            )
            .with_remediation("Enable S3 access logging"),
        );
    }
    if content.contains("aws_db_instance") && !content.contains("enabled_cloudwatch_logs_exports")
    {
        issues.push(
            Issue::new(
                severity,
                SOURCE,
                "Database without log exports",
                "RDS instance does not export logs",
            )
            .with_remediation("Enable CloudWatch log exports"),
        );
    }
    issues
}

/// Extract the brace-delimited block starting at `start`.
fn extract_block(content: &str, start: usize) -> &str {
    let bytes = content.as_bytes();
    let mut depth = 0usize;
    let mut entered = false;
    for (offset, &b) in bytes[start..].iter().enumerate() {
        match b {
            b'{' => {
                depth += 1;
                entered = true;
            }
            b'}' => {
                depth = depth.saturating_sub(1);
                if entered && depth == 0 {
                    return &content[start..=start + offset];
                }
            }
            _ => {}
        }
    }
    &content[start..]
}

#[async_trait]
impl ArtifactChecker for ComplianceChecker {
    fn name(&self) -> &'static str {
        SOURCE
    }

    async fn check(&self, artifact: &Artifact) -> Vec<Issue> {
        debug!(format = %artifact.format, "running compliance checks");
        let mut issues = Vec::new();
        for rule in self.rules.iter().filter(|r| r.enabled) {
            issues.extend((rule.check)(artifact, rule.severity));
        }
        issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn terraform(content: &str) -> Artifact {
        Artifact {
            format: IacFormat::Terraform,
            provider: None,
            content: content.to_string(),
        }
    }

    #[tokio::test]
    async fn test_untagged_resource_is_flagged() {
        let content = "resource \"aws_instance\" \"web\" {\n  ami = \"abc\"\n}\n";
        let issues = ComplianceChecker::new().check(&terraform(content)).await;
        assert!(issues
            .iter()
            .any(|i| i.title == "Resource without tags" && i.severity == Severity::Medium));
    }

    #[tokio::test]
    async fn test_tagged_resource_passes_tagging_rule() {
        let content =
            "resource \"aws_instance\" \"web\" {\n  tags = {\n    Name = \"web\"\n  }\n}\n";
        let issues = ComplianceChecker::new().check(&terraform(content)).await;
        assert!(!issues.iter().any(|i| i.title == "Resource without tags"));
    }

    #[tokio::test]
    async fn test_unencrypted_storage_violates_policy() {
        let content = "resource \"aws_s3_bucket\" \"b\" {\n  tags = { Name = \"b\" }\n}\n";
        let issues = ComplianceChecker::new().check(&terraform(content)).await;
        assert!(issues
            .iter()
            .any(|i| i.title == "Storage without encryption at rest"
                && i.severity == Severity::High));
    }

    #[tokio::test]
    async fn test_short_backup_retention_is_low_severity() {
        let content = "resource \"aws_db_instance\" \"db\" {\n  storage_encrypted = true\n  backup_retention_period = 3\n  tags = { Name = \"db\" }\n  enabled_cloudwatch_logs_exports = [\"postgresql\"]\n}\n";
        let issues = ComplianceChecker::new().check(&terraform(content)).await;
        assert!(issues
            .iter()
            .any(|i| i.title == "Backup retention below minimum" && i.severity == Severity::Low));
        assert!(!issues.iter().any(|i| i.title == "No backup retention configured"));
    }

    #[tokio::test]
    async fn test_default_vpc_is_prohibited() {
        let content = "resource \"aws_default_vpc\" \"main\" {\n  tags = { Name = \"x\" }\n}\n";
        let issues = ComplianceChecker::new().check(&terraform(content)).await;
        assert!(issues
            .iter()
            .any(|i| i.title == "Default VPC in use" && i.severity == Severity::High));
    }

    #[tokio::test]
    async fn test_rules_can_be_toggled_independently() {
        let content = "resource \"aws_instance\" \"web\" {\n  ami = \"abc\"\n}\n";
        let mut checker = ComplianceChecker::new();
        checker.set_enabled("required-tags", false);
        let issues = checker.check(&terraform(content)).await;
        assert!(!issues.iter().any(|i| i.title == "Resource without tags"));
    }

    #[tokio::test]
    async fn test_rule_list_is_stable() {
        let checker = ComplianceChecker::new();
        assert_eq!(
            checker.rule_ids(),
            vec![
                "required-tags",
                "encryption-at-rest",
                "backup-retention",
                "no-default-vpc",
                "access-logging",
            ]
        );
    }
}

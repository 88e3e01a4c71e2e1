//! The checker trait and the fan-out that runs every checker concurrently.

use async_trait::async_trait;
use futures::future::join_all;
use tracing::info;

use smith_gen::Artifact;

use crate::report::{Issue, ValidationReport};

/// One validation concern. Checkers are read-only over the artifact and
/// independent of each other; no checker may rely on running before or
/// after another.
#[async_trait]
pub trait ArtifactChecker: Send + Sync {
    fn name(&self) -> &'static str;

    async fn check(&self, artifact: &Artifact) -> Vec<Issue>;
}

/// Runs every checker against the artifact concurrently and aggregates
/// their findings into one report.
pub async fn run_checkers(
    checkers: &[Box<dyn ArtifactChecker>],
    artifact: &Artifact,
) -> ValidationReport {
    let futures = checkers.iter().map(|c| c.check(artifact));
    let issues: Vec<Issue> = join_all(futures).await.into_iter().flatten().collect();

    let report = ValidationReport::aggregate(issues);
    info!(
        issues = report.summary.total(),
        critical = report.summary.critical,
        high = report.summary.high,
        passed = report.passed,
        "validation complete"
    );
    report
}

/// The standard gate: structural, security and compliance checks.
pub fn default_checkers() -> Vec<Box<dyn ArtifactChecker>> {
    vec![
        Box::new(crate::structural::StructuralChecker::new()),
        Box::new(crate::security::SecurityChecker::new()),
        Box::new(crate::compliance::ComplianceChecker::new()),
    ]
}

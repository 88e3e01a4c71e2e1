//! Issues, severity accounting and the aggregated report.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Issue severity, ordered worst-first.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Critical => "CRITICAL",
            Self::High => "HIGH",
            Self::Medium => "MEDIUM",
            Self::Low => "LOW",
            Self::Info => "INFO",
        };
        f.write_str(s)
    }
}

/// A single finding from one checker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    pub severity: Severity,
    pub title: String,
    pub description: String,
    /// Checker that produced the issue.
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remediation: Option<String>,
}

impl Issue {
    pub fn new(
        severity: Severity,
        source: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            title: title.into(),
            description: description.into(),
            source: source.into(),
            location: None,
            remediation: None,
        }
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_remediation(mut self, remediation: impl Into<String>) -> Self {
        self.remediation = Some(remediation.into());
        self
    }
}

/// Histogram of issues by severity.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SeverityCounts {
    pub critical: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    pub info: usize,
}

impl SeverityCounts {
    pub fn count(&mut self, severity: Severity) {
        match severity {
            Severity::Critical => self.critical += 1,
            Severity::High => self.high += 1,
            Severity::Medium => self.medium += 1,
            Severity::Low => self.low += 1,
            Severity::Info => self.info += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.critical + self.high + self.medium + self.low + self.info
    }
}

/// The aggregated outcome of a validation run.
///
/// `passed` is always derived from the summary, never set directly, so the
/// gate cannot drift from the issues it is supposed to reflect.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationReport {
    pub issues: Vec<Issue>,
    pub summary: SeverityCounts,
    pub passed: bool,
}

impl ValidationReport {
    /// Build a report from raw checker output. Issues are sorted by
    /// severity so the report is independent of checker completion order.
    pub fn aggregate(mut issues: Vec<Issue>) -> Self {
        issues.sort_by(|a, b| a.severity.cmp(&b.severity).then(a.title.cmp(&b.title)));

        let mut summary = SeverityCounts::default();
        for issue in &issues {
            summary.count(issue.severity);
        }
        let passed = summary.critical == 0 && summary.high == 0;

        Self {
            issues,
            summary,
            passed,
        }
    }

    /// Issues at or above the given severity.
    pub fn at_least(&self, severity: Severity) -> impl Iterator<Item = &Issue> {
        self.issues.iter().filter(move |i| i.severity <= severity)
    }
}

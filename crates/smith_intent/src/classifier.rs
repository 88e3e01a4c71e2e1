//! Rule-based intent classification.
//!
//! Action, format and provider are each chosen by scoring a fixed keyword
//! table; one generic scorer serves all three, so new tags are a table entry
//! away. Resources are collected by independent regexes over common
//! infrastructure nouns.

use std::collections::BTreeSet;

use regex::Regex;
use tracing::debug;

use crate::types::{Action, CloudProvider, IacFormat, Intent};

/// Keyword tables: ordered `(tag, triggers)` pairs. Declaration order breaks
/// score ties, so the more specific tags come first.
const ACTION_TABLE: &[(Action, &[&str])] = &[
    (Action::Create, &["create", "deploy", "setup", "provision", "build", "launch", "spin up", "make"]),
    (Action::Modify, &["modify", "update", "change", "edit", "alter", "adjust", "reconfigure"]),
    (Action::Delete, &["delete", "remove", "destroy", "terminate", "tear down", "decommission"]),
    (Action::Scale, &["scale", "resize", "increase", "decrease", "expand", "shrink"]),
    (Action::Query, &["show", "list", "get", "describe", "what", "how", "explain"]),
    (Action::Validate, &["validate", "check", "verify", "lint"]),
];

const FORMAT_TABLE: &[(IacFormat, &[&str])] = &[
    (IacFormat::Terraform, &["terraform", "tf ", "hcl"]),
    (IacFormat::Kubernetes, &["kubernetes", "k8s", "kubectl", "deployment", "pod", "helm"]),
    (IacFormat::Ansible, &["ansible", "playbook", "role"]),
    (IacFormat::Docker, &["docker", "dockerfile", "compose"]),
];

const PROVIDER_TABLE: &[(CloudProvider, &[&str])] = &[
    (CloudProvider::Aws, &["aws", "amazon", "ec2", "s3", "rds", "lambda", "cloudformation"]),
    (CloudProvider::Azure, &["azure", "microsoft", "blob", "cosmos", "aks"]),
    (CloudProvider::Gcp, &["gcp", "google cloud", "gce", "gcs", "bigquery"]),
];

/// Secondary hints consulted when no format table scores. These words are
/// weaker than the table keywords but still count as a detection, not a
/// default, for confidence purposes.
const FORMAT_FALLBACK: &[(IacFormat, &[&str])] = &[
    (IacFormat::Kubernetes, &["manifest", "replica", "namespace", "ingress"]),
    (IacFormat::Ansible, &["task", "inventory"]),
    (IacFormat::Docker, &["container", "image"]),
];

/// Deterministic keyword-table classifier.
pub struct IntentClassifier {
    resource_patterns: Vec<(Regex, &'static str)>,
}

impl IntentClassifier {
    pub fn new() -> Self {
        // Each pattern maps to a canonical resource tag.
        let patterns = [
            (r"\b(ec2|instances?|vms?|virtual machines?)\b", "instance"),
            (r"\b(s3|buckets?|storage)\b", "storage"),
            (r"\b(rds|databases?|db)\b", "database"),
            (r"\b(vpc|networks?)\b", "network"),
            (r"\b(load balancers?|alb|elb|lb)\b", "load_balancer"),
            (r"\b(lambda|functions?)\b", "function"),
            (r"\b(containers?|pods?)\b", "container"),
            (r"\b(services?)\b", "service"),
            (r"\b(deployments?|web apps?|apps?|applications?)\b", "deployment"),
            (r"\b(volumes?|disks?)\b", "volume"),
        ];

        let resource_patterns = patterns
            .into_iter()
            .map(|(p, tag)| (Regex::new(p).expect("resource pattern is valid"), tag))
            .collect();

        Self { resource_patterns }
    }

    /// Classify free text into an [`Intent`].
    ///
    /// Confidence is a deterministic four-term sum:
    /// 0.3 (action, always) + 0.3 (format detected, not defaulted)
    /// + 0.2 (provider resolved) + 0.2 (resources non-empty), capped at 1.0.
    pub fn classify(&self, text: &str) -> Intent {
        let lower = text.to_lowercase();

        let action = score_table(&lower, ACTION_TABLE).unwrap_or_default();
        let provider = score_table(&lower, PROVIDER_TABLE);
        let resources = self.extract_resources(&lower);

        // Format resolution chain: table keywords, then context-word hints,
        // then the provider-implied inference (naming a cloud provider is a
        // detection of the general-purpose format, not a default).
        let format = score_table(&lower, FORMAT_TABLE)
            .or_else(|| score_table(&lower, FORMAT_FALLBACK))
            .or_else(|| provider.map(|_| IacFormat::Terraform));

        let mut confidence: f64 = 0.3; // action always resolves (Create default)
        if format.is_some() {
            confidence += 0.3;
        }
        if provider.is_some() {
            confidence += 0.2;
        }
        if !resources.is_empty() {
            confidence += 0.2;
        }
        let confidence = confidence.min(1.0);

        debug!(
            %action,
            format = ?format,
            provider = ?provider,
            resources = resources.len(),
            confidence,
            "classified intent"
        );

        Intent {
            action,
            format,
            provider,
            resources,
            confidence,
        }
    }

    /// Plain threshold comparison; callers decide what to do below it.
    pub fn is_actionable(&self, intent: &Intent, threshold: f64) -> bool {
        intent.confidence >= threshold
    }

    fn extract_resources(&self, lower: &str) -> BTreeSet<String> {
        self.resource_patterns
            .iter()
            .filter(|(re, _)| re.is_match(lower))
            .map(|(_, tag)| tag.to_string())
            .collect()
    }
}

impl Default for IntentClassifier {
    fn default() -> Self {
        Self::new()
    }
}

/// Generic table scorer: count of each tag's triggers present in the text;
/// highest score wins, ties broken by declaration order; zero means no match.
fn score_table<T: Copy>(lower: &str, table: &[(T, &[&str])]) -> Option<T> {
    let mut best: Option<(T, usize)> = None;
    for (tag, triggers) in table {
        let score = triggers.iter().filter(|t| lower.contains(*t)).count();
        if score > 0 && best.map_or(true, |(_, s)| score > s) {
            best = Some((*tag, score));
        }
    }
    best.map(|(tag, _)| tag)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scenario_a_ec2_on_aws() {
        let classifier = IntentClassifier::new();
        let intent = classifier.classify("Create an EC2 instance with t3.micro on AWS");

        assert_eq!(intent.action, Action::Create);
        assert_eq!(intent.provider, Some(CloudProvider::Aws));
        assert!(intent.resources.contains("instance"));
        assert!(intent.confidence >= 0.8);
    }

    #[test]
    fn test_scenario_b_resolves_kubernetes() {
        let classifier = IntentClassifier::new();
        let intent = classifier.classify("Deploy a web app with 3 replicas on Kubernetes");

        assert_eq!(intent.action, Action::Create);
        assert_eq!(intent.format, Some(IacFormat::Kubernetes));
    }

    #[test]
    fn test_format_fallback_from_context_words() {
        let classifier = IntentClassifier::new();
        // No format table keyword, but "image" hints at Docker.
        let intent = classifier.classify("build an image for the api");
        assert_eq!(intent.format, Some(IacFormat::Docker));
    }

    #[test]
    fn test_empty_text_defaults() {
        let classifier = IntentClassifier::new();
        let intent = classifier.classify("");

        assert_eq!(intent.action, Action::Create);
        assert_eq!(intent.format, None);
        assert_eq!(intent.provider, None);
        assert!(intent.resources.is_empty());
        // Only the always-true action term.
        assert!((intent.confidence - 0.3).abs() < f64::EPSILON);
    }

    #[test]
    fn test_confidence_is_the_four_term_sum() {
        let classifier = IntentClassifier::new();
        let cases = [
            "hello there",
            "create a bucket",
            "terraform for an aws instance",
            "deploy 3 pods to kubernetes on gcp",
            "scale the azure database down",
        ];
        for text in cases {
            let intent = classifier.classify(text);
            let mut expected: f64 = 0.3;
            if intent.format.is_some() {
                expected += 0.3;
            }
            if intent.provider.is_some() {
                expected += 0.2;
            }
            if !intent.resources.is_empty() {
                expected += 0.2;
            }
            assert!((intent.confidence - expected.min(1.0)).abs() < f64::EPSILON, "{text}");
            assert!((0.0..=1.0).contains(&intent.confidence));
        }
    }

    #[test]
    fn test_action_keywords() {
        let classifier = IntentClassifier::new();
        assert_eq!(classifier.classify("tear down the staging vpc").action, Action::Delete);
        assert_eq!(classifier.classify("resize the cluster").action, Action::Scale);
        assert_eq!(classifier.classify("verify the playbook").action, Action::Validate);
    }

    #[test]
    fn test_resources_deduplicated() {
        let classifier = IntentClassifier::new();
        let intent = classifier.classify("an instance, another instance, and a vm");
        assert_eq!(
            intent.resources.iter().filter(|r| *r == "instance").count(),
            1
        );
    }

    #[test]
    fn test_is_actionable_threshold() {
        let classifier = IntentClassifier::new();
        let intent = classifier.classify("create an s3 bucket on aws with terraform");
        assert!(classifier.is_actionable(&intent, 0.5));
        assert!(!classifier.is_actionable(&intent, 1.1));
    }
}

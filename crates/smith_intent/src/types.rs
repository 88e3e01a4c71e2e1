//! Core types for intent classification and parameter extraction.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

/// The primary action a request asks for.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    #[default]
    Create,
    Modify,
    Delete,
    Scale,
    Query,
    Validate,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Create => "create",
            Self::Modify => "modify",
            Self::Delete => "delete",
            Self::Scale => "scale",
            Self::Query => "query",
            Self::Validate => "validate",
        };
        f.write_str(s)
    }
}

/// Supported infrastructure-description formats.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum IacFormat {
    /// The most general-purpose format; the default when nothing matches.
    #[default]
    Terraform,
    Kubernetes,
    Ansible,
    Docker,
}

impl IacFormat {
    /// File suffix for artifacts of this format (Dockerfiles have none).
    pub fn file_suffix(&self) -> &'static str {
        match self {
            Self::Terraform => ".tf",
            Self::Kubernetes => ".yaml",
            Self::Ansible => ".yml",
            Self::Docker => "",
        }
    }

    /// Parse a user-supplied format name (CLI flags, config files).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "terraform" | "tf" | "hcl" => Some(Self::Terraform),
            "kubernetes" | "k8s" => Some(Self::Kubernetes),
            "ansible" => Some(Self::Ansible),
            "docker" | "dockerfile" | "compose" => Some(Self::Docker),
            _ => None,
        }
    }
}

impl fmt::Display for IacFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Terraform => "terraform",
            Self::Kubernetes => "kubernetes",
            Self::Ansible => "ansible",
            Self::Docker => "docker",
        };
        f.write_str(s)
    }
}

/// Cloud providers the generators know about.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CloudProvider {
    Aws,
    Azure,
    Gcp,
}

impl CloudProvider {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "aws" | "amazon" => Some(Self::Aws),
            "azure" | "microsoft" => Some(Self::Azure),
            "gcp" | "google" => Some(Self::Gcp),
            _ => None,
        }
    }
}

impl fmt::Display for CloudProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Aws => "aws",
            Self::Azure => "azure",
            Self::Gcp => "gcp",
        };
        f.write_str(s)
    }
}

/// Classified purpose of a single request.
///
/// Immutable once produced by the classifier. `format` and `provider` are
/// `None` when nothing in the text resolved them; defaults are applied only
/// after context back-fill, so that the session can supply a better answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Intent {
    pub action: Action,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<IacFormat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<CloudProvider>,
    /// Deduplicated resource tags mentioned in the text.
    pub resources: BTreeSet<String>,
    /// Deterministic four-term sum in `[0, 1]`, see [`IntentClassifier`].
    ///
    /// [`IntentClassifier`]: crate::IntentClassifier
    pub confidence: f64,
}

/// A single extracted attribute value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Int(i64),
    Str(String),
    IntList(Vec<i64>),
    StrList(Vec<String>),
}

impl ParamValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int_list(&self) -> Option<&[i64]> {
        match self {
            Self::IntList(v) => Some(v),
            _ => None,
        }
    }
}

impl From<&str> for ParamValue {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<i64> for ParamValue {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<bool> for ParamValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

/// The six parameter groups the extractor knows about.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum ParamGroupKind {
    Compute,
    Storage,
    Network,
    Scaling,
    Security,
    General,
}

impl ParamGroupKind {
    pub fn all() -> [Self; 6] {
        [
            Self::Compute,
            Self::Storage,
            Self::Network,
            Self::Scaling,
            Self::Security,
            Self::General,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Compute => "compute",
            Self::Storage => "storage",
            Self::Network => "network",
            Self::Scaling => "scaling",
            Self::Security => "security",
            Self::General => "general",
        }
    }
}

/// Attributes within one group: name → scalar or list value.
pub type ParamGroup = BTreeMap<String, ParamValue>;

/// Typed attributes extracted from a request, organized into groups.
///
/// A group absent from the set means no rule fired for it; groups are never
/// present-but-empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ParameterSet {
    #[serde(flatten)]
    groups: BTreeMap<ParamGroupKind, ParamGroup>,
}

impl ParameterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an attribute, creating its group on first use.
    pub fn insert(&mut self, kind: ParamGroupKind, name: impl Into<String>, value: ParamValue) {
        self.groups.entry(kind).or_default().insert(name.into(), value);
    }

    /// Insert a whole group, dropping it if empty (empty groups are never stored).
    pub fn insert_group(&mut self, kind: ParamGroupKind, group: ParamGroup) {
        if !group.is_empty() {
            self.groups.insert(kind, group);
        }
    }

    pub fn group(&self, kind: ParamGroupKind) -> Option<&ParamGroup> {
        self.groups.get(&kind)
    }

    pub fn contains_group(&self, kind: ParamGroupKind) -> bool {
        self.groups.contains_key(&kind)
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Group kinds present in this set, in declaration order.
    pub fn present_groups(&self) -> Vec<ParamGroupKind> {
        ParamGroupKind::all()
            .into_iter()
            .filter(|k| self.groups.contains_key(k))
            .collect()
    }

    /// Look up one attribute: `get(Scaling, "count")`.
    pub fn get(&self, kind: ParamGroupKind, name: &str) -> Option<&ParamValue> {
        self.groups.get(&kind).and_then(|g| g.get(name))
    }

    pub fn get_int(&self, kind: ParamGroupKind, name: &str) -> Option<i64> {
        self.get(kind, name).and_then(ParamValue::as_int)
    }

    pub fn get_bool(&self, kind: ParamGroupKind, name: &str) -> Option<bool> {
        self.get(kind, name).and_then(ParamValue::as_bool)
    }

    pub fn get_str(&self, kind: ParamGroupKind, name: &str) -> Option<&str> {
        self.get(kind, name).and_then(ParamValue::as_str)
    }

    /// True when the flag is present and set.
    pub fn flag(&self, kind: ParamGroupKind, name: &str) -> bool {
        self.get_bool(kind, name).unwrap_or(false)
    }

    /// Merge another set on top of this one: groups present on `other`
    /// replace this set's group wholesale (group-level last-write-wins).
    pub fn merge_groups_from(&mut self, other: &ParameterSet) {
        for (kind, group) in &other.groups {
            self.groups.insert(*kind, group.clone());
        }
    }
}

/// An [`Intent`] + [`ParameterSet`] after context back-fill, with the
/// format default applied. This is what generators consume; it is a derived
/// value recomputed every turn, never stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedRequest {
    pub action: Action,
    pub format: IacFormat,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<CloudProvider>,
    pub resources: BTreeSet<String>,
    pub parameters: ParameterSet,
    pub confidence: f64,
}

impl ResolvedRequest {
    /// True if any resource tag contains one of the given needles.
    pub fn mentions(&self, needles: &[&str]) -> bool {
        self.resources
            .iter()
            .any(|r| needles.iter().any(|n| r.contains(n)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parameter_set_never_stores_empty_groups() {
        let mut params = ParameterSet::new();
        params.insert_group(ParamGroupKind::Compute, ParamGroup::new());
        assert!(params.is_empty());

        params.insert(ParamGroupKind::Scaling, "count", ParamValue::Int(3));
        assert_eq!(params.present_groups(), vec![ParamGroupKind::Scaling]);
        assert_eq!(params.get_int(ParamGroupKind::Scaling, "count"), Some(3));
    }

    #[test]
    fn test_group_level_merge_replaces_whole_group() {
        let mut base = ParameterSet::new();
        base.insert(ParamGroupKind::Network, "ports", ParamValue::IntList(vec![80]));
        base.insert(ParamGroupKind::Network, "load_balancer", ParamValue::Bool(true));
        base.insert(ParamGroupKind::General, "environment", "staging".into());

        let mut update = ParameterSet::new();
        update.insert(ParamGroupKind::Network, "ports", ParamValue::IntList(vec![443]));

        base.merge_groups_from(&update);

        // The whole network group is replaced: load_balancer is gone.
        assert_eq!(base.get(ParamGroupKind::Network, "load_balancer"), None);
        assert_eq!(
            base.get(ParamGroupKind::Network, "ports"),
            Some(&ParamValue::IntList(vec![443]))
        );
        // Untouched groups survive.
        assert_eq!(base.get_str(ParamGroupKind::General, "environment"), Some("staging"));
    }

    #[test]
    fn test_format_parse_and_suffix() {
        assert_eq!(IacFormat::parse("k8s"), Some(IacFormat::Kubernetes));
        assert_eq!(IacFormat::parse("hcl"), Some(IacFormat::Terraform));
        assert_eq!(IacFormat::parse("bicep"), None);
        assert_eq!(IacFormat::Terraform.file_suffix(), ".tf");
        assert_eq!(IacFormat::Docker.file_suffix(), "");
    }

    #[test]
    fn test_param_set_serializes_flat() {
        let mut params = ParameterSet::new();
        params.insert(ParamGroupKind::Scaling, "count", ParamValue::Int(3));
        let json = serde_json::to_value(&params).unwrap();
        assert_eq!(json["scaling"]["count"], 3);
    }
}

//! Parameter extraction from free text.
//!
//! Pure function of the input: independent pattern rules per group fire
//! against the lower-cased text. A rule that does not match is a non-match,
//! never an error, and a group with no matches is omitted from the result.

use regex::Regex;
use tracing::debug;

use crate::types::{ParamGroup, ParamGroupKind, ParamValue, ParameterSet};

/// Regex-rule parameter extractor. All patterns are compiled once at
/// construction; extraction itself is allocation-light and infallible.
pub struct ParameterExtractor {
    instance_types: Vec<Regex>,
    cpu: Regex,
    memory: Regex,
    storage_size: Regex,
    port: Regex,
    vpc: Regex,
    count: Regex,
    min_size: Regex,
    max_size: Regex,
    region: Regex,
    name: Regex,
}

impl ParameterExtractor {
    pub fn new() -> Self {
        let compile = |p: &str| Regex::new(p).expect("extractor pattern is valid");

        Self {
            // Ordered: first match wins within the family.
            instance_types: vec![
                compile(r"t2\.(micro|small|medium|large)"),
                compile(r"t3\.(micro|small|medium|large)"),
                compile(r"m5\.(large|xlarge|2xlarge)"),
                compile(r"\b(small|medium|large|xlarge) instance"),
            ],
            cpu: compile(r"(\d+)\s*(?:cpu|core|vcpu)s?"),
            memory: compile(r"(\d+)\s*(gb|gib|mb|mib)\s*(?:ram|memory)"),
            storage_size: compile(r"(\d+)\s*(gb|tb|gib|tib)\b"),
            port: compile(r"port\s+(\d+)"),
            vpc: compile(r"vpc[- ]?(\w+)"),
            count: compile(r"(\d+)\s*(?:instance|replica|node|server)s?"),
            min_size: compile(r"min(?:imum)?\s+(?:of\s+)?(\d+)"),
            max_size: compile(r"max(?:imum)?\s+(?:of\s+)?(\d+)"),
            region: compile(r"\b(us-east-1|us-west-1|us-west-2|eu-west-1|eu-central-1|ap-southeast-1)\b"),
            name: compile(r#"named?\s+["']?(\w+)["']?"#),
        }
    }

    /// Extract all parameter groups from the text. Groups with no extracted
    /// attributes are omitted, never present-but-empty.
    pub fn extract(&self, text: &str) -> ParameterSet {
        let lower = text.to_lowercase();

        let mut params = ParameterSet::new();
        params.insert_group(ParamGroupKind::Compute, self.compute(&lower));
        params.insert_group(ParamGroupKind::Storage, self.storage(&lower));
        params.insert_group(ParamGroupKind::Network, self.network(&lower));
        params.insert_group(ParamGroupKind::Scaling, self.scaling(&lower));
        params.insert_group(ParamGroupKind::Security, self.security(&lower));
        params.insert_group(ParamGroupKind::General, self.general(&lower));

        debug!(groups = ?params.present_groups(), "extracted parameters");
        params
    }

    fn compute(&self, lower: &str) -> ParamGroup {
        let mut group = ParamGroup::new();

        for pattern in &self.instance_types {
            if let Some(m) = pattern.find(lower) {
                group.insert("instance_type".into(), m.as_str().into());
                break;
            }
        }

        if let Some(n) = first_int(&self.cpu, lower) {
            group.insert("cpu".into(), ParamValue::Int(n));
        }

        if let Some(caps) = self.memory.captures(lower) {
            group.insert("memory".into(), format!("{}{}", &caps[1], &caps[2]).into());
        }

        const OS_KEYWORDS: &[(&str, &str)] = &[
            ("ubuntu", "ubuntu"),
            ("amazon linux", "amazon-linux"),
            ("centos", "centos"),
            ("windows", "windows"),
            ("debian", "debian"),
            ("alpine", "alpine"),
        ];
        for (keyword, os) in OS_KEYWORDS {
            if lower.contains(keyword) {
                group.insert("os".into(), (*os).into());
                break;
            }
        }

        group
    }

    fn storage(&self, lower: &str) -> ParamGroup {
        let mut group = ParamGroup::new();

        if let Some(caps) = self.storage_size.captures(lower) {
            group.insert("size".into(), format!("{}{}", &caps[1], &caps[2]).into());
        }

        if ["ssd", "gp3", "gp2"].iter().any(|k| lower.contains(k)) {
            group.insert("type".into(), "ssd".into());
        } else if lower.contains("magnetic") || lower.contains("standard storage") {
            group.insert("type".into(), "standard".into());
        }

        if lower.contains("backup") || lower.contains("snapshot") {
            group.insert("backup_enabled".into(), true.into());
        }
        if lower.contains("versioning") || lower.contains("version") {
            group.insert("versioning_enabled".into(), true.into());
        }
        if lower.contains("encrypt") {
            group.insert("encryption_enabled".into(), true.into());
        }

        group
    }

    fn network(&self, lower: &str) -> ParamGroup {
        let mut group = ParamGroup::new();

        let mut ports: Vec<i64> = self
            .port
            .captures_iter(lower)
            .filter_map(|c| c[1].parse().ok())
            .collect();
        if ports.is_empty() && lower.contains("http") {
            ports.push(80);
        }
        if lower.contains("https") && !ports.contains(&443) {
            ports.push(443);
        }
        if !ports.is_empty() {
            group.insert("ports".into(), ParamValue::IntList(ports));
        }

        if lower.contains("load balancer") || lower.contains(" lb") {
            group.insert("load_balancer".into(), true.into());
        }

        if lower.contains("public") {
            group.insert("public_access".into(), true.into());
        } else if lower.contains("private") {
            group.insert("public_access".into(), false.into());
        }

        if let Some(caps) = self.vpc.captures(lower) {
            group.insert("vpc".into(), caps[1].into());
        }

        group
    }

    fn scaling(&self, lower: &str) -> ParamGroup {
        let mut group = ParamGroup::new();

        if let Some(n) = first_int(&self.count, lower) {
            group.insert("count".into(), ParamValue::Int(n));
        }
        if let Some(n) = first_int(&self.min_size, lower) {
            group.insert("min_size".into(), ParamValue::Int(n));
        }
        if let Some(n) = first_int(&self.max_size, lower) {
            group.insert("max_size".into(), ParamValue::Int(n));
        }

        if lower.contains("auto") && lower.contains("scal") {
            group.insert("auto_scaling".into(), true.into());
        }
        if lower.contains("high availability") || lower.contains("highly available") {
            group.insert("high_availability".into(), true.into());
        }
        if lower.contains("multi-az") || lower.contains("multi az") {
            group.insert("multi_az".into(), true.into());
        }

        group
    }

    fn security(&self, lower: &str) -> ParamGroup {
        let mut group = ParamGroup::new();

        if ["ssl", "tls", "https"].iter().any(|k| lower.contains(k)) {
            group.insert("ssl_enabled".into(), true.into());
        }
        if lower.contains("auth") {
            group.insert("authentication_required".into(), true.into());
        }
        if lower.contains("firewall") || lower.contains("security group") {
            group.insert("firewall_enabled".into(), true.into());
        }
        if ["iam", "rbac"].iter().any(|k| lower.contains(k)) {
            group.insert("rbac_enabled".into(), true.into());
        }

        group
    }

    fn general(&self, lower: &str) -> ParamGroup {
        let mut group = ParamGroup::new();

        if let Some(caps) = self.region.captures(lower) {
            group.insert("region".into(), caps[1].into());
        }

        const ENVIRONMENTS: &[&str] = &["production", "staging", "development", "test", "dev", "prod"];
        for env in ENVIRONMENTS {
            if lower.contains(env) {
                group.insert("environment".into(), (*env).into());
                break;
            }
        }

        if let Some(caps) = self.name.captures(lower) {
            group.insert("name".into(), caps[1].into());
        }

        if ["monitor", "logging", "cloudwatch"].iter().any(|k| lower.contains(k)) {
            group.insert("monitoring_enabled".into(), true.into());
        }

        group
    }

    /// Cross-group sanity checks. Advisory only: warnings never block
    /// extraction or escalate to errors.
    pub fn validate(&self, params: &ParameterSet) -> Vec<String> {
        let mut warnings = Vec::new();

        if params.flag(ParamGroupKind::Scaling, "auto_scaling")
            && params.get_int(ParamGroupKind::Scaling, "min_size").is_none()
        {
            warnings.push("Auto-scaling enabled but min_size not specified".to_string());
        }

        if params.get_bool(ParamGroupKind::Network, "public_access") == Some(true)
            && !params.contains_group(ParamGroupKind::Security)
        {
            warnings.push(
                "Public access enabled without explicit security configuration".to_string(),
            );
        }

        if let (Some(min), Some(max)) = (
            params.get_int(ParamGroupKind::Scaling, "min_size"),
            params.get_int(ParamGroupKind::Scaling, "max_size"),
        ) {
            if min > max {
                warnings.push(format!("Scaling min_size {min} exceeds max_size {max}"));
            }
        }

        warnings
    }
}

impl Default for ParameterExtractor {
    fn default() -> Self {
        Self::new()
    }
}

fn first_int(pattern: &Regex, text: &str) -> Option<i64> {
    pattern.captures(text).and_then(|c| c[1].parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scenario_b_replica_count() {
        let extractor = ParameterExtractor::new();
        let params = extractor.extract("Deploy a web app with 3 replicas on Kubernetes");
        assert_eq!(params.get_int(ParamGroupKind::Scaling, "count"), Some(3));
    }

    #[test]
    fn test_compute_instance_type_first_match_wins() {
        let extractor = ParameterExtractor::new();
        let params = extractor.extract("a t3.micro with 4 cpus and 8gb ram on ubuntu");
        assert_eq!(
            params.get_str(ParamGroupKind::Compute, "instance_type"),
            Some("t3.micro")
        );
        assert_eq!(params.get_int(ParamGroupKind::Compute, "cpu"), Some(4));
        assert_eq!(params.get_str(ParamGroupKind::Compute, "memory"), Some("8gb"));
        assert_eq!(params.get_str(ParamGroupKind::Compute, "os"), Some("ubuntu"));
    }

    #[test]
    fn test_storage_flags() {
        let extractor = ParameterExtractor::new();
        let params = extractor.extract("500gb encrypted ssd storage with versioning and backups");
        assert_eq!(params.get_str(ParamGroupKind::Storage, "size"), Some("500gb"));
        assert_eq!(params.get_str(ParamGroupKind::Storage, "type"), Some("ssd"));
        assert!(params.flag(ParamGroupKind::Storage, "encryption_enabled"));
        assert!(params.flag(ParamGroupKind::Storage, "versioning_enabled"));
        assert!(params.flag(ParamGroupKind::Storage, "backup_enabled"));
    }

    #[test]
    fn test_network_ports_and_https_convenience() {
        let extractor = ParameterExtractor::new();
        let params = extractor.extract("expose port 8080 and port 9090");
        assert_eq!(
            params.get(ParamGroupKind::Network, "ports"),
            Some(&ParamValue::IntList(vec![8080, 9090]))
        );

        let params = extractor.extract("serve https traffic");
        assert_eq!(
            params.get(ParamGroupKind::Network, "ports"),
            Some(&ParamValue::IntList(vec![80, 443]))
        );
    }

    #[test]
    fn test_scaling_min_max_and_autoscaling() {
        let extractor = ParameterExtractor::new();
        let params =
            extractor.extract("auto scaling with a minimum of 2 and maximum of 10 instances");
        assert_eq!(params.get_int(ParamGroupKind::Scaling, "min_size"), Some(2));
        assert_eq!(params.get_int(ParamGroupKind::Scaling, "max_size"), Some(10));
        assert!(params.flag(ParamGroupKind::Scaling, "auto_scaling"));
    }

    #[test]
    fn test_no_group_is_present_but_empty() {
        let extractor = ParameterExtractor::new();
        for text in ["", "hello world", "create a bucket with 3 replicas in us-east-1"] {
            let params = extractor.extract(text);
            for kind in params.present_groups() {
                assert!(!params.group(kind).unwrap().is_empty(), "{text}: {kind:?}");
            }
        }
    }

    #[test]
    fn test_extraction_is_pure() {
        let extractor = ParameterExtractor::new();
        let text = "3 replicas behind a load balancer in production";
        assert_eq!(extractor.extract(text), extractor.extract(text));
    }

    #[test]
    fn test_validate_warns_on_autoscaling_without_min() {
        let extractor = ParameterExtractor::new();
        let params = extractor.extract("enable auto scaling");
        let warnings = extractor.validate(&params);
        assert!(warnings.iter().any(|w| w.contains("min_size")));
    }

    #[test]
    fn test_validate_warns_on_public_without_security() {
        let extractor = ParameterExtractor::new();
        let params = extractor.extract("a public bucket");
        let warnings = extractor.validate(&params);
        assert!(warnings.iter().any(|w| w.contains("Public access")));
    }

    #[test]
    fn test_general_group() {
        let extractor = ParameterExtractor::new();
        let params = extractor.extract("a service named orders in us-east-1 for production with monitoring");
        assert_eq!(params.get_str(ParamGroupKind::General, "name"), Some("orders"));
        assert_eq!(params.get_str(ParamGroupKind::General, "region"), Some("us-east-1"));
        assert_eq!(
            params.get_str(ParamGroupKind::General, "environment"),
            Some("production")
        );
        assert!(params.flag(ParamGroupKind::General, "monitoring_enabled"));
    }
}

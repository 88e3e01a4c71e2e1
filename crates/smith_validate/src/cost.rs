//! Monthly cost estimation for generated artifacts.
//!
//! Estimates are informational only and never gate a validation run. The
//! pricing table is a coarse on-demand snapshot; shapes it cannot price
//! still contribute a zero-cost line with a note so nothing silently
//! disappears from the breakdown.

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use smith_gen::Artifact;
use smith_intent::IacFormat;

/// Default billing hours per month.
pub const HOURS_PER_MONTH: f64 = 730.0;

/// Assumed storage footprint for usage-based bucket pricing, in GB.
const ASSUMED_BUCKET_GB: f64 = 100.0;

const EC2_PRICING: &[(&str, f64)] = &[
    ("t2.micro", 0.0116),
    ("t2.small", 0.023),
    ("t2.medium", 0.0464),
    ("t3.micro", 0.0104),
    ("t3.small", 0.0208),
    ("t3.medium", 0.0416),
    ("m5.large", 0.096),
    ("m5.xlarge", 0.192),
];

const RDS_PRICING: &[(&str, f64)] = &[
    ("db.t3.micro", 0.017),
    ("db.t3.small", 0.034),
    ("db.t3.medium", 0.068),
];

const S3_PER_GB_MONTH: f64 = 0.023;
const ALB_HOURLY: f64 = 0.0225;
const ALB_LCU_HOURLY: f64 = 0.008;

/// One priced line of the estimate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostLine {
    pub resource_type: String,
    pub resource_name: String,
    pub details: String,
    pub hourly_cost: f64,
    pub monthly_cost: f64,
    pub yearly_cost: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Aggregated cost estimate for one artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostEstimate {
    pub currency: String,
    pub breakdown: Vec<CostLine>,
    pub monthly_total: f64,
    pub yearly_total: f64,
    pub warnings: Vec<String>,
}

/// Estimates monthly cost from artifact text.
pub struct CostEstimator {
    hours_per_month: f64,
    instance_re: Regex,
    asg_re: Regex,
    rds_re: Regex,
    bucket_re: Regex,
    alb_re: Regex,
    multi_az_re: Regex,
}

impl Default for CostEstimator {
    fn default() -> Self {
        Self::new(HOURS_PER_MONTH)
    }
}

impl CostEstimator {
    pub fn new(hours_per_month: f64) -> Self {
        Self {
            hours_per_month,
            instance_re: Regex::new(
                r#"(?s)resource\s+"aws_instance"\s+"(\w+)".*?instance_type\s*=\s*"([^"]+)""#,
            )
            .expect("static regex"),
            asg_re: Regex::new(
                r#"(?s)resource\s+"aws_autoscaling_group".*?min_size\s*=\s*(\d+).*?max_size\s*=\s*(\d+)"#,
            )
            .expect("static regex"),
            rds_re: Regex::new(
                r#"(?s)resource\s+"aws_db_instance"\s+"(\w+)".*?instance_class\s*=\s*"([^"]+)""#,
            )
            .expect("static regex"),
            bucket_re: Regex::new(r#"resource\s+"aws_s3_bucket"\s+"(\w+)""#).expect("static regex"),
            alb_re: Regex::new(r#"resource\s+"aws_lb"\s+"(\w+)""#).expect("static regex"),
            multi_az_re: Regex::new(r"multi_az\s*=\s*true").expect("static regex"),
        }
    }

    pub fn estimate(&self, artifact: &Artifact) -> CostEstimate {
        debug!(format = %artifact.format, "estimating costs");

        let mut estimate = CostEstimate {
            currency: "USD".to_string(),
            breakdown: Vec::new(),
            monthly_total: 0.0,
            yearly_total: 0.0,
            warnings: Vec::new(),
        };

        match artifact.format {
            IacFormat::Terraform => self.estimate_terraform(&artifact.content, &mut estimate),
            IacFormat::Kubernetes => estimate
                .warnings
                .push("Cluster costs depend on node pool configuration".to_string()),
            IacFormat::Docker => estimate
                .warnings
                .push("Container costs depend on the deployment platform".to_string()),
            IacFormat::Ansible => estimate
                .warnings
                .push("Playbooks configure existing hosts; no resource costs".to_string()),
        }

        estimate.monthly_total = estimate.breakdown.iter().map(|l| l.monthly_cost).sum();
        estimate.yearly_total = estimate.monthly_total * 12.0;

        if estimate.monthly_total > 1000.0 {
            estimate
                .warnings
                .push("Estimated monthly cost exceeds $1,000".to_string());
        }
        if estimate.monthly_total == 0.0 && estimate.breakdown.is_empty() {
            estimate
                .warnings
                .push("Nothing matched the pricing table".to_string());
        }

        estimate
    }

    fn estimate_terraform(&self, content: &str, estimate: &mut CostEstimate) {
        for caps in self.instance_re.captures_iter(content) {
            let name = caps[1].to_string();
            let instance_type = &caps[2];
            let hourly = lookup(EC2_PRICING, instance_type);
            estimate.breakdown.push(self.line(
                "Compute instance",
                name,
                format!("Instance type: {instance_type}"),
                hourly,
                hourly.is_none().then(|| "Pricing not available for this type".to_string()),
            ));
        }

        for caps in self.asg_re.captures_iter(content) {
            let min: f64 = caps[1].parse().unwrap_or(0.0);
            let max: f64 = caps[2].parse().unwrap_or(0.0);
            estimate.breakdown.push(self.line(
                "Auto scaling group",
                "asg".to_string(),
                format!("Estimated {} instances", (min + max) / 2.0),
                None,
                Some("Actual cost depends on instance type and scaling behavior".to_string()),
            ));
        }

        for caps in self.rds_re.captures_iter(content) {
            let name = caps[1].to_string();
            let class = &caps[2];
            let multiplier = if self.multi_az_re.is_match(content) { 2.0 } else { 1.0 };
            let hourly = lookup(RDS_PRICING, class).map(|h| h * multiplier);
            estimate.breakdown.push(self.line(
                "Database instance",
                name,
                format!("Instance class: {class}, Multi-AZ: {}", multiplier > 1.0),
                hourly,
                hourly.is_none().then(|| "Pricing not available for this class".to_string()),
            ));
        }

        for caps in self.bucket_re.captures_iter(content) {
            let monthly = ASSUMED_BUCKET_GB * S3_PER_GB_MONTH;
            estimate.breakdown.push(CostLine {
                resource_type: "Storage bucket".to_string(),
                resource_name: caps[1].to_string(),
                details: format!("Assumed {ASSUMED_BUCKET_GB} GB stored"),
                hourly_cost: 0.0,
                monthly_cost: monthly,
                yearly_cost: monthly * 12.0,
                note: Some("Actual cost depends on storage usage and requests".to_string()),
            });
        }

        for caps in self.alb_re.captures_iter(content) {
            let hourly = ALB_HOURLY + ALB_LCU_HOURLY;
            estimate.breakdown.push(self.line(
                "Load balancer",
                caps[1].to_string(),
                "Estimated 1 LCU average".to_string(),
                Some(hourly),
                Some("LCU costs vary with traffic".to_string()),
            ));
        }
    }

    fn line(
        &self,
        resource_type: &str,
        resource_name: String,
        details: String,
        hourly: Option<f64>,
        note: Option<String>,
    ) -> CostLine {
        let hourly = hourly.unwrap_or(0.0);
        let monthly = hourly * self.hours_per_month;
        CostLine {
            resource_type: resource_type.to_string(),
            resource_name,
            details,
            hourly_cost: hourly,
            monthly_cost: monthly,
            yearly_cost: monthly * 12.0,
            note,
        }
    }
}

fn lookup(table: &[(&str, f64)], key: &str) -> Option<f64> {
    table.iter().find(|(k, _)| *k == key).map(|(_, v)| *v)
}

//! Validate command - Gate an existing artifact file.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use smith_gen::Artifact;
use smith_intent::{CloudProvider, IacFormat};
use smith_pipeline::PipelineError;
use smith_validate::{default_checkers, run_checkers, CostEstimator, HOURS_PER_MONTH};

use super::{print_cost, print_report};

#[derive(Args)]
pub struct ValidateArgs {
    /// Path to the artifact file
    file: PathBuf,

    /// Artifact format (terraform, kubernetes, ansible, docker);
    /// inferred from the filename when omitted
    #[arg(short, long)]
    format: Option<String>,

    /// Cloud provider the artifact targets (aws, azure, gcp)
    #[arg(short, long)]
    provider: Option<String>,

    /// Emit the report as JSON instead of text
    #[arg(long)]
    json: bool,
}

pub async fn execute(args: ValidateArgs) -> Result<()> {
    let content = std::fs::read_to_string(&args.file)
        .with_context(|| format!("failed to read {}", args.file.display()))?;

    let format = match &args.format {
        Some(flag) => IacFormat::parse(flag)
            .ok_or_else(|| PipelineError::UnsupportedFormat(flag.clone()))?,
        None => infer_format(&args.file).ok_or_else(|| {
            anyhow::anyhow!(
                "could not infer format of {}; pass --format",
                args.file.display()
            )
        })?,
    };
    let provider = match &args.provider {
        Some(flag) => Some(
            CloudProvider::parse(flag)
                .ok_or_else(|| anyhow::anyhow!("unsupported provider option: {flag}"))?,
        ),
        None => None,
    };

    info!(format = %format, "Validating {}", args.file.display());

    let artifact = Artifact {
        format,
        provider,
        content,
    };

    let checkers = default_checkers();
    let report = run_checkers(&checkers, &artifact).await;
    let cost = CostEstimator::new(HOURS_PER_MONTH).estimate(&artifact);

    if args.json {
        let json = serde_json::json!({ "report": report, "cost": cost });
        println!("{}", serde_json::to_string_pretty(&json)?);
    } else {
        print_report(&report);
        print_cost(&cost);
    }

    if report.passed {
        if !args.json {
            println!();
            println!("✅ Validation gate PASSED");
        }
        Ok(())
    } else {
        if !args.json {
            println!();
            println!("❌ Validation gate FAILED");
        }
        std::process::exit(3);
    }
}

/// Best-effort format detection from conventional filenames.
fn infer_format(path: &Path) -> Option<IacFormat> {
    let name = path.file_name()?.to_str()?.to_lowercase();
    if name == "dockerfile" || name.starts_with("dockerfile.") || name.contains("compose") {
        return Some(IacFormat::Docker);
    }
    if name.contains("playbook") {
        return Some(IacFormat::Ansible);
    }
    match path.extension()?.to_str()? {
        "tf" => Some(IacFormat::Terraform),
        "yaml" => Some(IacFormat::Kubernetes),
        "yml" => Some(IacFormat::Ansible),
        _ => None,
    }
}

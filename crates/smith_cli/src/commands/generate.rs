//! Generate command - Process a request end to end.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use smith_audit::{FileAuditLog, FsRecorder};
use smith_intent::{CloudProvider, IacFormat};
use smith_pipeline::{PipelineConfig, PipelineError, RequestPipeline};

use super::{print_cost, print_report};

#[derive(Args)]
pub struct GenerateArgs {
    /// The infrastructure request, in plain English
    request: String,

    /// Session identifier for multi-turn conversations
    #[arg(short, long)]
    session: Option<String>,

    /// Target format (terraform, kubernetes, ansible, docker)
    #[arg(short, long)]
    format: Option<String>,

    /// Target cloud provider (aws, azure, gcp)
    #[arg(short, long)]
    provider: Option<String>,

    /// Directory to write passing artifacts into
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// Append audit events to this JSONL file
    #[arg(long)]
    audit_log: Option<PathBuf>,

    /// Pipeline configuration file (YAML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Emit the full outcome as JSON instead of text
    #[arg(long)]
    json: bool,
}

pub async fn execute(args: GenerateArgs) -> Result<()> {
    // Explicit flags are folded into the request text, where the
    // classifier already gives explicit mentions priority.
    let mut request = args.request.clone();
    if let Some(flag) = &args.format {
        let format = IacFormat::parse(flag)
            .ok_or_else(|| PipelineError::UnsupportedFormat(flag.clone()))?;
        request.push_str(&format!(" using {format}"));
    }
    if let Some(flag) = &args.provider {
        let provider = CloudProvider::parse(flag)
            .ok_or_else(|| anyhow::anyhow!("unsupported provider option: {flag}"))?;
        request.push_str(&format!(" on {provider}"));
    }

    let config = match &args.config {
        Some(path) => PipelineConfig::from_file(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => PipelineConfig::default(),
    };

    let mut pipeline = RequestPipeline::new(config);
    if let Some(dir) = &args.out {
        pipeline = pipeline.with_recorder(Arc::new(FsRecorder::new(dir)));
    }
    if let Some(path) = &args.audit_log {
        let log = FileAuditLog::new(path)
            .with_context(|| format!("failed to open audit log at {}", path.display()))?;
        pipeline = pipeline.with_audit(Arc::new(log));
    }

    info!("Processing request");
    let outcome = pipeline
        .process(&request, args.session.as_deref())
        .await
        .context("request processing failed")?;

    if args.json {
        let json = serde_json::json!({
            "resolved": outcome.resolved,
            "artifact": outcome.artifact,
            "report": outcome.report,
            "cost": outcome.cost,
            "stored_path": outcome.stored_path,
            "repair_iterations": outcome.repair_iterations,
        });
        println!("{}", serde_json::to_string_pretty(&json)?);
    } else {
        println!(
            "Resolved: {} {} artifact (confidence {:.2})",
            outcome.resolved.action, outcome.resolved.format, outcome.resolved.confidence
        );
        println!();
        println!("{}", outcome.artifact.content);

        print_report(&outcome.report);
        print_cost(&outcome.cost);

        if outcome.repair_iterations > 0 {
            println!();
            println!("Repair iterations: {}", outcome.repair_iterations);
        }
        if let Some(path) = &outcome.stored_path {
            println!();
            println!("Artifact written to {}", path.display());
        }
    }

    if outcome.report.passed {
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

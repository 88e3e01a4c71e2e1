//! CLI command definitions.
//!
//! Each subcommand maps to one step of the request pipeline: `classify`
//! inspects what the classifier makes of a request, `generate` runs the
//! full pipeline, and `validate` gates an artifact that already exists.

use clap::{Parser, Subcommand};

use smith_validate::{CostEstimate, ValidationReport};

pub mod classify;
pub mod generate;
pub mod validate;

/// InfraSmith - natural-language infrastructure artifact generation
#[derive(Parser)]
#[command(name = "smith")]
#[command(version, about = "InfraSmith - natural-language infrastructure artifact generation")]
#[command(long_about = r#"
InfraSmith turns plain-English infrastructure requests into Terraform,
Kubernetes, Ansible or Docker artifacts, then gates them through
structural, security and compliance checks before anything is written
to disk.

WORKFLOWS:
  generate   → Process a request end to end and emit a validated artifact
  validate   → Run the validation gate against an existing artifact file
  classify   → Show how a request is classified (debugging aid)

EXIT CODES:
  0 - Success
  1 - General error
  2 - Invalid arguments
  3 - Validation gate failure
"#)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate a validated artifact from a natural-language request
    Generate(generate::GenerateArgs),

    /// Validate an existing artifact file
    Validate(validate::ValidateArgs),

    /// Classify a request without generating anything
    Classify(classify::ClassifyArgs),
}

/// Shared text rendering for a validation report.
pub(crate) fn print_report(report: &ValidationReport) {
    if report.issues.is_empty() {
        println!("No issues found");
    } else {
        println!("Issues:");
        for issue in &report.issues {
            let location = issue
                .location
                .as_deref()
                .map(|l| format!(" ({l})"))
                .unwrap_or_default();
            println!("  [{}] {} - {}{}", issue.severity, issue.source, issue.title, location);
            if let Some(fix) = &issue.remediation {
                println!("      fix: {fix}");
            }
        }
    }

    println!();
    println!("Summary:");
    println!("  Critical: {}", report.summary.critical);
    println!("  High:     {}", report.summary.high);
    println!("  Medium:   {}", report.summary.medium);
    println!("  Low:      {}", report.summary.low);
    println!("  Info:     {}", report.summary.info);
}

/// Shared text rendering for a cost estimate.
pub(crate) fn print_cost(cost: &CostEstimate) {
    if cost.breakdown.is_empty() && cost.warnings.is_empty() {
        return;
    }

    println!();
    println!("Estimated cost ({}):", cost.currency);
    for line in &cost.breakdown {
        println!(
            "  {:<24} {:<20} ${:>10.2}/mo  ({})",
            line.resource_type, line.resource_name, line.monthly_cost, line.details
        );
        if let Some(note) = &line.note {
            println!("      note: {note}");
        }
    }
    println!(
        "  Monthly total: ${:.2}   Yearly total: ${:.2}",
        cost.monthly_total, cost.yearly_total
    );
    for warning in &cost.warnings {
        println!("  ⚠️  {warning}");
    }
}

//! InfraSmith CLI - Main entry point.
//!
//! Exit codes:
//! - 0: Success
//! - 1: General error
//! - 2: Invalid arguments
//! - 3: Validation gate failure

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;

use commands::{Cli, Commands};

/// CI-friendly exit codes
pub struct ExitCodes;

impl ExitCodes {
    pub const SUCCESS: u8 = 0;
    pub const GENERAL_ERROR: u8 = 1;
    pub const INVALID_ARGS: u8 = 2;
    pub const VALIDATION_FAILURE: u8 = 3;
}

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize logging
    let log_result = tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(
            EnvFilter::from_default_env()
                .add_directive("smith=info".parse().unwrap())
                .add_directive("warn".parse().unwrap()),
        )
        .try_init();

    if log_result.is_err() {
        // Logging already initialized, continue
    }

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Generate(args) => commands::generate::execute(args).await,
        Commands::Validate(args) => commands::validate::execute(args).await,
        Commands::Classify(args) => commands::classify::execute(args).await,
    };

    match result {
        Ok(()) => ExitCode::from(ExitCodes::SUCCESS),
        Err(e) => {
            let exit_code = categorize_error(&e);
            eprintln!("❌ Error: {:#}", e);
            ExitCode::from(exit_code)
        }
    }
}

/// Categorize error to determine exit code
fn categorize_error(e: &anyhow::Error) -> u8 {
    let msg = e.to_string().to_lowercase();

    if msg.contains("validation") || msg.contains("gate") {
        ExitCodes::VALIDATION_FAILURE
    } else if msg.contains("argument")
        || msg.contains("option")
        || msg.contains("unsupported")
        || msg.contains("not found")
    {
        ExitCodes::INVALID_ARGS
    } else {
        ExitCodes::GENERAL_ERROR
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categorize_error() {
        let gate = anyhow::anyhow!("validation gate failed");
        assert_eq!(categorize_error(&gate), ExitCodes::VALIDATION_FAILURE);

        let args = anyhow::anyhow!("unsupported format: pulumi");
        assert_eq!(categorize_error(&args), ExitCodes::INVALID_ARGS);

        let format = anyhow::Error::from(smith_pipeline::PipelineError::UnsupportedFormat(
            "pulumi".to_string(),
        ));
        assert_eq!(categorize_error(&format), ExitCodes::INVALID_ARGS);

        let other = anyhow::anyhow!("disk on fire");
        assert_eq!(categorize_error(&other), ExitCodes::GENERAL_ERROR);
    }
}

//! Classify command - Show what the classifier makes of a request.
//!
//! Debugging aid: prints the classified intent, extracted parameters and
//! the extractor's advisory warnings without generating or validating
//! anything.

use anyhow::Result;
use clap::Args;

use smith_intent::{IntentClassifier, ParameterExtractor};

#[derive(Args)]
pub struct ClassifyArgs {
    /// The infrastructure request, in plain English
    request: String,

    /// Confidence threshold to report actionability against
    #[arg(short, long, default_value_t = 0.5)]
    threshold: f64,
}

pub async fn execute(args: ClassifyArgs) -> Result<()> {
    let json = classify_request(&args.request, args.threshold);
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}

fn classify_request(request: &str, threshold: f64) -> serde_json::Value {
    let classifier = IntentClassifier::new();
    let extractor = ParameterExtractor::new();

    let intent = classifier.classify(request);
    let parameters = extractor.extract(request);
    let actionable = classifier.is_actionable(&intent, threshold);
    let warnings = extractor.validate(&parameters);

    serde_json::json!({
        "intent": intent,
        "parameters": parameters,
        "actionable": actionable,
        "warnings": warnings,
    })
}

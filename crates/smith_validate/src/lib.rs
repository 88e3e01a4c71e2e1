//! # smith_validate
//!
//! Validation gates for generated infrastructure artifacts.
//!
//! Four independent concerns look at the same immutable artifact text:
//! structural well-formedness, security scanning, policy compliance and
//! cost estimation. The first three implement [`ArtifactChecker`] and run
//! as a concurrent fan-out; cost estimation is informational and never
//! gates. A [`ValidationReport`] passes exactly when it contains zero
//! critical and zero high issues.
//!
//! ## Example
//!
//! ```no_run
//! use smith_gen::Artifact;
//! use smith_intent::IacFormat;
//! use smith_validate::{default_checkers, run_checkers};
//!
//! # async fn demo() {
//! let artifact = Artifact {
//!     format: IacFormat::Terraform,
//!     provider: None,
//!     content: "provider \"aws\" {}\n".to_string(),
//! };
//! let report = run_checkers(&default_checkers(), &artifact).await;
//! if !report.passed {
//!     for issue in &report.issues {
//!         eprintln!("[{}] {}", issue.severity, issue.title);
//!     }
//! }
//! # }
//! ```

pub mod checker;
pub mod compliance;
pub mod cost;
pub mod report;
pub mod security;
pub mod structural;

pub use checker::{default_checkers, run_checkers, ArtifactChecker};
pub use compliance::{ComplianceChecker, PolicyRule};
pub use cost::{CostEstimate, CostEstimator, CostLine, HOURS_PER_MONTH};
pub use report::{Issue, Severity, SeverityCounts, ValidationReport};
pub use security::SecurityChecker;
pub use structural::StructuralChecker;

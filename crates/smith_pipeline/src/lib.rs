//! # smith_pipeline
//!
//! Request orchestration: one `process` call turns raw text into a
//! validated infrastructure artifact.
//!
//! ## Features
//!
//! - Session-aware context reconciliation with per-session locking
//! - Templated generation with an optional external text generator and
//!   a bounded repair loop for failing artifacts
//! - Concurrent validation fan-out and a critical/high pass gate
//! - Audit records for every generation, validation and repair attempt
//!
//! ## Example
//!
//! ```no_run
//! use smith_pipeline::{PipelineConfig, RequestPipeline};
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let pipeline = RequestPipeline::new(PipelineConfig::default());
//! let outcome = pipeline
//!     .process("Create an EC2 instance with t3.micro on AWS", Some("chat-1"))
//!     .await?;
//! println!("{}", outcome.artifact.content);
//! # Ok(())
//! # }
//! ```

pub mod collaborators;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod session;

pub use collaborators::{SnippetRetriever, TextGenerator};
pub use config::PipelineConfig;
pub use error::{PipelineError, PipelineResult};
pub use pipeline::{PipelineOutcome, RequestPipeline};
pub use session::SessionStore;

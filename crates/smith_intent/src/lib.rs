//! # smith_intent
//!
//! Natural-language understanding for InfraSmith: turns a free-text
//! infrastructure request into a classified [`Intent`] and a typed
//! [`ParameterSet`], and reconciles both against the accumulated
//! [`SessionContext`] of a multi-turn conversation.
//!
//! The classifier is a deliberately deterministic, explainable rule engine:
//! keyword tables scored by a single generic scorer, plus resource regexes.
//! There is no statistical model and no I/O anywhere in this crate.
//!
//! ## Example
//!
//! ```rust
//! use smith_intent::{IntentClassifier, ParameterExtractor, SessionContext};
//!
//! let classifier = IntentClassifier::new();
//! let extractor = ParameterExtractor::new();
//! let mut session = SessionContext::new(10);
//!
//! let text = "Deploy a web app with 3 replicas on Kubernetes";
//! let intent = classifier.classify(text);
//! let params = extractor.extract(text);
//! let resolved = session.reconcile(text, intent, params);
//!
//! assert_eq!(resolved.format, smith_intent::IacFormat::Kubernetes);
//! ```

pub mod classifier;
pub mod context;
pub mod extractor;
pub mod types;

pub use classifier::IntentClassifier;
pub use context::{detect_follow_up, SessionContext, TurnRecord};
pub use extractor::ParameterExtractor;
pub use types::{
    Action, CloudProvider, IacFormat, Intent, ParamGroup, ParamGroupKind, ParamValue,
    ParameterSet, ResolvedRequest,
};

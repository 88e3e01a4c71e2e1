//! # smith_gen
//!
//! Format-specific artifact generation for InfraSmith. One generator per
//! supported description format, all behind the [`ArtifactGenerator`] trait.
//!
//! Generation is template composition, not free-text synthesis: each variant
//! selects among a small number of structural templates based on which
//! resource tags and parameter groups are present on the resolved request,
//! and fills named slots from it. Missing optional parameters are defaulted
//! per slot; generation never fails because of them. Output is byte-for-byte
//! deterministic for the same resolved request.

pub mod ansible;
pub mod docker;
pub mod error;
pub mod generator;
pub mod kubernetes;
pub mod terraform;

pub use ansible::AnsibleGenerator;
pub use docker::DockerGenerator;
pub use error::{GenError, GenResult};
pub use generator::{generator_for, Artifact, ArtifactGenerator};
pub use kubernetes::KubernetesGenerator;
pub use terraform::TerraformGenerator;

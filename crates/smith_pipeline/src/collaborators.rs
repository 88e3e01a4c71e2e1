//! External collaborator contracts.
//!
//! Both collaborators are optional. The templated generation path never
//! depends on them; a configured [`TextGenerator`] is preferred when
//! present, and its output goes through exactly the same validation as
//! templated output.

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

use smith_intent::ResolvedRequest;
use smith_validate::Issue;

use crate::error::PipelineResult;

/// A free-form text generator (typically an LLM) that can produce and
/// repair artifact text. The pipeline assumes neither determinism nor
/// idempotence of its output.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Produce artifact text for the resolved request, optionally seeded
    /// with reference snippets.
    async fn generate_artifact(
        &self,
        request: &ResolvedRequest,
        snippets: &[String],
    ) -> PipelineResult<String>;

    /// Rewrite failing artifact text given the issues that failed it.
    async fn repair(&self, text: &str, issues: &[Issue]) -> PipelineResult<String>;
}

/// Retrieves reference snippets semantically close to a request.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait SnippetRetriever: Send + Sync {
    async fn retrieve(&self, query: &str, limit: usize) -> PipelineResult<Vec<String>>;
}

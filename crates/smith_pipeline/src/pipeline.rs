//! End-to-end request processing.
//!
//! One `process` call takes raw text through classification, context
//! reconciliation, generation, validation and audit. Generated text from a
//! configured external generator goes through exactly the same validation
//! as templated output, including the bounded repair loop.

use std::path::PathBuf;
use std::sync::Arc;

use serde_json::json;
use tracing::{debug, info, warn};

use smith_audit::{ArtifactMetadata, ArtifactRecorder, AuditLog, EventKind};
use smith_gen::{generator_for, Artifact};
use smith_intent::{IntentClassifier, ParameterExtractor, ResolvedRequest, SessionContext};
use smith_validate::{
    default_checkers, run_checkers, ArtifactChecker, CostEstimate, CostEstimator, Severity,
    ValidationReport,
};

use crate::collaborators::{SnippetRetriever, TextGenerator};
use crate::config::PipelineConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::session::SessionStore;

/// Everything one request produced.
#[derive(Debug)]
pub struct PipelineOutcome {
    pub resolved: ResolvedRequest,
    pub artifact: Artifact,
    pub report: ValidationReport,
    pub cost: CostEstimate,
    /// Where the artifact was persisted, when the gate passed and a
    /// recorder is configured.
    pub stored_path: Option<PathBuf>,
    /// Repair round-trips actually taken.
    pub repair_iterations: usize,
}

/// The orchestrator. Collaborators and sinks are optional; the templated
/// generation path works with none of them configured.
pub struct RequestPipeline {
    config: PipelineConfig,
    classifier: IntentClassifier,
    extractor: ParameterExtractor,
    sessions: SessionStore,
    checkers: Vec<Box<dyn ArtifactChecker>>,
    cost: CostEstimator,
    audit: Option<Arc<dyn AuditLog>>,
    recorder: Option<Arc<dyn ArtifactRecorder>>,
    text_generator: Option<Arc<dyn TextGenerator>>,
    retriever: Option<Arc<dyn SnippetRetriever>>,
}

impl RequestPipeline {
    pub fn new(config: PipelineConfig) -> Self {
        let cost = CostEstimator::new(config.hours_per_month);
        let sessions = SessionStore::new(config.history_capacity);
        Self {
            config,
            classifier: IntentClassifier::new(),
            extractor: ParameterExtractor::new(),
            sessions,
            checkers: default_checkers(),
            cost,
            audit: None,
            recorder: None,
            text_generator: None,
            retriever: None,
        }
    }

    pub fn with_audit(mut self, audit: Arc<dyn AuditLog>) -> Self {
        self.audit = Some(audit);
        self
    }

    pub fn with_recorder(mut self, recorder: Arc<dyn ArtifactRecorder>) -> Self {
        self.recorder = Some(recorder);
        self
    }

    pub fn with_text_generator(mut self, text_generator: Arc<dyn TextGenerator>) -> Self {
        self.text_generator = Some(text_generator);
        self
    }

    pub fn with_retriever(mut self, retriever: Arc<dyn SnippetRetriever>) -> Self {
        self.retriever = Some(retriever);
        self
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Process one request. With a session id, the session's accumulated
    /// context back-fills what the text leaves out.
    pub async fn process(
        &self,
        text: &str,
        session_id: Option<&str>,
    ) -> PipelineResult<PipelineOutcome> {
        let intent = self.classifier.classify(text);
        let parameters = self.extractor.extract(text);
        debug!(confidence = intent.confidence, "request classified");

        if !self.classifier.is_actionable(&intent, self.config.confidence_threshold) {
            if self.config.fail_below_threshold {
                return Err(PipelineError::UnresolvableIntent {
                    confidence: intent.confidence,
                    threshold: self.config.confidence_threshold,
                });
            }
            warn!(
                confidence = intent.confidence,
                threshold = self.config.confidence_threshold,
                "proceeding with low-confidence intent"
            );
        }

        let resolved = match session_id {
            Some(id) => {
                let session = self.sessions.get_or_create(id);
                let mut session = session.lock().await;
                session.reconcile(text, intent, parameters)
            }
            None => SessionContext::new(1).reconcile(text, intent, parameters),
        };
        info!(
            action = %resolved.action,
            format = %resolved.format,
            confidence = resolved.confidence,
            "request resolved"
        );

        let mut artifact = self.generate(text, &resolved).await?;
        self.record_event(
            EventKind::Generation,
            json!({
                "format": resolved.format,
                "provider": resolved.provider,
                "action": resolved.action.to_string(),
                "confidence": resolved.confidence,
            }),
            true,
        )?;

        let mut report = run_checkers(&self.checkers, &artifact).await;
        self.record_event(
            EventKind::Validation,
            json!({
                "format": resolved.format,
                "issues": report.summary,
            }),
            report.passed,
        )?;

        let repair_iterations = self.repair(&mut artifact, &mut report).await?;

        let cost = self.cost.estimate(&artifact);

        let stored_path = match (&self.recorder, report.passed) {
            (Some(recorder), true) => {
                let metadata = ArtifactMetadata::new(
                    text,
                    resolved.format,
                    resolved.provider,
                    resolved.action,
                );
                Some(recorder.save(&artifact, &metadata)?)
            }
            _ => None,
        };

        Ok(PipelineOutcome {
            resolved,
            artifact,
            report,
            cost,
            stored_path,
            repair_iterations,
        })
    }

    /// LLM path when a text generator is configured, templated path as
    /// the fallback either way.
    async fn generate(&self, text: &str, resolved: &ResolvedRequest) -> PipelineResult<Artifact> {
        if let Some(text_generator) = &self.text_generator {
            let snippets = self.retrieve_snippets(text).await;
            match text_generator.generate_artifact(resolved, &snippets).await {
                Ok(content) => {
                    return Ok(Artifact {
                        format: resolved.format,
                        provider: resolved.provider,
                        content,
                    })
                }
                Err(e) => {
                    warn!(error = %e, "text generator failed, using templated path");
                }
            }
        }
        Ok(generator_for(resolved.format).generate(resolved)?)
    }

    async fn retrieve_snippets(&self, text: &str) -> Vec<String> {
        match &self.retriever {
            Some(retriever) => match retriever.retrieve(text, self.config.snippet_limit).await {
                Ok(snippets) => snippets,
                Err(e) => {
                    warn!(error = %e, "snippet retrieval failed");
                    Vec::new()
                }
            },
            None => Vec::new(),
        }
    }

    /// Bounded repair loop. Returns how many round-trips were taken; the
    /// last report stands as the final result either way.
    async fn repair(
        &self,
        artifact: &mut Artifact,
        report: &mut ValidationReport,
    ) -> PipelineResult<usize> {
        let text_generator = match &self.text_generator {
            Some(tg) if !report.passed => tg,
            _ => return Ok(0),
        };

        let mut iterations = 0;
        while !report.passed && iterations < self.config.max_repair_iterations {
            let failing: Vec<_> = report.at_least(Severity::High).cloned().collect();
            let repaired = match text_generator.repair(&artifact.content, &failing).await {
                Ok(text) => text,
                Err(e) => {
                    warn!(error = %e, "repair failed, keeping last report");
                    break;
                }
            };
            iterations += 1;
            artifact.content = repaired;
            *report = run_checkers(&self.checkers, artifact).await;
            self.record_event(
                EventKind::Repair,
                json!({"iteration": iterations, "issues": report.summary}),
                report.passed,
            )?;
        }
        Ok(iterations)
    }

    fn record_event(
        &self,
        kind: EventKind,
        details: serde_json::Value,
        success: bool,
    ) -> PipelineResult<()> {
        if let Some(audit) = &self.audit {
            audit.record(kind, details, success)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::MockTextGenerator;
    use smith_audit::{FileAuditLog, FsRecorder};
    use smith_intent::ParamGroupKind;

    fn pipeline() -> RequestPipeline {
        RequestPipeline::new(PipelineConfig::default())
    }

    #[tokio::test]
    async fn test_kubernetes_request_end_to_end() {
        let outcome = pipeline()
            .process("Deploy a web app with 3 replicas on Kubernetes", None)
            .await
            .unwrap();

        assert_eq!(outcome.resolved.format, smith_intent::IacFormat::Kubernetes);
        assert_eq!(
            outcome.resolved.parameters.get_int(ParamGroupKind::Scaling, "count"),
            Some(3)
        );
        assert!(outcome.artifact.content.contains("replicas: 3"));
        assert_eq!(outcome.repair_iterations, 0);
    }

    #[tokio::test]
    async fn test_passing_artifact_is_recorded_and_audited() {
        let dir = tempfile::tempdir().unwrap();
        let audit = Arc::new(FileAuditLog::new(dir.path().join("audit.jsonl")).unwrap());
        let recorder = Arc::new(FsRecorder::new(dir.path().join("out")));

        let pipeline = pipeline()
            .with_audit(audit.clone())
            .with_recorder(recorder);
        let outcome = pipeline
            .process("Create an S3 bucket on AWS", Some("s1"))
            .await
            .unwrap();

        assert!(outcome.report.passed);
        let stored = outcome.stored_path.expect("passing artifact is persisted");
        assert!(stored.exists());
        assert!(stored.with_extension("tf.meta.json").exists() || dir
            .path()
            .join("out")
            .join("main.tf.meta.json")
            .exists());

        let events = audit.recent(10).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].kind, EventKind::Generation);
        assert_eq!(events[1].kind, EventKind::Validation);
        assert!(events[1].success);
    }

    #[tokio::test]
    async fn test_failing_artifact_is_not_recorded() {
        let dir = tempfile::tempdir().unwrap();
        let recorder = Arc::new(FsRecorder::new(dir.path().join("out")));
        let pipeline = pipeline().with_recorder(recorder);

        // The templated instance opens public ingress, which the security
        // gate rejects.
        let outcome = pipeline
            .process("Create an EC2 instance with t3.micro on AWS", None)
            .await
            .unwrap();

        assert!(!outcome.report.passed);
        assert!(outcome.stored_path.is_none());
        assert!(!dir.path().join("out").join("main.tf").exists());
    }

    #[tokio::test]
    async fn test_low_confidence_fails_when_opted_in() {
        let config = PipelineConfig {
            confidence_threshold: 0.9,
            fail_below_threshold: true,
            ..PipelineConfig::default()
        };
        let err = RequestPipeline::new(config)
            .process("hello there", None)
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::UnresolvableIntent { .. }));
    }

    #[tokio::test]
    async fn test_low_confidence_proceeds_by_default() {
        let outcome = pipeline().process("hello there", None).await.unwrap();
        // Terraform default, provider scaffolding only.
        assert_eq!(outcome.resolved.format, smith_intent::IacFormat::Terraform);
    }

    #[tokio::test]
    async fn test_session_backfills_following_turns() {
        let pipeline = pipeline();
        pipeline
            .process("Create an EC2 instance with t3.micro on AWS", Some("s1"))
            .await
            .unwrap();
        let outcome = pipeline
            .process("Also add an S3 bucket", Some("s1"))
            .await
            .unwrap();

        assert_eq!(
            outcome.resolved.provider,
            Some(smith_intent::CloudProvider::Aws)
        );
        assert!(outcome.resolved.resources.contains("storage"));
        assert!(outcome.resolved.resources.contains("instance"));
    }

    #[tokio::test]
    async fn test_repair_loop_fixes_failing_artifact() {
        let mut generator = MockTextGenerator::new();
        generator.expect_generate_artifact().returning(|_, _| {
            Ok("provider \"aws\" {\n  password = \"hunter2\"\n}\n".to_string())
        });
        generator
            .expect_repair()
            .times(1)
            .returning(|_, issues| {
                assert!(issues
                    .iter()
                    .any(|i| i.title == "Hardcoded password"));
                Ok("provider \"aws\" {\n  region = \"us-east-1\"\n}\n".to_string())
            });

        let pipeline = pipeline().with_text_generator(Arc::new(generator));
        let outcome = pipeline.process("Create infrastructure on AWS", None).await.unwrap();

        assert!(outcome.report.passed);
        assert_eq!(outcome.repair_iterations, 1);
        assert!(!outcome.artifact.content.contains("hunter2"));
    }

    #[tokio::test]
    async fn test_repair_loop_is_bounded() {
        let mut generator = MockTextGenerator::new();
        generator.expect_generate_artifact().returning(|_, _| {
            Ok("provider \"aws\" {\n  password = \"hunter2\"\n}\n".to_string())
        });
        generator
            .expect_repair()
            .times(2)
            .returning(|text, _| Ok(text.to_string()));

        let config = PipelineConfig {
            max_repair_iterations: 2,
            ..PipelineConfig::default()
        };
        let pipeline = RequestPipeline::new(config).with_text_generator(Arc::new(generator));
        let outcome = pipeline.process("Create infrastructure on AWS", None).await.unwrap();

        assert!(!outcome.report.passed);
        assert_eq!(outcome.repair_iterations, 2);
    }

    #[tokio::test]
    async fn test_generator_failure_falls_back_to_templates() {
        let mut generator = MockTextGenerator::new();
        generator
            .expect_generate_artifact()
            .returning(|_, _| Err(PipelineError::Collaborator("model unreachable".into())));

        let pipeline = pipeline().with_text_generator(Arc::new(generator));
        let outcome = pipeline
            .process("Create an S3 bucket on AWS", None)
            .await
            .unwrap();

        assert!(outcome.artifact.content.contains("aws_s3_bucket"));
        assert!(outcome.report.passed);
    }
}

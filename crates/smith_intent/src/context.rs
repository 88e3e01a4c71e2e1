//! Cross-turn session context and back-fill reconciliation.
//!
//! A [`SessionContext`] accumulates what a conversation has established so
//! far: last-known provider and format, the union of resources ever
//! mentioned, and a group-wise merged [`ParameterSet`]. Each turn is
//! reconciled against it: missing fields on the current intent are filled
//! from the session, then the turn is folded back into the session state.

use std::collections::{BTreeSet, VecDeque};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::types::{CloudProvider, IacFormat, Intent, ParameterSet, ResolvedRequest};

/// One recorded conversation turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnRecord {
    pub text: String,
    pub intent: Intent,
    pub parameters: ParameterSet,
    pub at: DateTime<Utc>,
}

/// Accumulated state for one conversation. Never shared between sessions;
/// concurrent access for the same session is the caller's responsibility
/// (see the pipeline's session store).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<CloudProvider>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<IacFormat>,
    pub resources: BTreeSet<String>,
    pub parameters: ParameterSet,
    history: VecDeque<TurnRecord>,
    capacity: usize,
}

impl SessionContext {
    /// Create an empty session with a fixed turn-history capacity.
    pub fn new(capacity: usize) -> Self {
        Self {
            provider: None,
            format: None,
            resources: BTreeSet::new(),
            parameters: ParameterSet::new(),
            history: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    /// Back-fill the current turn from session state, then fold the turn in.
    ///
    /// Back-fill policy:
    /// - provider/format: session value used only when absent on the intent;
    /// - resources: union, never a replacement;
    /// - parameters: session groups absent on the current turn are copied in
    ///   wholesale; groups present on both keep the current turn's values
    ///   (group-level, not per-attribute).
    ///
    /// The format default (Terraform) is applied last, so a session-known
    /// format always wins over the default.
    pub fn reconcile(
        &mut self,
        text: &str,
        intent: Intent,
        parameters: ParameterSet,
    ) -> ResolvedRequest {
        let provider = intent.provider.or(self.provider);
        let format = intent.format.or(self.format);

        let mut resources = self.resources.clone();
        resources.extend(intent.resources.iter().cloned());

        let mut merged = self.parameters.clone();
        merged.merge_groups_from(&parameters);

        if intent.provider.is_none() && provider.is_some() {
            debug!(provider = ?provider, "back-filled provider from session");
        }
        if intent.format.is_none() && format.is_some() {
            debug!(format = ?format, "back-filled format from session");
        }

        let resolved = ResolvedRequest {
            action: intent.action,
            format: format.unwrap_or_default(),
            provider,
            resources: resources.clone(),
            parameters: merged.clone(),
            confidence: intent.confidence,
        };

        self.record_turn(text, intent, parameters);
        // Session state mirrors the resolved view so replay is associative.
        self.provider = provider;
        self.format = format;
        self.resources = resources;
        self.parameters = merged;

        resolved
    }

    fn record_turn(&mut self, text: &str, intent: Intent, parameters: ParameterSet) {
        if self.history.len() >= self.capacity {
            self.history.pop_front();
        }
        self.history.push_back(TurnRecord {
            text: text.to_string(),
            intent,
            parameters,
            at: Utc::now(),
        });
    }

    /// Recorded turns, oldest first.
    pub fn history(&self) -> impl Iterator<Item = &TurnRecord> {
        self.history.iter()
    }

    pub fn turn_count(&self) -> usize {
        self.history.len()
    }

    /// Reset history and merged state, used when a session restarts.
    pub fn clear(&mut self) {
        self.provider = None;
        self.format = None;
        self.resources.clear();
        self.parameters = ParameterSet::new();
        self.history.clear();
    }

    /// One-line summary of what the session knows.
    pub fn summary(&self) -> String {
        let mut parts = Vec::new();
        if let Some(p) = self.provider {
            parts.push(format!("provider: {p}"));
        }
        if let Some(f) = self.format {
            parts.push(format!("format: {f}"));
        }
        if !self.resources.is_empty() {
            let listed: Vec<&str> = self.resources.iter().take(5).map(String::as_str).collect();
            parts.push(format!("resources: {}", listed.join(", ")));
        }
        if parts.is_empty() {
            "no context".to_string()
        } else {
            parts.join(" | ")
        }
    }
}

/// Keyword heuristic for "this turn continues the previous one".
///
/// Informational only: [`SessionContext::reconcile`] always back-fills
/// regardless of this hint; callers may use it to decide whether to start a
/// fresh session instead.
pub fn detect_follow_up(text: &str) -> bool {
    const INDICATORS: &[&str] = &[
        "also", "additionally", "and ", "plus", "furthermore", "modify", "change", "update",
        "add ", "remove", " it", "that", "this", "them", "those",
    ];
    let lower = text.to_lowercase();
    INDICATORS.iter().any(|i| lower.contains(i))
}

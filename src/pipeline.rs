//! # Risk Decision Pipeline
//! Ties the components together for one request:
//! score (engine) → explain → rank importances → append to session history.
//!
//! Scoring is split from committing so a caller can bound the blocking part
//! with a deadline and only touch the session once a [`ScoreBundle`] exists.
//! A failed or abandoned assessment never reaches the history.

use std::sync::Arc;
use std::time::Instant;

use metrics::{counter, histogram};
use serde::Serialize;
use tracing::{info, warn};

use crate::case::{random_case, round_to, Case};
use crate::decision::{ScoreBundle, Verdict};
use crate::engine;
use crate::error::{PipelineError, Result};
use crate::explain::explain;
use crate::history::HistoryEntry;
use crate::importance::{rank_importances, FeatureWeight};
use crate::registry::ModelRegistry;
use crate::session::{HistorySnapshot, SessionStore};

/// Identity of one evaluation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequestMeta {
    pub request_id: String,
    pub timestamp: String,
}

impl RequestMeta {
    pub fn new() -> Self {
        let mut request_id = uuid::Uuid::new_v4().simple().to_string();
        request_id.truncate(8);
        Self {
            request_id,
            timestamp: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}

impl Default for RequestMeta {
    fn default() -> Self {
        Self::new()
    }
}

/// Everything derived from the models for one case, before any session write.
#[derive(Debug, Clone, PartialEq)]
pub struct Assessment {
    pub scores: ScoreBundle,
    pub explanation: String,
    pub feature_importance: Vec<FeatureWeight>,
}

/// Result bundle handed to the presentation layer. Scores are display-rounded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationOutcome {
    pub request_id: String,
    pub timestamp: String,
    pub behavior_score: f64,
    pub text_score: f64,
    pub final_score: f64,
    pub decision: Verdict,
    pub threshold: f64,
    pub explanation: String,
    pub feature_importance: Vec<FeatureWeight>,
    pub case_history: Vec<HistoryEntry>,
    pub approval_rate: f64,
    /// Fresh demo case for the next round-trip.
    pub case_data: Case,
}

pub struct RiskPipeline {
    registry: Arc<ModelRegistry>,
    sessions: Arc<SessionStore>,
}

impl RiskPipeline {
    pub fn new(registry: Arc<ModelRegistry>, sessions: Arc<SessionStore>) -> Self {
        Self { registry, sessions }
    }

    pub fn registry(&self) -> &Arc<ModelRegistry> {
        &self.registry
    }

    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.sessions
    }

    /// Blocking part: model loads (first call only) and inference.
    pub fn assess(&self, meta: &RequestMeta, case: &Case, threshold: f64) -> Result<Assessment> {
        let started = Instant::now();
        let out = self.assess_inner(case, threshold);
        histogram!("fraud_evaluation_duration_ms").record(started.elapsed().as_secs_f64() * 1_000.0);
        if let Err(e) = &out {
            record_failure(&meta.request_id, e);
        }
        out
    }

    fn assess_inner(&self, case: &Case, threshold: f64) -> Result<Assessment> {
        let scores = engine::evaluate(&self.registry, case, threshold)?;
        let explanation = explain(
            scores.behavior_score,
            scores.text_score,
            scores.final_score,
            threshold,
        );
        let behavior = self.registry.behavior_classifier()?;
        let feature_importance = rank_importances(behavior.as_ref())?;
        Ok(Assessment {
            scores,
            explanation,
            feature_importance,
        })
    }

    /// Append the decision to the session and build the result bundle.
    pub fn commit(&self, session_id: &str, meta: RequestMeta, assessment: Assessment) -> EvaluationOutcome {
        let s = assessment.scores;
        let entry = HistoryEntry {
            id: meta.request_id.clone(),
            score: round_to(s.final_score, 3),
            decision: s.decision,
            timestamp: meta.timestamp.clone(),
        };
        let HistorySnapshot {
            case_history,
            approval_rate,
        } = self.sessions.record_and_summarize(session_id, entry);

        counter!("fraud_evaluations_total", "decision" => s.decision.as_str()).increment(1);
        info!(
            request_id = %meta.request_id,
            session = %anon_hash(session_id),
            final_score = s.final_score,
            threshold = s.threshold,
            decision = %s.decision,
            approval_rate,
            "case evaluated"
        );

        EvaluationOutcome {
            request_id: meta.request_id,
            timestamp: meta.timestamp,
            behavior_score: round_to(s.behavior_score, 3),
            text_score: round_to(s.text_score, 3),
            final_score: round_to(s.final_score, 3),
            decision: s.decision,
            threshold: s.threshold,
            explanation: assessment.explanation,
            feature_importance: assessment.feature_importance,
            case_history,
            approval_rate,
            case_data: random_case(),
        }
    }

    /// Synchronous assess + commit.
    pub fn evaluate(&self, session_id: &str, case: &Case, threshold: f64) -> Result<EvaluationOutcome> {
        let meta = RequestMeta::new();
        let assessment = self.assess(&meta, case, threshold)?;
        Ok(self.commit(session_id, meta, assessment))
    }

    pub fn history(&self, session_id: &str) -> HistorySnapshot {
        self.sessions.snapshot(session_id)
    }
}

/// Count and log a failed evaluation. Raw case text is never logged.
pub fn record_failure(request_id: &str, err: &PipelineError) {
    counter!("fraud_evaluation_failures_total", "kind" => err.kind()).increment(1);
    warn!(request_id, kind = err.kind(), error = %err, "evaluation failed");
}

/// Short, non-reversible identifier for log lines.
pub(crate) fn anon_hash(text: &str) -> String {
    use sha2::{Digest, Sha256};
    let digest = Sha256::digest(text.as_bytes());
    format!("{:x}", digest)[..12].to_string()
}

//! # Pipeline errors
//! One error type for every failure the decision pipeline can surface.
//!
//! Nothing here is retried automatically. `ResourceUnavailable` leaves the
//! registry untouched so the next call attempts the load again; every other
//! kind is fatal to the current evaluation only.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// A model or the embedding encoder could not be constructed.
    #[error("resource unavailable: {resource} ({reason})")]
    ResourceUnavailable {
        resource: &'static str,
        reason: String,
    },

    /// A model file exists but could not be read or parsed.
    #[error("failed to load {resource} from {path}: {source}")]
    ResourceLoad {
        resource: &'static str,
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A classifier or encoder call failed while scoring a case.
    #[error("inference failed in {stage}: {reason}")]
    InferenceFailure { stage: &'static str, reason: String },

    /// Input outside the accepted shape (wrong feature count, out-of-range field).
    #[error("invalid case field `{field}`: {reason}")]
    InvalidCaseField { field: &'static str, reason: String },

    /// A loaded model does not honor its contract (e.g. importance vector length).
    #[error("model contract violated by {resource}: {reason}")]
    ModelContract {
        resource: &'static str,
        reason: String,
    },

    /// The caller-level deadline elapsed before scoring finished.
    #[error("evaluation timed out after {millis} ms")]
    Timeout { millis: u64 },
}

impl PipelineError {
    /// Stable snake_case label used in metrics and API error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::ResourceUnavailable { .. } | PipelineError::ResourceLoad { .. } => {
                "resource_unavailable"
            }
            PipelineError::InferenceFailure { .. } => "inference_failure",
            PipelineError::InvalidCaseField { .. } => "invalid_case_field",
            PipelineError::ModelContract { .. } => "model_contract",
            PipelineError::Timeout { .. } => "timeout",
        }
    }

    pub(crate) fn inference(stage: &'static str, reason: impl Into<String>) -> Self {
        PipelineError::InferenceFailure {
            stage,
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        PipelineError::InvalidCaseField {
            field,
            reason: reason.into(),
        }
    }
}

pub type Result<T, E = PipelineError> = std::result::Result<T, E>;

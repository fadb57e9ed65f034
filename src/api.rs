use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};

use crate::case::{random_case, Case};
use crate::config::AppConfig;
use crate::error::PipelineError;
use crate::metrics::Metrics;
use crate::models::{FileModelLoader, ModelLoader};
use crate::pipeline::{record_failure, EvaluationOutcome, RequestMeta, RiskPipeline};
use crate::registry::ModelRegistry;
use crate::session::{HistorySnapshot, SessionStore};

pub const SESSION_HEADER: &str = "x-session-id";
const MAX_SESSION_ID_LEN: usize = 64;

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<RiskPipeline>,
    pub config: Arc<AppConfig>,
    pub metrics: Option<Metrics>,
}

impl AppState {
    /// Wire registry + session store from config. Models load lazily unless
    /// the caller runs [`ModelRegistry::warm_up`].
    pub fn from_config(config: AppConfig) -> anyhow::Result<Self> {
        let loader = Arc::new(FileModelLoader::new(config.models.clone()));
        Self::with_loader(config, loader)
    }

    /// Same wiring with a caller-supplied model source.
    pub fn with_loader(config: AppConfig, loader: Arc<dyn ModelLoader>) -> anyhow::Result<Self> {
        let registry = Arc::new(ModelRegistry::new(loader));
        let sessions = Arc::new(SessionStore::new(
            Duration::from_secs(config.session_ttl_secs),
            config.max_history_per_session,
        ));
        let metrics = if config.metrics_enabled {
            Some(Metrics::init()?)
        } else {
            None
        };
        Ok(Self {
            pipeline: Arc::new(RiskPipeline::new(registry, sessions)),
            config: Arc::new(config),
            metrics,
        })
    }
}

pub fn create_router(state: AppState) -> Router {
    let mut router = Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/ready", get(ready))
        .route("/", get(home))
        .route("/evaluate", post(evaluate))
        .route("/session/history", get(session_history));

    if let Some(m) = &state.metrics {
        router = router.merge(m.router());
    }

    router
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

// Fields arrive exactly as the demo form posts them.
#[derive(Debug, Deserialize)]
pub struct EvaluateForm {
    order_velocity: f64,
    device_changes: u32,
    ip_changes: u32,
    unpaid_ratio: f64,
    risky_flag: u8,
    threshold: f64,
    annotation: String,
}

impl EvaluateForm {
    fn into_parts(self) -> (Case, f64) {
        (
            Case {
                order_velocity: self.order_velocity,
                device_changes: self.device_changes,
                ip_changes: self.ip_changes,
                unpaid_ratio: self.unpaid_ratio,
                risky_flag: self.risky_flag,
                annotation: self.annotation,
            },
            self.threshold,
        )
    }
}

#[derive(Serialize)]
struct HomeResp {
    threshold: f64,
    case_data: Case,
}

async fn home(State(state): State<AppState>) -> Json<HomeResp> {
    Json(HomeResp {
        threshold: state.config.default_threshold,
        case_data: random_case(),
    })
}

async fn ready(State(state): State<AppState>) -> (StatusCode, &'static str) {
    if state.pipeline.registry().is_ready() {
        (StatusCode::OK, "ready")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "loading")
    }
}

#[derive(Serialize)]
struct EvaluateResp {
    session_id: String,
    #[serde(flatten)]
    outcome: EvaluationOutcome,
}

async fn evaluate(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<EvaluateForm>,
) -> Result<impl IntoResponse, ApiError> {
    let session_id = session_id_from(&headers);
    let (case, threshold) = form.into_parts();
    let meta = RequestMeta::new();
    let budget = state.config.evaluation_timeout_ms;

    let pipeline = state.pipeline.clone();
    let task_meta = meta.clone();
    let scoring = tokio::task::spawn_blocking(move || pipeline.assess(&task_meta, &case, threshold));

    let assessment = match tokio::time::timeout(Duration::from_millis(budget), scoring).await {
        Ok(Ok(res)) => res?,
        Ok(Err(join_err)) => {
            let err = PipelineError::inference("scoring_task", join_err.to_string());
            record_failure(&meta.request_id, &err);
            return Err(err.into());
        }
        Err(_) => {
            let err = PipelineError::Timeout { millis: budget };
            record_failure(&meta.request_id, &err);
            return Err(err.into());
        }
    };

    let outcome = state.pipeline.commit(&session_id, meta, assessment);
    Ok((
        [(SESSION_HEADER, session_id.clone())],
        Json(EvaluateResp {
            session_id,
            outcome,
        }),
    ))
}

#[derive(Serialize)]
struct HistoryResp {
    session_id: String,
    #[serde(flatten)]
    history: HistorySnapshot,
}

async fn session_history(State(state): State<AppState>, headers: HeaderMap) -> Json<HistoryResp> {
    let session_id = session_id_from(&headers);
    let history = state.pipeline.history(&session_id);
    Json(HistoryResp {
        session_id,
        history,
    })
}

/// Caller's session id, or a fresh one when the header is missing or unusable.
fn session_id_from(headers: &HeaderMap) -> String {
    let supplied = headers
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|s| {
            !s.is_empty()
                && s.len() <= MAX_SESSION_ID_LEN
                && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        });
    match supplied {
        Some(s) => s.to_string(),
        None => {
            let id = uuid::Uuid::new_v4().simple().to_string();
            info!("new session minted");
            id
        }
    }
}

/// Generic failure body; details stay in the logs.
#[derive(Debug)]
pub struct ApiError(PipelineError);

impl From<PipelineError> for ApiError {
    fn from(e: PipelineError) -> Self {
        Self(e)
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    kind: &'static str,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            PipelineError::ResourceUnavailable { .. }
            | PipelineError::ResourceLoad { .. }
            | PipelineError::Timeout { .. } => {
                (StatusCode::SERVICE_UNAVAILABLE, "scoring is temporarily unavailable")
            }
            PipelineError::InvalidCaseField { .. } => {
                (StatusCode::UNPROCESSABLE_ENTITY, "case fields are out of range")
            }
            PipelineError::InferenceFailure { .. } | PipelineError::ModelContract { .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, "evaluation failed")
            }
        };
        warn!(status = status.as_u16(), kind = self.0.kind(), "request failed");
        (
            status,
            Json(ErrorBody {
                error: message,
                kind: self.0.kind(),
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn keeps_well_formed_session_ids() {
        let mut h = HeaderMap::new();
        h.insert(SESSION_HEADER, HeaderValue::from_static("abc-123_x"));
        assert_eq!(session_id_from(&h), "abc-123_x");
    }

    #[test]
    fn mints_when_missing_or_odd() {
        let fresh = session_id_from(&HeaderMap::new());
        assert_eq!(fresh.len(), 32);

        let mut h = HeaderMap::new();
        h.insert(SESSION_HEADER, HeaderValue::from_static("../../etc"));
        assert_ne!(session_id_from(&h), "../../etc");
    }

    #[test]
    fn error_statuses() {
        let r = ApiError(PipelineError::Timeout { millis: 1 }).into_response();
        assert_eq!(r.status(), StatusCode::SERVICE_UNAVAILABLE);
        let r = ApiError(PipelineError::invalid("risky_flag", "2")).into_response();
        assert_eq!(r.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let r = ApiError(PipelineError::inference("x", "y")).into_response();
        assert_eq!(r.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}

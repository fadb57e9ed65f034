// src/lib.rs
// Public library surface for the binary and the integration tests.

pub mod api;
pub mod case;
pub mod config;
pub mod decision;
pub mod engine;
pub mod error;
pub mod explain;
pub mod history;
pub mod importance;
pub mod metrics;
pub mod models;
pub mod normalize;
pub mod pipeline;
pub mod registry;
pub mod session;

// ---- Re-exports for stable public API ----
pub use crate::api::{create_router, AppState};
pub use crate::case::{random_case, Case};
pub use crate::config::AppConfig;
pub use crate::decision::{ScoreBundle, Verdict};
pub use crate::error::PipelineError;
pub use crate::pipeline::{EvaluationOutcome, RiskPipeline};

use std::time::Duration;

use axum::Router;
use tokio::runtime::RuntimeFlavor;
use tracing::{info, warn};

/// Build the full application router from `config`, warming the model
/// registry first when configured to. A failed warm-up is logged, not fatal:
/// the registry retries on the first request and `/ready` reports 503 until then.
pub fn app(config: AppConfig) -> anyhow::Result<Router> {
    let state = AppState::from_config(config)?;

    if state.config.warm_up_on_start {
        let registry = state.pipeline.registry().clone();
        let warmed = match tokio::runtime::Handle::try_current() {
            Ok(h) if h.runtime_flavor() == RuntimeFlavor::MultiThread => {
                tokio::task::block_in_place(|| registry.warm_up())
            }
            _ => registry.warm_up(),
        };
        match warmed {
            Ok(()) => info!("models ready"),
            Err(e) => warn!(error = %e, "model warm-up failed; will retry lazily"),
        }
    }

    if tokio::runtime::Handle::try_current().is_ok() {
        let sweep = Duration::from_secs((state.config.session_ttl_secs / 4).max(30));
        session::spawn_session_janitor(state.pipeline.sessions().clone(), sweep);
    }

    Ok(create_router(state))
}

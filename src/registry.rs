//! # Model Resource Registry
//! Lazily builds and caches the behavior classifier, text classifier and
//! embedding encoder for the lifetime of the process.
//!
//! Each slot is a blocking init-once cell: concurrent first callers wait on
//! the one running construction and all observe the same `Arc`. A failed
//! construction leaves the slot empty, so the next call tries again.

use std::sync::Arc;

use metrics::counter;
use once_cell::sync::OnceCell;
use tracing::{info, warn};

use crate::error::Result;
use crate::models::loader::{BEHAVIOR_RESOURCE, ENCODER_RESOURCE, TEXT_RESOURCE};
use crate::models::{ModelLoader, SharedClassifier, SharedEncoder};

pub struct ModelRegistry {
    loader: Arc<dyn ModelLoader>,
    behavior: OnceCell<SharedClassifier>,
    text: OnceCell<SharedClassifier>,
    encoder: OnceCell<SharedEncoder>,
}

impl ModelRegistry {
    pub fn new(loader: Arc<dyn ModelLoader>) -> Self {
        Self {
            loader,
            behavior: OnceCell::new(),
            text: OnceCell::new(),
            encoder: OnceCell::new(),
        }
    }

    pub fn behavior_classifier(&self) -> Result<SharedClassifier> {
        get_or_load(&self.behavior, BEHAVIOR_RESOURCE, || {
            self.loader.load_behavior()
        })
    }

    pub fn text_classifier(&self) -> Result<SharedClassifier> {
        get_or_load(&self.text, TEXT_RESOURCE, || self.loader.load_text())
    }

    pub fn embedding_encoder(&self) -> Result<SharedEncoder> {
        get_or_load(&self.encoder, ENCODER_RESOURCE, || {
            self.loader.load_encoder()
        })
    }

    /// Eagerly bind all three resources (startup readiness gate).
    pub fn warm_up(&self) -> Result<()> {
        self.behavior_classifier()?;
        self.text_classifier()?;
        self.embedding_encoder()?;
        info!("model registry warmed up");
        Ok(())
    }

    /// True once every resource has been bound.
    pub fn is_ready(&self) -> bool {
        self.behavior.get().is_some() && self.text.get().is_some() && self.encoder.get().is_some()
    }
}

fn get_or_load<T: Clone>(
    cell: &OnceCell<T>,
    resource: &'static str,
    load: impl FnOnce() -> Result<T>,
) -> Result<T> {
    cell.get_or_try_init(|| {
        let out = load();
        match &out {
            Ok(_) => {
                counter!("fraud_model_loads_total", "resource" => resource, "outcome" => "ok")
                    .increment(1);
            }
            Err(e) => {
                counter!("fraud_model_loads_total", "resource" => resource, "outcome" => "error")
                    .increment(1);
                warn!(resource, error = %e, "resource construction failed; will retry on next access");
            }
        }
        out
    })
    .cloned()
}

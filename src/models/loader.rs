//! Model construction. The registry calls a [`ModelLoader`] at most once per
//! resource; the file loader below reads the JSON descriptors in `models/`.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::de::DeserializeOwned;
use tracing::info;

use super::embedding::{HashingEncoder, HashingSpec};
use super::linear::{LogisticClassifier, LogisticSpec};
use super::{Classifier, EmbeddingEncoder, SharedClassifier, SharedEncoder};
use crate::case::FEATURE_NAMES;
use crate::config::ModelPaths;
use crate::error::{PipelineError, Result};

pub const BEHAVIOR_RESOURCE: &str = "behavior_classifier";
pub const TEXT_RESOURCE: &str = "text_classifier";
pub const ENCODER_RESOURCE: &str = "embedding_encoder";

/// Expensive, fallible construction of the three scoring resources.
pub trait ModelLoader: Send + Sync {
    fn load_behavior(&self) -> Result<SharedClassifier>;
    fn load_text(&self) -> Result<SharedClassifier>;
    fn load_encoder(&self) -> Result<SharedEncoder>;
}

#[derive(Debug, Clone)]
pub struct FileModelLoader {
    paths: ModelPaths,
}

impl FileModelLoader {
    pub fn new(paths: ModelPaths) -> Self {
        Self { paths }
    }
}

impl ModelLoader for FileModelLoader {
    fn load_behavior(&self) -> Result<SharedClassifier> {
        let spec: LogisticSpec = read_json(BEHAVIOR_RESOURCE, &self.paths.behavior)?;
        let model = LogisticClassifier::from_spec(spec).map_err(|reason| {
            PipelineError::ResourceUnavailable {
                resource: BEHAVIOR_RESOURCE,
                reason,
            }
        })?;
        if model.n_features() != FEATURE_NAMES.len() {
            return Err(PipelineError::ResourceUnavailable {
                resource: BEHAVIOR_RESOURCE,
                reason: format!(
                    "model fit on {} features, case has {}",
                    model.n_features(),
                    FEATURE_NAMES.len()
                ),
            });
        }
        info!(
            resource = BEHAVIOR_RESOURCE,
            model = model.name(),
            path = %self.paths.behavior.display(),
            features = model.n_features(),
            "model loaded"
        );
        Ok(Arc::new(model))
    }

    fn load_text(&self) -> Result<SharedClassifier> {
        let spec: LogisticSpec = read_json(TEXT_RESOURCE, &self.paths.text)?;
        let model = LogisticClassifier::from_spec(spec).map_err(|reason| {
            PipelineError::ResourceUnavailable {
                resource: TEXT_RESOURCE,
                reason,
            }
        })?;
        info!(
            resource = TEXT_RESOURCE,
            model = model.name(),
            path = %self.paths.text.display(),
            features = model.n_features(),
            "model loaded"
        );
        Ok(Arc::new(model))
    }

    fn load_encoder(&self) -> Result<SharedEncoder> {
        let spec: HashingSpec = read_json(ENCODER_RESOURCE, &self.paths.encoder)?;
        let enc = HashingEncoder::from_spec(spec).map_err(|reason| {
            PipelineError::ResourceUnavailable {
                resource: ENCODER_RESOURCE,
                reason,
            }
        })?;
        info!(
            resource = ENCODER_RESOURCE,
            path = %self.paths.encoder.display(),
            dimension = enc.dimension(),
            "encoder loaded"
        );
        Ok(Arc::new(enc))
    }
}

fn read_json<T: DeserializeOwned>(resource: &'static str, path: &Path) -> Result<T> {
    let raw = fs::read_to_string(path).map_err(|e| PipelineError::ResourceLoad {
        resource,
        path: PathBuf::from(path),
        source: Box::new(e),
    })?;
    serde_json::from_str(&raw).map_err(|e| PipelineError::ResourceLoad {
        resource,
        path: PathBuf::from(path),
        source: Box::new(e),
    })
}

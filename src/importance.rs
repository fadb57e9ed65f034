//! Feature importance ranking for the behavior model.

use serde::{Deserialize, Serialize};

use crate::case::{round_to, FEATURE_NAMES};
use crate::error::{PipelineError, Result};
use crate::models::loader::BEHAVIOR_RESOURCE;
use crate::models::Classifier;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureWeight {
    pub name: String,
    pub weight: f64,
}

/// Rank the classifier's static importances against [`FEATURE_NAMES`].
pub fn rank_importances(classifier: &dyn Classifier) -> Result<Vec<FeatureWeight>> {
    let weights = classifier
        .feature_importances()
        .ok_or_else(|| PipelineError::ModelContract {
            resource: BEHAVIOR_RESOURCE,
            reason: "model exposes no feature importances".into(),
        })?;
    rank_weights(&FEATURE_NAMES, weights)
}

/// Pair names with weights, sort descending (stable on ties), round to 3 decimals.
pub fn rank_weights(names: &[&str], weights: &[f64]) -> Result<Vec<FeatureWeight>> {
    if names.len() != weights.len() {
        return Err(PipelineError::ModelContract {
            resource: BEHAVIOR_RESOURCE,
            reason: format!(
                "{} importances for {} declared features",
                weights.len(),
                names.len()
            ),
        });
    }
    let mut pairs: Vec<(&str, f64)> = names.iter().copied().zip(weights.iter().copied()).collect();
    pairs.sort_by(|a, b| b.1.total_cmp(&a.1));
    Ok(pairs
        .into_iter()
        .map(|(name, w)| FeatureWeight {
            name: name.to_string(),
            weight: round_to(w, 3),
        })
        .collect())
}

//! Logistic-regression classifier described by a JSON file.
//!
//! ```json
//! { "kind": "logistic", "intercept": -0.2, "weights": [..],
//!   "mean": [..], "scale": [..], "feature_importances": [..] }
//! ```
//! `mean`/`scale` are optional standardization vectors; when present the
//! input is transformed as `(x - mean) / scale` before the dot product.

use serde::Deserialize;

use super::Classifier;
use crate::error::{PipelineError, Result};

#[derive(Debug, Clone, Deserialize)]
pub struct LogisticSpec {
    pub kind: String,
    #[serde(default)]
    pub name: Option<String>,
    pub intercept: f64,
    pub weights: Vec<f64>,
    #[serde(default)]
    pub mean: Option<Vec<f64>>,
    #[serde(default)]
    pub scale: Option<Vec<f64>>,
    #[serde(default)]
    pub feature_importances: Option<Vec<f64>>,
}

#[derive(Debug, Clone)]
pub struct LogisticClassifier {
    name: String,
    intercept: f64,
    weights: Vec<f64>,
    mean: Option<Vec<f64>>,
    scale: Option<Vec<f64>>,
    importances: Option<Vec<f64>>,
}

impl LogisticClassifier {
    pub fn from_spec(spec: LogisticSpec) -> std::result::Result<Self, String> {
        if spec.kind != "logistic" {
            return Err(format!("unsupported model kind '{}'", spec.kind));
        }
        let n = spec.weights.len();
        if n == 0 {
            return Err("weights must not be empty".into());
        }
        if !spec.intercept.is_finite() || spec.weights.iter().any(|w| !w.is_finite()) {
            return Err("intercept and weights must be finite".into());
        }
        for (label, v) in [("mean", &spec.mean), ("scale", &spec.scale)] {
            if let Some(v) = v {
                if v.len() != n {
                    return Err(format!("{label} has {} entries, weights has {n}", v.len()));
                }
            }
        }
        if let Some(scale) = &spec.scale {
            if scale.iter().any(|s| *s == 0.0 || !s.is_finite()) {
                return Err("scale entries must be finite and non-zero".into());
            }
        }
        Ok(Self {
            name: spec.name.unwrap_or_else(|| "logistic".to_string()),
            intercept: spec.intercept,
            weights: spec.weights,
            mean: spec.mean,
            scale: spec.scale,
            importances: spec.feature_importances,
        })
    }

    /// Plain model without standardization, handy for stubs and tests.
    pub fn new(intercept: f64, weights: Vec<f64>) -> Self {
        Self {
            name: "logistic".to_string(),
            intercept,
            weights,
            mean: None,
            scale: None,
            importances: None,
        }
    }

    pub fn with_importances(mut self, importances: Vec<f64>) -> Self {
        self.importances = Some(importances);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn logit(&self, x: &[f64]) -> f64 {
        let mut z = self.intercept;
        for (i, (w, xi)) in self.weights.iter().zip(x).enumerate() {
            let m = self.mean.as_ref().map_or(0.0, |m| m[i]);
            let s = self.scale.as_ref().map_or(1.0, |s| s[i]);
            z += w * (xi - m) / s;
        }
        z
    }
}

impl Classifier for LogisticClassifier {
    fn predict_proba(&self, features: &[f64]) -> Result<[f64; 2]> {
        if features.len() != self.weights.len() {
            return Err(PipelineError::invalid(
                "features",
                format!(
                    "{} expects {} features, got {}",
                    self.name,
                    self.weights.len(),
                    features.len()
                ),
            ));
        }
        if features.iter().any(|x| !x.is_finite()) {
            return Err(PipelineError::invalid("features", "non-finite feature value"));
        }
        let p = sigmoid(self.logit(features));
        Ok([1.0 - p, p])
    }

    fn n_features(&self) -> usize {
        self.weights.len()
    }

    fn feature_importances(&self) -> Option<&[f64]> {
        self.importances.as_deref()
    }
}

fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

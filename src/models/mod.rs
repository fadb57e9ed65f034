//! Scoring collaborators: the two binary classifiers and the text encoder.
//!
//! The pipeline only talks to these traits. Concrete implementations shipped
//! here are small JSON-described models good enough for the demo service;
//! anything that honors `predict_proba` / `encode` can be plugged in through
//! a [`ModelLoader`].

use std::sync::Arc;

use crate::error::Result;

pub mod embedding;
pub mod linear;
pub mod loader;

pub use embedding::HashingEncoder;
pub use linear::LogisticClassifier;
pub use loader::{FileModelLoader, ModelLoader};

/// Pretrained binary classifier.
pub trait Classifier: Send + Sync {
    /// `[p_negative, p_positive]` for one feature vector.
    fn predict_proba(&self, features: &[f64]) -> Result<[f64; 2]>;

    /// Number of input features the model was fit on.
    fn n_features(&self) -> usize;

    /// Static per-feature importances, if the model carries them.
    fn feature_importances(&self) -> Option<&[f64]> {
        None
    }
}

/// Deterministic text → fixed-length vector transform.
pub trait EmbeddingEncoder: Send + Sync {
    /// Batch encode. Callers in this crate always pass a batch of one.
    fn encode(&self, texts: &[&str]) -> Result<Vec<Vec<f64>>>;

    fn dimension(&self) -> usize;
}

pub type SharedClassifier = Arc<dyn Classifier>;
pub type SharedEncoder = Arc<dyn EmbeddingEncoder>;

//! # Score Fusion Engine
//! Maps `(case, threshold)` → [`ScoreBundle`] using the registry's models.
//!
//! Behavior model sees `[order_velocity, device_changes, ip_changes,
//! unpaid_ratio, risky_flag]`; the text model sees the encoder's vector for
//! the normalized annotation. No retries: any collaborator failure ends the
//! evaluation.

use tracing::debug;

use crate::case::Case;
use crate::decision::ScoreBundle;
use crate::error::{PipelineError, Result};
use crate::models::{Classifier, EmbeddingEncoder};
use crate::normalize::normalize;
use crate::registry::ModelRegistry;

/// Score a case with the registry's (lazily loaded) models.
pub fn evaluate(registry: &ModelRegistry, case: &Case, threshold: f64) -> Result<ScoreBundle> {
    let behavior = registry.behavior_classifier()?;
    let text = registry.text_classifier()?;
    let encoder = registry.embedding_encoder()?;
    evaluate_with(behavior.as_ref(), text.as_ref(), encoder.as_ref(), case, threshold)
}

/// Same as [`evaluate`] against explicit collaborators.
pub fn evaluate_with(
    behavior: &dyn Classifier,
    text: &dyn Classifier,
    encoder: &dyn EmbeddingEncoder,
    case: &Case,
    threshold: f64,
) -> Result<ScoreBundle> {
    if !threshold.is_finite() {
        return Err(PipelineError::invalid("threshold", "must be a finite number"));
    }
    case.validate()?;

    let behavior_score = behavior_score(behavior, case)?;
    let text_score = text_score(text, encoder, &case.annotation)?;
    let bundle = ScoreBundle::new(behavior_score, text_score, threshold);

    debug!(
        behavior_score,
        text_score,
        final_score = bundle.final_score,
        threshold,
        decision = %bundle.decision,
        "case scored"
    );
    Ok(bundle)
}

pub fn behavior_score(behavior: &dyn Classifier, case: &Case) -> Result<f64> {
    let proba = behavior.predict_proba(&case.feature_vector())?;
    positive_class("behavior_classifier", proba)
}

pub fn text_score(text: &dyn Classifier, encoder: &dyn EmbeddingEncoder, annotation: &str) -> Result<f64> {
    let clean = normalize(annotation);
    let embedding = encoder
        .encode(&[clean.as_str()])?
        .into_iter()
        .next()
        .ok_or_else(|| PipelineError::inference("embedding_encoder", "encoder returned an empty batch"))?;
    if embedding.len() != text.n_features() {
        return Err(PipelineError::inference(
            "embedding_encoder",
            format!(
                "embedding has {} dimensions, text model expects {}",
                embedding.len(),
                text.n_features()
            ),
        ));
    }
    let proba = text.predict_proba(&embedding)?;
    positive_class("text_classifier", proba)
}

/// `p_positive`, refusing anything that is not a probability.
fn positive_class(stage: &'static str, proba: [f64; 2]) -> Result<f64> {
    let p = proba[1];
    if !p.is_finite() || !(0.0..=1.0).contains(&p) {
        return Err(PipelineError::inference(
            stage,
            format!("positive-class probability out of range: {p}"),
        ));
    }
    Ok(p)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decision::Verdict;
    use crate::models::HashingEncoder;
    use std::sync::Mutex;

    /// Returns a fixed probability and remembers what it was fed.
    struct Fixed {
        p: f64,
        n: usize,
        seen: Mutex<Vec<Vec<f64>>>,
    }

    impl Fixed {
        fn new(p: f64, n: usize) -> Self {
            Self {
                p,
                n,
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    impl Classifier for Fixed {
        fn predict_proba(&self, features: &[f64]) -> Result<[f64; 2]> {
            self.seen.lock().unwrap().push(features.to_vec());
            Ok([1.0 - self.p, self.p])
        }
        fn n_features(&self) -> usize {
            self.n
        }
    }

    struct Broken;
    impl Classifier for Broken {
        fn predict_proba(&self, _: &[f64]) -> Result<[f64; 2]> {
            Err(PipelineError::inference("text_classifier", "boom"))
        }
        fn n_features(&self) -> usize {
            16
        }
    }

    fn scenario() -> Case {
        Case {
            order_velocity: 9.0,
            device_changes: 3,
            ip_changes: 2,
            unpaid_ratio: 0.6,
            risky_flag: 1,
            annotation: "order vel; dev chg".into(),
        }
    }

    #[test]
    fn end_to_end_with_stub_models() {
        let behavior = Fixed::new(0.8, 5);
        let text = Fixed::new(0.7, 16);
        let enc = HashingEncoder::new(16);

        let s = evaluate_with(&behavior, &text, &enc, &scenario(), 0.5).unwrap();
        assert!((s.final_score - 0.73).abs() < 1e-9);
        assert_eq!(s.decision, Verdict::Approve);
        assert_eq!(behavior.seen.lock().unwrap()[0], vec![9.0, 3.0, 2.0, 0.6, 1.0]);
    }

    #[test]
    fn text_model_sees_the_normalized_annotation() {
        let text = Fixed::new(0.2, 16);
        let enc = HashingEncoder::new(16);
        text_score(&text, &enc, "ORDER VEL; dev chg").unwrap();
        let expected = enc.embed_one("high order velocity observed.  multiple device changes detected");
        assert_eq!(text.seen.lock().unwrap()[0], expected);
    }

    #[test]
    fn classifier_error_propagates() {
        let behavior = Fixed::new(0.8, 5);
        let enc = HashingEncoder::new(16);
        let err = evaluate_with(&behavior, &Broken, &enc, &scenario(), 0.5).unwrap_err();
        assert_eq!(err.kind(), "inference_failure");
    }

    #[test]
    fn out_of_range_probability_is_an_inference_failure() {
        let behavior = Fixed::new(1.2, 5);
        let text = Fixed::new(0.5, 16);
        let enc = HashingEncoder::new(16);
        let err = evaluate_with(&behavior, &text, &enc, &scenario(), 0.5).unwrap_err();
        assert!(matches!(err, PipelineError::InferenceFailure { .. }));
    }

    #[test]
    fn encoder_and_text_model_must_agree_on_dimension() {
        let text = Fixed::new(0.5, 32);
        let enc = HashingEncoder::new(16);
        assert!(text_score(&text, &enc, "ip chg").is_err());
    }

    #[test]
    fn non_finite_threshold_is_rejected() {
        let behavior = Fixed::new(0.5, 5);
        let text = Fixed::new(0.5, 16);
        let enc = HashingEncoder::new(16);
        let err = evaluate_with(&behavior, &text, &enc, &scenario(), f64::NAN).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidCaseField { field: "threshold", .. }));
    }
}

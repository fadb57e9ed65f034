//! # Case
//! The unit of evaluation plus the synthetic demo-case generator that feeds
//! the UI's "try another case" round-trip.

use rand::seq::IndexedRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};

/// Behavioral feature names, aligned index-for-index with
/// [`Case::feature_vector`] and the behavior model's importance vector.
pub const FEATURE_NAMES: [&str; 5] = [
    "order_velocity",
    "device_changes_7d",
    "ip_changes_7d",
    "unpaid_ratio",
    "risky_category_flag",
];

/// Demo annotations. Each one is valid input to the normalizer.
pub const ANNOTATION_TEMPLATES: [&str; 6] = [
    "order vel; card vel; multiple device changes observed.",
    "ip chg detected with elevated order velocity.",
    "high unpaid ratio with risky category purchases.",
    "order vel spike; dev chg; possible coordinated misuse.",
    "moderate activity increase but no strong cluster linkage.",
    "card vel; ip chg; prior suspicious activity noted.",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Case {
    pub order_velocity: f64,
    pub device_changes: u32,
    pub ip_changes: u32,
    /// Share of unpaid orders in `[0, 1]`.
    pub unpaid_ratio: f64,
    /// 0 or 1.
    pub risky_flag: u8,
    pub annotation: String,
}

impl Case {
    /// Reject shapes the behavior model was never fit on.
    pub fn validate(&self) -> Result<()> {
        if !self.order_velocity.is_finite() || self.order_velocity < 0.0 {
            return Err(PipelineError::invalid(
                "order_velocity",
                format!("expected a finite non-negative number, got {}", self.order_velocity),
            ));
        }
        if !(0.0..=1.0).contains(&self.unpaid_ratio) {
            return Err(PipelineError::invalid(
                "unpaid_ratio",
                format!("expected a value in [0, 1], got {}", self.unpaid_ratio),
            ));
        }
        if self.risky_flag > 1 {
            return Err(PipelineError::invalid(
                "risky_flag",
                format!("expected 0 or 1, got {}", self.risky_flag),
            ));
        }
        Ok(())
    }

    /// Feature vector in the order the behavior model was fit against.
    pub fn feature_vector(&self) -> [f64; 5] {
        [
            self.order_velocity,
            f64::from(self.device_changes),
            f64::from(self.ip_changes),
            self.unpaid_ratio,
            f64::from(self.risky_flag),
        ]
    }
}

/// Random demo case drawn from the thread-local RNG.
pub fn random_case() -> Case {
    random_case_with(&mut rand::rng())
}

/// Random demo case from a caller-supplied RNG (seed it for reproducible tests).
pub fn random_case_with<R: Rng + ?Sized>(rng: &mut R) -> Case {
    let annotation = ANNOTATION_TEMPLATES
        .choose(rng)
        .copied()
        .unwrap_or(ANNOTATION_TEMPLATES[0]);

    Case {
        order_velocity: round_to(rng.random_range(2.0..=12.0), 2),
        device_changes: rng.random_range(0..=4),
        ip_changes: rng.random_range(0..=3),
        unpaid_ratio: round_to(rng.random_range(0.0..=0.8), 2),
        risky_flag: rng.random_range(0..=1),
        annotation: annotation.to_string(),
    }
}

/// Round half away from zero to `places` decimals (display only).
pub fn round_to(x: f64, places: i32) -> f64 {
    let f = 10f64.powi(places);
    (x * f).round() / f
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn sample() -> Case {
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
    fn feature_vector_keeps_declared_order() {
        assert_eq!(sample().feature_vector(), [9.0, 3.0, 2.0, 0.6, 1.0]);
    }

    #[test]
    fn validate_rejects_out_of_contract_fields() {
        let mut c = sample();
        c.unpaid_ratio = 1.5;
        assert!(matches!(
            c.validate(),
            Err(PipelineError::InvalidCaseField { field: "unpaid_ratio", .. })
        ));

        let mut c = sample();
        c.risky_flag = 2;
        assert!(matches!(
            c.validate(),
            Err(PipelineError::InvalidCaseField { field: "risky_flag", .. })
        ));

        let mut c = sample();
        c.order_velocity = f64::NAN;
        assert!(c.validate().is_err());

        assert!(sample().validate().is_ok());
    }

    #[test]
    fn random_cases_stay_in_range() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..500 {
            let c = random_case_with(&mut rng);
            assert!((2.0..=12.0).contains(&c.order_velocity));
            assert!(c.device_changes <= 4);
            assert!(c.ip_changes <= 3);
            assert!((0.0..=0.8).contains(&c.unpaid_ratio));
            assert!(c.risky_flag <= 1);
            assert!(ANNOTATION_TEMPLATES.contains(&c.annotation.as_str()));
            assert!(c.validate().is_ok());
        }
    }

    #[test]
    fn seeded_generator_is_reproducible() {
        let a = random_case_with(&mut StdRng::seed_from_u64(42));
        let b = random_case_with(&mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);
    }

    #[test]
    fn rounding_for_display() {
        assert_eq!(round_to(0.72999, 3), 0.73);
        assert_eq!(round_to(66.6666, 2), 66.67);
    }
}

//! decision.rs — verdict and score bundle shapes returned by the fusion engine.

use serde::{Deserialize, Serialize};

/// Weight of the behavioral score in the fused score.
pub const BEHAVIOR_WEIGHT: f64 = 0.3;
/// Weight of the annotation score in the fused score.
pub const TEXT_WEIGHT: f64 = 0.7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verdict {
    Approve,
    Reject,
}

impl Verdict {
    pub fn as_str(self) -> &'static str {
        match self {
            Verdict::Approve => "APPROVE",
            Verdict::Reject => "REJECT",
        }
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scores for one evaluation. Built once by the engine, never mutated.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreBundle {
    pub behavior_score: f64,
    pub text_score: f64,
    pub final_score: f64,
    pub threshold: f64,
    pub decision: Verdict,
}

impl ScoreBundle {
    pub fn new(behavior_score: f64, text_score: f64, threshold: f64) -> Self {
        let final_score = fuse(behavior_score, text_score);
        Self {
            behavior_score,
            text_score,
            final_score,
            threshold,
            decision: decide(final_score, threshold),
        }
    }
}

/// `0.3 * behavior + 0.7 * text`.
pub fn fuse(behavior_score: f64, text_score: f64) -> f64 {
    BEHAVIOR_WEIGHT * behavior_score + TEXT_WEIGHT * text_score
}

/// Strictly above the threshold approves; a tie rejects.
pub fn decide(final_score: f64, threshold: f64) -> Verdict {
    if final_score > threshold {
        Verdict::Approve
    } else {
        Verdict::Reject
    }
}

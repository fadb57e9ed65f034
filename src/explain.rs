//! Three-sentence explanation: behavioral, textual, overall.

/// Sub-score cut-point for the behavioral and textual sentences.
pub const SIGNAL_CUT: f64 = 0.6;

pub fn explain(behavior_score: f64, text_score: f64, final_score: f64, threshold: f64) -> String {
    let behavioral = if behavior_score > SIGNAL_CUT {
        "Behavioral metrics indicate elevated risk."
    } else {
        "Behavioral signals appear moderate or low."
    };
    let textual = if text_score > SIGNAL_CUT {
        "Annotation reasoning aligns strongly with fraud indicators."
    } else {
        "Annotation reasoning is limited or lacks strong contextual evidence."
    };
    let overall = if final_score > threshold {
        "Overall confidence exceeds approval threshold."
    } else {
        "Overall confidence does not meet approval threshold."
    };
    [behavioral, textual, overall].join(" ")
}

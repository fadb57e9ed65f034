//! # Annotation Normalizer
//! Rewrites analyst shorthand into canonical phrases before text scoring.
//!
//! Rules are literal substring replacements applied one after another, each
//! over the whole string, in table order. Matches are not word-bounded, so a
//! token can hit inside an unrelated word; the text model was fit on exactly
//! this output, so that is kept as-is.

/// Ordered rewrite table. Order is load-bearing: later rules see the output
/// of earlier ones.
pub const REWRITE_RULES: &[(&str, &str)] = &[
    ("order vel", "high order velocity observed"),
    ("card vel", "elevated card usage velocity"),
    ("ip chg", "frequent ip address changes"),
    ("dev chg", "multiple device changes detected"),
    (";", ". "),
    ("//", " "),
];

/// Lowercase `text` and fold it through [`REWRITE_RULES`].
pub fn normalize(text: &str) -> String {
    REWRITE_RULES
        .iter()
        .fold(text.to_lowercase(), |acc, (pattern, replacement)| {
            if acc.contains(pattern) {
                acc.replace(pattern, replacement)
            } else {
                acc
            }
        })
}

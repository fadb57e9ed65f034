//! history.rs — per-session decision log and the running approval rate.

use serde::{Deserialize, Serialize};

use crate::case::round_to;
use crate::decision::Verdict;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Request id of the evaluation that produced this entry.
    pub id: String,
    pub score: f64,
    pub decision: Verdict,
    pub timestamp: String,
}

/// Append-only, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionHistory {
    entries: Vec<HistoryEntry>,
}

impl SessionHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, entry: HistoryEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn approval_rate(&self) -> f64 {
        approval_rate(&self.entries)
    }

    /// Retention policy hook for the session store: keep the newest `cap`.
    pub(crate) fn retain_newest(&mut self, cap: usize) {
        if self.entries.len() > cap {
            let excess = self.entries.len() - cap;
            self.entries.drain(0..excess);
        }
    }
}

/// `100 * approved / total`, two decimals; 0 for an empty history.
pub fn approval_rate(entries: &[HistoryEntry]) -> f64 {
    if entries.is_empty() {
        return 0.0;
    }
    let approved = entries
        .iter()
        .filter(|e| e.decision == Verdict::Approve)
        .count();
    round_to(100.0 * approved as f64 / entries.len() as f64, 2)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str, d: Verdict) -> HistoryEntry {
        HistoryEntry {
            id: id.into(),
            score: 0.5,
            decision: d,
            timestamp: "2026-01-01 00:00:00".into(),
        }
    }

    #[test]
    fn approval_rate_examples() {
        let mut h = SessionHistory::new();
        assert_eq!(h.approval_rate(), 0.0);
        h.record(entry("a", Verdict::Approve));
        h.record(entry("b", Verdict::Approve));
        h.record(entry("c", Verdict::Reject));
        assert_eq!(h.approval_rate(), 66.67);
    }

    #[test]
    fn record_is_strictly_additive() {
        let mut h = SessionHistory::new();
        h.record(entry("a", Verdict::Reject));
        h.record(entry("b", Verdict::Approve));
        let before = h.clone();

        h.record(entry("c", Verdict::Approve));
        assert_eq!(h.len(), before.len() + 1);
        assert_eq!(&h.entries()[..before.len()], before.entries());
        assert_eq!(h.entries().last().map(|e| e.id.as_str()), Some("c"));
    }

    #[test]
    fn retain_newest_drops_from_the_front() {
        let mut h = SessionHistory::new();
        for id in ["a", "b", "c", "d"] {
            h.record(entry(id, Verdict::Reject));
        }
        h.retain_newest(2);
        let ids: Vec<&str> = h.entries().iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "d"]);
    }
}

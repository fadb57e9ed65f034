//! # Session store
//! In-memory owner of every session's [`SessionHistory`].
//!
//! Append + approval-rate recompute for one session happen under that
//! session's mutex, so concurrent requests on the same session never lose an
//! entry. Sessions idle past the TTL are purged by a background janitor; a
//! purged slot is flagged under its own mutex so a writer still holding it
//! re-resolves instead of appending into a detached slot.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use tracing::{debug, info};

use crate::history::{HistoryEntry, SessionHistory};

/// Read-only view handed back to the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistorySnapshot {
    pub case_history: Vec<HistoryEntry>,
    pub approval_rate: f64,
}

impl HistorySnapshot {
    fn of(history: &SessionHistory) -> Self {
        Self {
            case_history: history.entries().to_vec(),
            approval_rate: history.approval_rate(),
        }
    }
}

#[derive(Debug)]
struct Slot {
    history: SessionHistory,
    last_seen: Instant,
    evicted: bool,
}

#[derive(Debug)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Arc<Mutex<Slot>>>>,
    ttl: Duration,
    /// `None` keeps every entry for the life of the session.
    max_entries: Option<usize>,
}

impl SessionStore {
    pub fn new(ttl: Duration, max_entries: Option<usize>) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            ttl,
            max_entries: max_entries.filter(|n| *n > 0),
        }
    }

    fn slot(&self, session_id: &str) -> Arc<Mutex<Slot>> {
        if let Some(s) = self.sessions.read().get(session_id) {
            return s.clone();
        }
        self.sessions
            .write()
            .entry(session_id.to_string())
            .or_insert_with(|| {
                Arc::new(Mutex::new(Slot {
                    history: SessionHistory::new(),
                    last_seen: Instant::now(),
                    evicted: false,
                }))
            })
            .clone()
    }

    /// Atomic append + recompute for one session.
    pub fn record_and_summarize(&self, session_id: &str, entry: HistoryEntry) -> HistorySnapshot {
        self.record_via(self.slot(session_id), session_id, entry)
    }

    /// Append through an already resolved slot, re-resolving if the janitor
    /// evicted it between lookup and lock.
    fn record_via(
        &self,
        mut slot: Arc<Mutex<Slot>>,
        session_id: &str,
        entry: HistoryEntry,
    ) -> HistorySnapshot {
        loop {
            let mut g = slot.lock();
            if g.evicted {
                drop(g);
                debug!("session slot evicted mid-append; re-resolving");
                slot = self.slot(session_id);
                continue;
            }
            g.history.record(entry);
            if let Some(cap) = self.max_entries {
                g.history.retain_newest(cap);
            }
            g.last_seen = Instant::now();
            let snap = HistorySnapshot::of(&g.history);
            debug!(
                entries = snap.case_history.len(),
                approval_rate = snap.approval_rate,
                "session history updated"
            );
            return snap;
        }
    }

    /// Current history; an unknown session reads as empty.
    pub fn snapshot(&self, session_id: &str) -> HistorySnapshot {
        let slot = self.sessions.read().get(session_id).cloned();
        match slot {
            Some(slot) => {
                let mut g = slot.lock();
                if g.evicted {
                    return HistorySnapshot::of(&SessionHistory::new());
                }
                g.last_seen = Instant::now();
                HistorySnapshot::of(&g.history)
            }
            None => HistorySnapshot::of(&SessionHistory::new()),
        }
    }

    pub fn session_count(&self) -> usize {
        self.sessions.read().len()
    }

    /// Drop sessions idle for longer than the TTL as of `now`. Returns how many went.
    pub fn purge_expired(&self, now: Instant) -> usize {
        let mut map = self.sessions.write();
        let before = map.len();
        map.retain(|_, slot| {
            let mut g = slot.lock();
            let keep = now.saturating_duration_since(g.last_seen) <= self.ttl;
            if !keep {
                g.evicted = true;
            }
            keep
        });
        before - map.len()
    }
}

/// Periodically purge idle sessions. Runs until the runtime shuts down.
pub fn spawn_session_janitor(store: Arc<SessionStore>, every: Duration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut tick = tokio::time::interval(every);
        tick.tick().await;
        loop {
            tick.tick().await;
            let purged = store.purge_expired(Instant::now());
            if purged > 0 {
                info!(purged, remaining = store.session_count(), "expired sessions purged");
            }
        }
    })
}

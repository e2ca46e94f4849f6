//! Pending state of per-section image regeneration
//!
//! A section is "pending" from the moment a regeneration is requested until a
//! fixed timeout elapses. Completion is not tracked here: the pending flag is a
//! bounded-wait cue, and a new image simply shows up when the orchestrator
//! swaps in a new snapshot.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::constants::REGENERATION_TIMEOUT;

#[derive(Debug, Clone)]
pub struct PendingRegenerations {
    timeout: Duration,
    started: HashMap<String, Instant>,
}

impl Default for PendingRegenerations {
    fn default() -> Self {
        Self::new()
    }
}

impl PendingRegenerations {
    pub fn new() -> Self {
        Self::with_timeout(REGENERATION_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout,
            started: HashMap::new(),
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Mark `section_id` pending. Returns false (and changes nothing) when it
    /// is already pending, so a second click does not restart the timer.
    pub fn begin(&mut self, section_id: &str, now: Instant) -> bool {
        if self.is_pending(section_id, now) {
            return false;
        }
        self.started.insert(section_id.to_string(), now);
        true
    }

    /// Drop the pending mark early
    pub fn complete(&mut self, section_id: &str) {
        self.started.remove(section_id);
    }

    pub fn is_pending(&self, section_id: &str, now: Instant) -> bool {
        self.started
            .get(section_id)
            .is_some_and(|started| now.saturating_duration_since(*started) < self.timeout)
    }

    /// Forget every expired entry and return the ids that expired
    pub fn prune(&mut self, now: Instant) -> Vec<String> {
        let timeout = self.timeout;
        let mut expired: Vec<String> = self
            .started
            .iter()
            .filter(|(_, started)| now.saturating_duration_since(**started) >= timeout)
            .map(|(id, _)| id.clone())
            .collect();
        expired.sort();

        for id in &expired {
            self.started.remove(id);
        }
        expired
    }

    pub fn clear(&mut self) {
        self.started.clear();
    }

    pub fn len(&self) -> usize {
        self.started.len()
    }

    pub fn is_empty(&self) -> bool {
        self.started.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_clears_after_timeout() {
        let start = Instant::now();
        let mut pending = PendingRegenerations::new();

        assert!(pending.begin("s1", start));
        assert!(pending.is_pending("s1", start + Duration::from_secs(7)));
        assert!(!pending.is_pending("s1", start + Duration::from_secs(8)));
        assert!(!pending.is_pending("s2", start));
    }

    #[test]
    fn test_begin_does_not_restart_timer() {
        let start = Instant::now();
        let mut pending = PendingRegenerations::with_timeout(Duration::from_secs(2));

        assert!(pending.begin("s1", start));
        assert!(!pending.begin("s1", start + Duration::from_secs(1)));
        assert!(!pending.is_pending("s1", start + Duration::from_secs(2)));

        // Once expired a new request starts a fresh window
        assert!(pending.begin("s1", start + Duration::from_secs(3)));
        assert!(pending.is_pending("s1", start + Duration::from_secs(4)));
    }

    #[test]
    fn test_prune_returns_expired_ids() {
        let start = Instant::now();
        let mut pending = PendingRegenerations::with_timeout(Duration::from_secs(8));
        pending.begin("b", start);
        pending.begin("a", start);
        pending.begin("c", start + Duration::from_secs(5));

        assert_eq!(pending.prune(start + Duration::from_secs(9)), vec!["a", "b"]);
        assert_eq!(pending.len(), 1);
        assert!(pending.prune(start + Duration::from_secs(9)).is_empty());
    }
}

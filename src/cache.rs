// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Anti-abuse memory of recently seen pingback sources.
//!
//! Two capped sets are kept:
//! 1. `attempted`: sources that got far enough to start verification
//! 2. `recorded`: sources whose pingback was accepted
//!
//! A set that reaches capacity is emptied before the next insert, so a
//! source can reappear after a reset. Lookups and inserts take separate
//! locks: two sessions for the same source may both pass the lookup before
//! either inserts. That window is accepted; this is spam suppression, not a
//! uniqueness guarantee.

use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Result of looking a source up in the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Seen {
    /// Never seen (or forgotten after a reset)
    New,
    /// A previous pingback from this source was accepted
    Recorded,
    /// A previous pingback from this source is in flight or failed
    Attempted,
}

/// Set that forgets everything once it fills up.
#[derive(Debug)]
struct CappedSet {
    entries: HashSet<String>,
    capacity: usize,
}

impl CappedSet {
    fn new(capacity: usize) -> Self {
        Self {
            entries: HashSet::new(),
            capacity,
        }
    }

    fn contains(&self, key: &str) -> bool {
        self.entries.contains(key)
    }

    /// Insert `key`, resetting first if full. Returns true when a reset happened.
    fn insert(&mut self, key: &str) -> bool {
        let reset = self.entries.len() >= self.capacity && !self.entries.contains(key);
        if reset {
            self.entries.clear();
        }
        self.entries.insert(key.to_string());
        reset
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Thread-safe anti-abuse cache shared by all sessions of one engine.
#[derive(Clone)]
pub struct AntiAbuseCache {
    attempted: Arc<RwLock<CappedSet>>,
    recorded: Arc<RwLock<CappedSet>>,
}

impl AntiAbuseCache {
    /// Create a cache whose sets each hold at most `capacity` sources.
    pub fn new(capacity: usize) -> Self {
        Self {
            attempted: Arc::new(RwLock::new(CappedSet::new(capacity))),
            recorded: Arc::new(RwLock::new(CappedSet::new(capacity))),
        }
    }

    /// Look a source up. `Recorded` wins over `Attempted`.
    pub async fn check(&self, source: &str) -> Seen {
        if self.recorded.read().await.contains(source) {
            return Seen::Recorded;
        }
        if self.attempted.read().await.contains(source) {
            return Seen::Attempted;
        }
        Seen::New
    }

    /// Remember that a session for `source` passed validation.
    pub async fn mark_attempted(&self, source: &str) {
        if self.attempted.write().await.insert(source) {
            debug!(source = %source, "Attempted set full, reset");
        }
    }

    /// Remember that a pingback from `source` was accepted.
    pub async fn mark_recorded(&self, source: &str) {
        if self.recorded.write().await.insert(source) {
            debug!(source = %source, "Recorded set full, reset");
        }
    }

    /// Number of `(attempted, recorded)` entries.
    pub async fn len(&self) -> (usize, usize) {
        (
            self.attempted.read().await.len(),
            self.recorded.read().await.len(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_recorded_wins_over_attempted() {
        let cache = AntiAbuseCache::new(10);
        let source = "http://a.example/post";

        assert_eq!(cache.check(source).await, Seen::New);
        cache.mark_attempted(source).await;
        assert_eq!(cache.check(source).await, Seen::Attempted);
        cache.mark_recorded(source).await;
        assert_eq!(cache.check(source).await, Seen::Recorded);
    }

    #[tokio::test]
    async fn test_reset_on_overflow() {
        let cache = AntiAbuseCache::new(3);
        for i in 0..3 {
            cache.mark_attempted(&format!("http://s{i}.example/")).await;
        }
        assert_eq!(cache.len().await, (3, 0));
        assert_eq!(cache.check("http://s0.example/").await, Seen::Attempted);

        // Fourth distinct source empties the set first
        cache.mark_attempted("http://s3.example/").await;
        assert_eq!(cache.len().await, (1, 0));
        assert_eq!(cache.check("http://s0.example/").await, Seen::New);
        assert_eq!(cache.check("http://s3.example/").await, Seen::Attempted);
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let cache = AntiAbuseCache::new(10);
        let other = cache.clone();
        cache.mark_recorded("http://a.example/").await;
        assert_eq!(other.check("http://a.example/").await, Seen::Recorded);

        let fresh = AntiAbuseCache::new(10);
        assert_eq!(fresh.check("http://a.example/").await, Seen::New);
    }
}

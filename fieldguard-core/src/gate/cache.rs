// fieldguard-core/src/gate/cache.rs
//! TTL-bounded cache of remote classification results.
//!
//! Time comes from `tokio::time::Instant`, so tests can drive expiry with a
//! paused clock.

use std::collections::{HashMap, VecDeque};

use log::debug;
use tokio::time::{Duration, Instant};

use crate::span::Span;

#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub fingerprint: String,
    pub spans: Vec<Span>,
    pub created_at: Instant,
}

impl CacheEntry {
    fn is_expired(&self, ttl: Duration, now: Instant) -> bool {
        now.duration_since(self.created_at) >= ttl
    }
}

#[derive(Debug)]
pub struct ResultCache {
    ttl: Duration,
    max_entries: usize,
    entries: HashMap<String, CacheEntry>,
    /// Insertion order, oldest first. May hold keys already evicted.
    order: VecDeque<String>,
}

impl ResultCache {
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        Self {
            ttl,
            max_entries: max_entries.max(1),
            entries: HashMap::new(),
            order: VecDeque::new(),
        }
    }

    /// Returns the cached spans for `fingerprint`, evicting the entry if it
    /// has expired.
    pub fn get(&mut self, fingerprint: &str) -> Option<Vec<Span>> {
        let now = Instant::now();
        let expired = self
            .entries
            .get(fingerprint)
            .map(|entry| entry.is_expired(self.ttl, now))?;
        if expired {
            debug!("Cache entry expired on lookup.");
            self.entries.remove(fingerprint);
            return None;
        }
        self.entries.get(fingerprint).map(|entry| entry.spans.clone())
    }

    pub fn insert(&mut self, fingerprint: String, spans: Vec<Span>) {
        if self.entries.contains_key(&fingerprint) {
            self.order.retain(|key| key != &fingerprint);
        }
        while self.entries.len() >= self.max_entries && !self.entries.contains_key(&fingerprint) {
            match self.order.pop_front() {
                Some(oldest) => {
                    self.entries.remove(&oldest);
                }
                None => break,
            }
        }
        self.order.push_back(fingerprint.clone());
        self.entries.insert(
            fingerprint.clone(),
            CacheEntry {
                fingerprint,
                spans,
                created_at: Instant::now(),
            },
        );
    }

    /// Evicts every expired entry and returns how many were removed.
    pub fn sweep(&mut self) -> usize {
        let now = Instant::now();
        let ttl = self.ttl;
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired(ttl, now));
        let entries = &self.entries;
        self.order.retain(|key| entries.contains_key(key));
        let removed = before - self.entries.len();
        if removed > 0 {
            debug!("Cache sweep evicted {} entries.", removed);
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }
}

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;

use crate::models::Quote;

/// A batch answer kept for reuse within the staleness window.
#[derive(Debug, Clone)]
pub struct CachedBatch {
    pub fetched_at: DateTime<Utc>,
    pub quotes: HashMap<String, Quote>,
}

/// Thread-safe read-through cache for quote batches, keyed by request signature.
/// Only successful fetches are stored.
#[derive(Clone)]
pub struct QuoteCache {
    cache: Arc<DashMap<String, CachedBatch>>,
    ttl: Duration,
}

impl QuoteCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            cache: Arc::new(DashMap::new()),
            ttl,
        }
    }

    /// Order-insensitive key for a normalized symbol batch.
    pub fn signature(symbols: &[String]) -> String {
        let mut sorted: Vec<&str> = symbols.iter().map(String::as_str).collect();
        sorted.sort_unstable();
        sorted.join(",")
    }

    /// Cached batch for `signature` if it is still fresh.
    pub fn get(&self, signature: &str) -> Option<HashMap<String, Quote>> {
        self.get_at(signature, Utc::now())
    }

    pub(crate) fn get_at(&self, signature: &str, now: DateTime<Utc>) -> Option<HashMap<String, Quote>> {
        if let Some(entry) = self.cache.get(signature) {
            if now < entry.fetched_at + self.ttl {
                return Some(entry.quotes.clone());
            }
            drop(entry); // Release the read lock
            self.cache.remove(signature);
        }
        None
    }

    pub fn insert(&self, signature: String, quotes: HashMap<String, Quote>) {
        self.insert_at(signature, quotes, Utc::now());
    }

    pub(crate) fn insert_at(&self, signature: String, quotes: HashMap<String, Quote>, fetched_at: DateTime<Utc>) {
        self.cache.insert(signature, CachedBatch { fetched_at, quotes });
    }

    pub fn clear(&self) {
        self.cache.clear();
    }

    /// Drop every stale batch. Returns how many were removed.
    pub fn cleanup_expired(&self) -> usize {
        let now = Utc::now();
        let before = self.cache.len();
        self.cache.retain(|_, batch| now < batch.fetched_at + self.ttl);
        before - self.cache.len()
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}

//! TTL-aware result cache, one instance per provider domain.
//!
//! Expiry is lazy: a stale entry is reported as absent on read but stays in
//! the map until the same fingerprint is written again or the store is
//! cleared.

use crate::model::CanonicalResult;
use crate::query::Fingerprint;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;

/// A stored result. Never edited in place; a refresh replaces the whole
/// entry.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub fingerprint: Fingerprint,
    pub value: Arc<CanonicalResult>,
    pub stored_at: Instant,
    pub ttl: Duration,
}

impl CacheEntry {
    pub fn is_fresh(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.stored_at) <= self.ttl
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Includes stale entries that have not been reclaimed yet.
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
}

#[derive(Debug, Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
}

/// Thread-safe store mapping fingerprints to cached results.
#[derive(Clone, Debug, Default)]
pub struct CacheStore {
    inner: Arc<RwLock<HashMap<Fingerprint, CacheEntry>>>,
    counters: Arc<Counters>,
}

impl CacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached value if present and not older than its TTL.
    pub async fn get_if_fresh(&self, fingerprint: &Fingerprint) -> Option<Arc<CanonicalResult>> {
        let cache = self.inner.read().await;
        let hit = cache
            .get(fingerprint)
            .filter(|entry| entry.is_fresh(Instant::now()))
            .map(|entry| Arc::clone(&entry.value));

        let counter = if hit.is_some() {
            &self.counters.hits
        } else {
            &self.counters.misses
        };
        counter.fetch_add(1, Ordering::Relaxed);
        hit
    }

    /// Store a value, replacing whatever was there for this fingerprint.
    pub async fn set(&self, fingerprint: Fingerprint, value: Arc<CanonicalResult>, ttl: Duration) {
        let entry = CacheEntry {
            fingerprint: fingerprint.clone(),
            value,
            stored_at: Instant::now(),
            ttl,
        };
        let mut cache = self.inner.write().await;
        cache.insert(fingerprint, entry);
    }

    /// Drop every entry. Returns how many were removed.
    pub async fn clear(&self) -> usize {
        let mut cache = self.inner.write().await;
        let dropped = cache.len();
        cache.clear();
        dropped
    }

    pub async fn contains(&self, fingerprint: &Fingerprint) -> bool {
        self.inner.read().await.contains_key(fingerprint)
    }

    pub async fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.inner.read().await.len(),
            hits: self.counters.hits.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fixtures::game;
    use crate::model::GameStatus;
    use crate::query::{QueryKind, QueryParams};

    fn live_game() -> Arc<CanonicalResult> {
        Arc::new(CanonicalResult::Game(game("401", GameStatus::Live, Some(24), Some(17))))
    }

    fn key(team: &str) -> Fingerprint {
        Fingerprint::new(QueryKind::CurrentGame, &QueryParams::team(team))
    }

    #[tokio::test(start_paused = true)]
    async fn test_ttl_is_honored() {
        let cache = CacheStore::new();
        cache.set(key("oklahoma"), live_game(), Duration::from_secs(60)).await;

        tokio::time::advance(Duration::from_secs(59)).await;
        assert!(cache.get_if_fresh(&key("oklahoma")).await.is_some());

        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(cache.get_if_fresh(&key("oklahoma")).await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_entry_is_fresh_at_exact_ttl() {
        let cache = CacheStore::new();
        cache.set(key("texas"), live_game(), Duration::from_secs(60)).await;
        tokio::time::advance(Duration::from_secs(60)).await;
        assert!(cache.get_if_fresh(&key("texas")).await.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_entry_is_not_evicted_on_read() {
        let cache = CacheStore::new();
        cache.set(key("texas"), live_game(), Duration::from_secs(60)).await;
        tokio::time::advance(Duration::from_secs(120)).await;

        assert!(cache.get_if_fresh(&key("texas")).await.is_none());
        assert!(cache.contains(&key("texas")).await);
        assert_eq!(cache.stats().await.entries, 1);
    }

    #[tokio::test]
    async fn test_repeated_hits_return_identical_value() {
        let cache = CacheStore::new();
        cache.set(key("oklahoma"), live_game(), Duration::from_secs(60)).await;

        let first = cache.get_if_fresh(&key("oklahoma")).await.unwrap();
        let second = cache.get_if_fresh(&key("oklahoma")).await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(*first, *second);
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_replaces_entry_and_restarts_clock() {
        let cache = CacheStore::new();
        cache.set(key("oklahoma"), live_game(), Duration::from_secs(60)).await;
        tokio::time::advance(Duration::from_secs(50)).await;

        let final_game = Arc::new(CanonicalResult::Game(game(
            "401",
            GameStatus::Final,
            Some(31),
            Some(17),
        )));
        cache
            .set(key("oklahoma"), Arc::clone(&final_game), Duration::from_secs(86_400))
            .await;
        tokio::time::advance(Duration::from_secs(3_600)).await;

        let got = cache.get_if_fresh(&key("oklahoma")).await.unwrap();
        assert!(Arc::ptr_eq(&got, &final_game));
    }

    #[tokio::test]
    async fn test_clear_drops_everything() {
        let cache = CacheStore::new();
        cache.set(key("oklahoma"), live_game(), Duration::from_secs(86_400)).await;
        cache.set(key("texas"), live_game(), Duration::from_secs(86_400)).await;

        assert_eq!(cache.clear().await, 2);
        assert!(cache.get_if_fresh(&key("oklahoma")).await.is_none());
        assert_eq!(cache.stats().await.entries, 0);
    }

    #[tokio::test]
    async fn test_stats_count_hits_and_misses() {
        let cache = CacheStore::new();
        assert!(cache.get_if_fresh(&key("oklahoma")).await.is_none());
        cache.set(key("oklahoma"), live_game(), Duration::from_secs(60)).await;
        assert!(cache.get_if_fresh(&key("oklahoma")).await.is_some());

        let stats = cache.stats().await;
        assert_eq!(stats, CacheStats { entries: 1, hits: 1, misses: 1 });
    }
}

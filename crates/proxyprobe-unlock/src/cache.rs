// Process-wide unlock result cache.
//
// Modeled as an explicit service with its own lifecycle: the sweep
// task starts on construction and stops when the cache is dropped,
// rather than living as hidden module-level state.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::types::UnlockResult;

const DEFAULT_TTL: Duration = Duration::from_secs(30 * 60);
const SWEEP_INTERVAL: Duration = Duration::from_secs(10 * 60);

/// Cache key: one entry per `(proxy, platform)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub proxy: String,
    pub platform: String,
}

impl CacheKey {
    pub fn new(proxy: impl Into<String>, platform: impl Into<String>) -> Self {
        Self {
            proxy: proxy.into(),
            platform: platform.into(),
        }
    }
}

struct CacheEntry {
    result: UnlockResult,
    expires_at: DateTime<Utc>,
}

/// Cumulative cache counters plus a point-in-time entry count.
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
    pub hit_ratio: f64,
    pub created_at: DateTime<Utc>,
}

/// Concurrent unlock result cache with lazy expiry on read and a
/// periodic background sweep. Safe to share across probe tasks.
pub struct ResultCache {
    entries: Arc<DashMap<CacheKey, CacheEntry>>,
    ttl: Duration,
    hits: AtomicU64,
    misses: AtomicU64,
    created_at: DateTime<Utc>,
    sweep_cancel: CancellationToken,
}

impl ResultCache {
    /// Cache with the default 30-minute TTL.
    pub fn new() -> Self {
        Self::with_ttl(DEFAULT_TTL)
    }

    /// Cache with a custom TTL (tests use short values).
    pub fn with_ttl(ttl: Duration) -> Self {
        let entries: Arc<DashMap<CacheKey, CacheEntry>> = Arc::new(DashMap::new());
        let sweep_cancel = CancellationToken::new();

        let sweep_entries = Arc::clone(&entries);
        let cancel = sweep_cancel.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(SWEEP_INTERVAL);
            ticker.tick().await; // first tick fires immediately
            loop {
                tokio::select! {
                    () = cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        let now = Utc::now();
                        let before = sweep_entries.len();
                        sweep_entries.retain(|_, entry| entry.expires_at > now);
                        let removed = before.saturating_sub(sweep_entries.len());
                        if removed > 0 {
                            debug!(removed, remaining = sweep_entries.len(), "swept expired unlock cache entries");
                        }
                    }
                }
            }
        });

        Self {
            entries,
            ttl,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            created_at: Utc::now(),
            sweep_cancel,
        }
    }

    /// Look up a cached result, lazily deleting it if expired.
    pub fn get(&self, key: &CacheKey) -> Option<UnlockResult> {
        if let Some(entry) = self.entries.get(key) {
            if entry.expires_at > Utc::now() {
                self.hits.fetch_add(1, Ordering::Relaxed);
                return Some(entry.result.clone());
            }
            drop(entry);
            self.entries.remove(key);
        }
        self.misses.fetch_add(1, Ordering::Relaxed);
        None
    }

    /// Store a result. A zero `ttl` means "use the cache default".
    pub fn set(&self, key: CacheKey, result: UnlockResult, ttl: Option<Duration>) {
        let ttl = ttl.unwrap_or(self.ttl);
        let expires_at = Utc::now()
            + chrono::Duration::from_std(ttl).unwrap_or_else(|_| chrono::Duration::seconds(0));
        self.entries.insert(key, CacheEntry { result, expires_at });
    }

    pub fn delete(&self, key: &CacheKey) {
        self.entries.remove(key);
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn stats(&self) -> CacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        CacheStats {
            hits,
            misses,
            entries: self.entries.len(),
            #[allow(clippy::cast_precision_loss)]
            hit_ratio: if total == 0 {
                0.0
            } else {
                hits as f64 / total as f64
            },
            created_at: self.created_at,
        }
    }
}

impl Default for ResultCache {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ResultCache {
    fn drop(&mut self) {
        self.sweep_cancel.cancel();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::UnlockStatus;

    fn result(platform: &str) -> UnlockResult {
        UnlockResult::new(platform, UnlockStatus::Unlocked, "US", "ok")
    }

    #[tokio::test]
    async fn set_then_get_round_trips() {
        let cache = ResultCache::new();
        let key = CacheKey::new("proxy-a", "Netflix");
        cache.set(key.clone(), result("Netflix"), None);

        let cached = cache.get(&key).unwrap();
        assert_eq!(cached.platform, "Netflix");
        assert_eq!(cached.region, "US");
    }

    #[tokio::test]
    async fn expired_entries_miss_on_read() {
        let cache = ResultCache::with_ttl(Duration::from_millis(10));
        let key = CacheKey::new("proxy-a", "Netflix");
        cache.set(key.clone(), result("Netflix"), None);

        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(cache.get(&key).is_none());
        assert_eq!(cache.stats().entries, 0);
    }

    #[tokio::test]
    async fn stats_track_hits_and_misses() {
        let cache = ResultCache::new();
        let key = CacheKey::new("proxy-a", "Netflix");

        assert!(cache.get(&key).is_none());
        cache.set(key.clone(), result("Netflix"), None);
        assert!(cache.get(&key).is_some());

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert!((stats.hit_ratio - 0.5).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn delete_and_clear_remove_entries() {
        let cache = ResultCache::new();
        let a = CacheKey::new("p", "A");
        let b = CacheKey::new("p", "B");
        cache.set(a.clone(), result("A"), None);
        cache.set(b.clone(), result("B"), None);

        cache.delete(&a);
        assert!(cache.get(&a).is_none());
        assert!(cache.get(&b).is_some());

        cache.clear();
        assert_eq!(cache.stats().entries, 0);
    }
}

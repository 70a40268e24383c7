use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
struct Entry<T> {
    value: T,
    /// Epoch milliseconds after which the entry is stale.
    expires_at: i64,
}

/// Key/value store with per-entry expiry.
///
/// Time is passed in by the caller so the cache can be persisted between runs
/// and exercised in tests without a clock.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TtlCache<T> {
    #[serde(skip)]
    ttl: Duration,
    entries: HashMap<String, Entry<T>>,
}

impl<T: Clone> TtlCache<T> {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl, entries: HashMap::new() }
    }

    /// Adopts entries loaded from disk under a new ttl.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn is_enabled(&self) -> bool {
        !self.ttl.is_zero()
    }

    pub fn get(&self, key: &str, now_ms: i64) -> Option<T> {
        if !self.is_enabled() {
            return None;
        }
        self.entries
            .get(key)
            .filter(|e| e.expires_at > now_ms)
            .map(|e| e.value.clone())
    }

    pub fn insert(&mut self, key: String, value: T, now_ms: i64) {
        if !self.is_enabled() {
            return;
        }
        let ttl_ms = i64::try_from(self.ttl.as_millis()).unwrap_or(i64::MAX);
        let expires_at = now_ms.saturating_add(ttl_ms);
        self.entries.insert(key, Entry { value, expires_at });
    }

    /// Drops stale entries, returning how many were removed.
    pub fn purge_expired(&mut self, now_ms: i64) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, e| e.expires_at > now_ms);
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINUTE: i64 = 60_000;

    #[test]
    fn entries_expire_after_ttl() {
        let mut cache = TtlCache::new(Duration::from_secs(600));
        cache.insert("BTCUSDT:7d".into(), 42.0, 0);

        assert_eq!(cache.get("BTCUSDT:7d", 9 * MINUTE), Some(42.0));
        assert_eq!(cache.get("BTCUSDT:7d", 10 * MINUTE), None);
        assert_eq!(cache.get("ETHUSDT:7d", 0), None);
    }

    #[test]
    fn purge_removes_only_stale_entries() {
        let mut cache = TtlCache::new(Duration::from_secs(60));
        cache.insert("a".into(), 1, 0);
        cache.insert("b".into(), 2, 2 * MINUTE);

        assert_eq!(cache.purge_expired(2 * MINUTE), 1);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("b", 2 * MINUTE), Some(2));
    }

    #[test]
    fn zero_ttl_disables_cache() {
        let mut cache = TtlCache::new(Duration::ZERO);
        cache.insert("a".into(), 1, 0);
        assert_eq!(cache.len(), 0);
        assert_eq!(cache.get("a", 0), None);
    }

    #[test]
    fn huge_ttl_saturates_instead_of_wrapping() {
        let mut cache = TtlCache::new(Duration::MAX);
        cache.insert("a".into(), 1, 0);
        assert_eq!(cache.get("a", i64::MAX - 1), Some(1));

        let mut cache = TtlCache::new(Duration::from_millis(u64::MAX));
        cache.insert("b".into(), 2, MINUTE);
        assert_eq!(cache.get("b", i64::MAX - 1), Some(2));
    }

    #[test]
    fn survives_serialization_with_new_ttl() {
        let mut cache = TtlCache::new(Duration::from_secs(60));
        cache.insert("a".into(), 5.5, 0);

        let json = serde_json::to_string(&cache).unwrap();
        let restored: TtlCache<f64> = serde_json::from_str(&json).unwrap();
        let restored = restored.with_ttl(Duration::from_secs(60));

        assert_eq!(restored.get("a", MINUTE - 1), Some(5.5));
        assert_eq!(restored.get("a", MINUTE), None);
    }
}

use std::collections::HashMap;
use std::hash::Hash;

use chrono::{DateTime, Duration, Utc};

/// Values memoized by key, each usable until `ttl` after it was stored
#[derive(Debug)]
pub struct TtlCache<K, V> {
    ttl: Duration,
    entries: HashMap<K, (DateTime<Utc>, V)>,
}

fn is_fresh(stored: DateTime<Utc>, now: DateTime<Utc>, ttl: Duration) -> bool {
    now - stored < ttl
}

impl<K: Eq + Hash, V> TtlCache<K, V> {
    pub fn new(ttl: Duration) -> Self {
        TtlCache {
            ttl,
            entries: HashMap::new(),
        }
    }

    /// Cached value, unless it has expired
    pub fn get(&self, key: &K, now: DateTime<Utc>) -> Option<&V> {
        match self.entries.get(key) {
            Some((stored, value)) if is_fresh(*stored, now, self.ttl) => Some(value),
            _ => None,
        }
    }

    pub fn insert(&mut self, key: K, value: V, now: DateTime<Utc>) {
        self.entries.insert(key, (now, value));
    }

    pub fn invalidate(&mut self, key: &K) {
        self.entries.remove(key);
    }

    /// Drop every expired entry
    pub fn purge_stale(&mut self, now: DateTime<Utc>) {
        let ttl = self.ttl;
        self.entries.retain(|_, (stored, _)| is_fresh(*stored, now, ttl));
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-01-15T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
            + Duration::seconds(secs)
    }

    #[test]
    fn test_expiry() {
        let mut c: TtlCache<String, u32> = TtlCache::new(Duration::hours(1));
        c.insert("a".into(), 1, at(0));

        assert_eq!(c.get(&"a".to_string(), at(0)), Some(&1));
        assert_eq!(c.get(&"a".to_string(), at(3599)), Some(&1));
        // Exactly one TTL old is stale
        assert_eq!(c.get(&"a".to_string(), at(3600)), None);
        assert_eq!(c.get(&"b".to_string(), at(0)), None);
    }

    #[test]
    fn test_insert_replaces_timestamp() {
        let mut c: TtlCache<&str, u32> = TtlCache::new(Duration::seconds(60));
        c.insert("k", 10, at(0));
        assert_eq!(c.get(&"k", at(61)), None);
        c.insert("k", 30, at(61));
        assert_eq!(c.get(&"k", at(100)), Some(&30));
    }

    #[test]
    fn test_zero_ttl_never_fresh() {
        let mut c: TtlCache<&str, u32> = TtlCache::new(Duration::zero());
        c.insert("k", 1, at(0));
        assert_eq!(c.get(&"k", at(0)), None);
    }

    #[test]
    fn test_invalidate_and_purge() {
        let mut c: TtlCache<&str, u32> = TtlCache::new(Duration::seconds(60));
        c.insert("old", 1, at(0));
        c.insert("new", 2, at(50));
        c.insert("gone", 3, at(50));

        c.invalidate(&"gone");
        assert_eq!(c.get(&"gone", at(50)), None);

        c.purge_stale(at(70));
        assert_eq!(c.entries.len(), 1);
        assert_eq!(c.get(&"new", at(70)), Some(&2));
    }
}

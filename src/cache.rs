//! Bounded, access-ordered metadata cache.
//!
//! `get` promotes an entry to most-recently-used, `contains_key` does not.
//! Once the cache is full every insertion of a new key evicts exactly one
//! entry, the least recently used.

use lru::LruCache;
use std::borrow::Borrow;
use std::hash::Hash;
use std::num::NonZeroUsize;

use crate::error::{MetadataError, Result};

pub const DEFAULT_CACHE_SIZE: usize = 100;

#[derive(Debug)]
pub struct MetadataCache<K: Hash + Eq, V> {
    entries: LruCache<K, V>,
}

impl<K: Hash + Eq, V> MetadataCache<K, V> {
    pub fn new(max_size: usize) -> Result<Self> {
        let cap = NonZeroUsize::new(max_size)
            .ok_or_else(|| MetadataError::invalid("cache must hold at least one entry"))?;
        Ok(Self {
            entries: LruCache::new(cap),
        })
    }

    pub fn max_size(&self) -> usize {
        self.entries.cap().get()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get<Q>(&mut self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.get(key)
    }

    /// Membership test that leaves recency untouched.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.contains(key)
    }

    /// Inserts or overwrites `key`, returning the evicted entry if the
    /// insertion pushed the cache past its maximum size.
    pub fn put(&mut self, key: K, value: V) -> Option<(K, V)> {
        let evicted = if !self.entries.contains(&key) && self.entries.len() >= self.max_size() {
            self.entries.pop_lru()
        } else {
            None
        };
        self.entries.put(key, value);
        evicted
    }

    /// Inserts every pair in order; each insertion may evict one entry.
    pub fn put_all<I>(&mut self, entries: I) -> Vec<(K, V)>
    where
        I: IntoIterator<Item = (K, V)>,
    {
        entries
            .into_iter()
            .filter_map(|(k, v)| self.put(k, v))
            .collect()
    }

    /// Entries from most to least recently used.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.entries.iter()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero_capacity() {
        let err = MetadataCache::<String, u32>::new(0).unwrap_err();
        assert!(matches!(err, MetadataError::InvalidArgument(_)));
        assert_eq!(MetadataCache::<String, u32>::new(1).unwrap().max_size(), 1);
    }

    #[test]
    fn evicts_least_recently_used_beyond_bound() {
        let mut cache = MetadataCache::new(3).unwrap();
        for (i, key) in ["a", "b", "c", "d", "e"].into_iter().enumerate() {
            cache.put(key.to_string(), i);
        }
        assert_eq!(cache.len(), 3);
        assert!(!cache.contains_key("a"));
        assert!(!cache.contains_key("b"));
        for key in ["c", "d", "e"] {
            assert!(cache.contains_key(key));
        }
    }

    #[test]
    fn get_refreshes_recency_but_contains_key_does_not() {
        let mut cache = MetadataCache::new(2).unwrap();
        cache.put("a".to_string(), 1);
        cache.put("b".to_string(), 2);

        assert!(cache.contains_key("a"));
        let evicted = cache.put("c".to_string(), 3);
        assert_eq!(evicted, Some(("a".to_string(), 1)));

        assert_eq!(cache.get("b"), Some(&2));
        let evicted = cache.put("d".to_string(), 4);
        assert_eq!(evicted, Some(("c".to_string(), 3)));
        assert!(cache.contains_key("b"));
    }

    #[test]
    fn overwrite_does_not_evict() {
        let mut cache = MetadataCache::new(2).unwrap();
        cache.put("a".to_string(), 1);
        cache.put("b".to_string(), 2);
        assert!(cache.put("a".to_string(), 10).is_none());
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("a"), Some(&10));
    }

    #[test]
    fn put_all_evicts_per_entry() {
        let mut cache = MetadataCache::new(2).unwrap();
        cache.put("old".to_string(), 0);
        let evicted = cache.put_all(vec![
            ("x".to_string(), 1),
            ("y".to_string(), 2),
            ("z".to_string(), 3),
        ]);
        let evicted: Vec<_> = evicted.into_iter().map(|(k, _)| k).collect();
        assert_eq!(evicted, vec!["old", "x"]);
        let keys: Vec<_> = cache.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["z", "y"]);
    }
}

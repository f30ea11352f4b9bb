//! Public entry point for class metadata lookups.
//!
//! A [`ClassIntrospector`] owns one bounded [`MetadataCache`]. Lookups hit the
//! cache first; a miss builds the metadata with [`MetadataBuilder`], stores it
//! and returns the stored object. Concurrent misses on the same type are
//! serialized behind a per-type gate so only one build runs per key.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::beans::{BeanConventions, PropertyResolver};
use crate::builder::MetadataBuilder;
use crate::cache::{DEFAULT_CACHE_SIZE, MetadataCache};
use crate::error::{MetadataError, Result};
use crate::introspect::TypeIntrospector;
use crate::model::ClassMetadata;
use crate::registry::{MarkerListener, MarkerRegistry};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntrospectorConfig {
    pub cache_size: usize,
}

impl Default for IntrospectorConfig {
    fn default() -> Self {
        Self {
            cache_size: DEFAULT_CACHE_SIZE,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct IntrospectorStats {
    pub hits: u64,
    pub misses: u64,
    pub builds: u64,
    pub evictions: u64,
    pub cached: usize,
    pub max_size: usize,
}

#[derive(Debug, Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    builds: AtomicU64,
    evictions: AtomicU64,
}

type Entries = MetadataCache<String, Arc<ClassMetadata>>;

pub struct ClassIntrospector {
    builder: MetadataBuilder,
    cache: Mutex<Entries>,
    gates: Mutex<HashMap<String, Arc<Mutex<()>>>>,
    counters: Counters,
}

impl ClassIntrospector {
    pub fn new(
        introspector: Arc<dyn TypeIntrospector>,
        registry: MarkerRegistry,
        config: IntrospectorConfig,
    ) -> Result<Self> {
        Self::with_resolver(introspector, Arc::new(BeanConventions), registry, config)
    }

    pub fn with_resolver(
        introspector: Arc<dyn TypeIntrospector>,
        resolver: Arc<dyn PropertyResolver>,
        registry: MarkerRegistry,
        config: IntrospectorConfig,
    ) -> Result<Self> {
        Ok(Self {
            builder: MetadataBuilder::new(introspector, resolver, registry),
            cache: Mutex::new(MetadataCache::new(config.cache_size)?),
            gates: Mutex::new(HashMap::new()),
            counters: Counters::default(),
        })
    }

    pub fn registry(&self) -> &MarkerRegistry {
        self.builder.registry()
    }

    /// Registers `listener` for the marker type `marker_type`.
    pub fn register_listener(
        &self,
        marker_type: &str,
        listener: Arc<dyn MarkerListener>,
    ) -> Result<()> {
        if marker_type.trim().is_empty() {
            return Err(MetadataError::invalid(
                "both marker type and listener must be specified",
            ));
        }
        self.builder.registry().register(marker_type, listener)
    }

    /// Builds and caches every listed type that is not cached yet.
    ///
    /// Blank names are skipped. Stops at the first type that cannot be built.
    pub fn load_metadata<I, S>(&self, types: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for type_name in types {
            let type_name = type_name.as_ref().trim();
            if type_name.is_empty() || self.cache.lock().contains_key(type_name) {
                continue;
            }
            self.build_once(type_name)?;
        }
        Ok(())
    }

    /// Metadata for `type_name`; `Ok(None)` for a blank name.
    pub fn get_metadata(&self, type_name: &str) -> Result<Option<Arc<ClassMetadata>>> {
        let type_name = type_name.trim();
        if type_name.is_empty() {
            return Ok(None);
        }
        if let Some(hit) = self.cache.lock().get(type_name).cloned() {
            self.counters.hits.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(type_name, "metadata cache hit");
            return Ok(Some(hit));
        }
        self.build_once(type_name).map(Some)
    }

    /// Rebuilds `type_name` regardless of the cache and replaces the cached entry.
    pub fn refresh(&self, type_name: &str) -> Result<Arc<ClassMetadata>> {
        let type_name = type_name.trim();
        if type_name.is_empty() {
            return Err(MetadataError::invalid("type name must be specified"));
        }
        let gate = self.gate(type_name);
        let result = {
            let _building = gate.lock();
            self.build_and_store(type_name)
        };
        self.retire_gate(type_name, &gate);
        result
    }

    /// Merges already-built metadata into the cache, entry by entry.
    pub fn merge_external_metadata<I>(&self, metadata: I)
    where
        I: IntoIterator<Item = (String, ClassMetadata)>,
    {
        let entries = metadata.into_iter().map(|(k, v)| (k, Arc::new(v)));
        let evicted = self.cache.lock().put_all(entries);
        self.record_evictions(evicted.len());
    }

    /// Read-only snapshot of the cache, most recently used first.
    pub fn cache_view(&self) -> CacheView {
        let cache = self.cache.lock();
        CacheView {
            entries: cache
                .iter()
                .map(|(k, v)| (k.clone(), Arc::clone(v)))
                .collect(),
            max_size: cache.max_size(),
        }
    }

    pub fn stats(&self) -> IntrospectorStats {
        let cache = self.cache.lock();
        IntrospectorStats {
            hits: self.counters.hits.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
            builds: self.counters.builds.load(Ordering::Relaxed),
            evictions: self.counters.evictions.load(Ordering::Relaxed),
            cached: cache.len(),
            max_size: cache.max_size(),
        }
    }

    fn build_once(&self, type_name: &str) -> Result<Arc<ClassMetadata>> {
        let gate = self.gate(type_name);
        let result = {
            let _building = gate.lock();
            // Another caller may have finished the same build while we waited.
            let cached = self.cache.lock().get(type_name).cloned();
            match cached {
                Some(hit) => {
                    self.counters.hits.fetch_add(1, Ordering::Relaxed);
                    Ok(hit)
                }
                None => {
                    self.counters.misses.fetch_add(1, Ordering::Relaxed);
                    tracing::debug!(type_name, "metadata cache miss");
                    self.build_and_store(type_name)
                }
            }
        };
        self.retire_gate(type_name, &gate);
        result
    }

    fn build_and_store(&self, type_name: &str) -> Result<Arc<ClassMetadata>> {
        let built = Arc::new(self.builder.build(type_name)?);
        self.counters.builds.fetch_add(1, Ordering::Relaxed);
        let evicted = self
            .cache
            .lock()
            .put(type_name.to_string(), Arc::clone(&built));
        if let Some((key, _)) = evicted {
            tracing::debug!(evicted = %key, "metadata cache full, evicted least recently used");
            self.record_evictions(1);
        }
        Ok(built)
    }

    fn record_evictions(&self, count: usize) {
        if count > 0 {
            self.counters
                .evictions
                .fetch_add(count as u64, Ordering::Relaxed);
        }
    }

    fn gate(&self, type_name: &str) -> Arc<Mutex<()>> {
        Arc::clone(self.gates.lock().entry(type_name.to_string()).or_default())
    }

    fn retire_gate(&self, type_name: &str, gate: &Arc<Mutex<()>>) {
        let mut gates = self.gates.lock();
        // One reference in the map plus the caller's: nobody else is waiting.
        if Arc::strong_count(gate) <= 2 {
            gates.remove(type_name);
        }
    }
}

/// Immutable snapshot of cached metadata.
#[derive(Debug, Clone)]
pub struct CacheView {
    entries: Vec<(String, Arc<ClassMetadata>)>,
    max_size: usize,
}

impl CacheView {
    pub fn get(&self, type_name: &str) -> Option<&Arc<ClassMetadata>> {
        self.entries
            .iter()
            .find(|(k, _)| k == type_name)
            .map(|(_, v)| v)
    }

    pub fn contains_key(&self, type_name: &str) -> bool {
        self.get(type_name).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Arc<ClassMetadata>)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::introspect::{FieldDescription, InMemoryIntrospector, TypeDescription, TypeRef};
    use std::sync::atomic::AtomicUsize;

    struct Counting {
        inner: InMemoryIntrospector,
        calls: AtomicUsize,
    }

    impl TypeIntrospector for Counting {
        fn describe(&self, type_name: &str) -> Result<TypeDescription> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            std::thread::sleep(std::time::Duration::from_millis(5));
            self.inner.describe(type_name)
        }
    }

    fn provider(names: &[&str]) -> InMemoryIntrospector {
        let provider = InMemoryIntrospector::new();
        for name in names {
            provider.insert(
                TypeDescription::new(*name)
                    .with_field(FieldDescription::new("id", TypeRef::named("long"))),
            );
        }
        provider
    }

    fn introspector(names: &[&str], cache_size: usize) -> ClassIntrospector {
        ClassIntrospector::new(
            Arc::new(provider(names)),
            MarkerRegistry::new(),
            IntrospectorConfig { cache_size },
        )
        .unwrap()
    }

    #[test]
    fn zero_cache_size_is_rejected() {
        let err = ClassIntrospector::new(
            Arc::new(InMemoryIntrospector::new()),
            MarkerRegistry::new(),
            IntrospectorConfig { cache_size: 0 },
        )
        .err()
        .unwrap();
        assert!(matches!(err, MetadataError::InvalidArgument(_)));
    }

    #[test]
    fn blank_type_name_yields_none() {
        let introspector = introspector(&["a.A"], 4);
        assert!(introspector.get_metadata("").unwrap().is_none());
        assert!(introspector.get_metadata("   ").unwrap().is_none());
        assert_eq!(introspector.stats().builds, 0);
    }

    #[test]
    fn refresh_replaces_cached_entry() {
        let introspector = introspector(&["a.A"], 4);
        let first = introspector.get_metadata("a.A").unwrap().unwrap();
        let refreshed = introspector.refresh("a.A").unwrap();
        assert!(!Arc::ptr_eq(&first, &refreshed));
        let again = introspector.get_metadata("a.A").unwrap().unwrap();
        assert!(Arc::ptr_eq(&refreshed, &again));
        assert_eq!(introspector.stats().builds, 2);
    }

    #[test]
    fn stats_track_hits_misses_and_evictions() {
        let introspector = introspector(&["a.A", "a.B", "a.C"], 2);
        introspector.get_metadata("a.A").unwrap();
        introspector.get_metadata("a.A").unwrap();
        introspector.get_metadata("a.B").unwrap();
        introspector.get_metadata("a.C").unwrap();

        let stats = introspector.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 3);
        assert_eq!(stats.builds, 3);
        assert_eq!(stats.evictions, 1);
        assert_eq!(stats.cached, 2);
        assert_eq!(stats.max_size, 2);
    }

    #[test]
    fn concurrent_misses_build_once() {
        let counting = Arc::new(Counting {
            inner: provider(&["a.Hot"]),
            calls: AtomicUsize::new(0),
        });
        let introspector = Arc::new(
            ClassIntrospector::new(
                counting.clone(),
                MarkerRegistry::new(),
                IntrospectorConfig::default(),
            )
            .unwrap(),
        );

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let introspector = Arc::clone(&introspector);
                std::thread::spawn(move || introspector.get_metadata("a.Hot").unwrap().unwrap())
            })
            .collect();
        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert_eq!(counting.calls.load(Ordering::SeqCst), 1);
        assert!(results.iter().all(|r| Arc::ptr_eq(r, &results[0])));
        assert!(introspector.gates.lock().is_empty());
    }

    #[test]
    fn cache_view_is_a_snapshot() {
        let introspector = introspector(&["a.A", "a.B"], 4);
        introspector.get_metadata("a.A").unwrap();
        let view = introspector.cache_view();
        introspector.get_metadata("a.B").unwrap();

        assert_eq!(view.len(), 1);
        assert!(view.contains_key("a.A"));
        assert!(!view.contains_key("a.B"));
        assert_eq!(view.max_size(), 4);
        assert_eq!(introspector.cache_view().keys().collect::<Vec<_>>(), vec!["a.B", "a.A"]);
    }
}

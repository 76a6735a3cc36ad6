use crate::sales_table::SalesTable;
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use tracing::trace;

/// Identifies one parsed input: where it came from plus a hash of its bytes,
/// so two different files behind the same name never share an entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    source: String,
    content_hash: u64,
}

impl CacheKey {
    pub fn new(source: impl Into<String>, bytes: &[u8]) -> Self {
        let mut hasher = DefaultHasher::new();
        bytes.hash(&mut hasher);
        CacheKey {
            source: source.into(),
            content_hash: hasher.finish(),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn content_hash(&self) -> u64 {
        self.content_hash
    }
}

/// Memoized ingestion results.
#[derive(Debug, Default)]
pub struct IngestCache {
    entries: HashMap<CacheKey, Arc<SalesTable>>,
    hits: u64,
    misses: u64,
}

impl IngestCache {
    pub fn new() -> Self {
        IngestCache::default()
    }

    /// Looks up a previously parsed table, counting the hit or miss.
    pub fn get(&mut self, key: &CacheKey) -> Option<Arc<SalesTable>> {
        match self.entries.get(key) {
            Some(table) => {
                self.hits += 1;
                trace!("Cache hit for {}", key.source);
                Some(Arc::clone(table))
            }
            None => {
                self.misses += 1;
                trace!("Cache miss for {}", key.source);
                None
            }
        }
    }

    pub fn insert(&mut self, key: CacheKey, table: Arc<SalesTable>) {
        self.entries.insert(key, table);
    }

    /// Removes one entry. Returns true if it was present.
    pub fn invalidate(&mut self, key: &CacheKey) -> bool {
        self.entries.remove(key).is_some()
    }

    /// Removes every entry for `source` regardless of content. Returns the
    /// number of entries dropped.
    pub fn invalidate_source(&mut self, source: &str) -> usize {
        let before = self.entries.len();
        self.entries.retain(|key, _| key.source != source);
        before - self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// (hits, misses) since creation.
    pub fn stats(&self) -> (u64, u64) {
        (self.hits, self.misses)
    }
}

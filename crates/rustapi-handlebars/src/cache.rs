//! Bounded cache of compiled templates

use crate::template::CompiledTemplate;
use crate::{Result, ViewError};
use lru::LruCache;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Least-recently-used map from absolute template path to compiled template
///
/// Only successfully compiled templates are ever inserted. Concurrent misses
/// on the same path may both compile; the last insert wins.
pub struct TemplateCache {
    entries: Mutex<LruCache<PathBuf, Arc<CompiledTemplate>>>,
    capacity: NonZeroUsize,
}

impl TemplateCache {
    /// Create a cache holding at most `capacity` templates
    pub fn new(capacity: usize) -> Result<Self> {
        let capacity = NonZeroUsize::new(capacity)
            .ok_or_else(|| ViewError::configuration("cache capacity must be non-zero"))?;
        Ok(Self {
            entries: Mutex::new(LruCache::new(capacity)),
            capacity,
        })
    }

    /// Look up `path`, marking it most recently used
    pub async fn get(&self, path: &Path) -> Option<Arc<CompiledTemplate>> {
        self.entries.lock().await.get(path).cloned()
    }

    /// Insert a compiled template, evicting the least recently used entry when full
    pub async fn insert(&self, path: PathBuf, template: Arc<CompiledTemplate>) {
        if let Some((evicted, _)) = self.entries.lock().await.push(path.clone(), template) {
            if evicted != path {
                tracing::debug!(path = %evicted.display(), "evicted compiled template");
            }
        }
    }

    /// Number of cached templates
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    /// Whether the cache holds no templates
    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }

    /// Whether `path` is cached, without touching its recency
    pub async fn contains(&self, path: &Path) -> bool {
        self.entries.lock().await.contains(path)
    }

    /// Maximum number of cached templates
    pub fn capacity(&self) -> usize {
        self.capacity.get()
    }
}

/// Counters describing how templates were obtained
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    /// Templates served from the cache
    pub hits: u64,
    /// Cache lookups that had to load from disk
    pub misses: u64,
    /// Templates compiled, including inline bodies and uncached loads
    pub compiles: u64,
}

#[derive(Default)]
pub(crate) struct StatCounters {
    hits: AtomicU64,
    misses: AtomicU64,
    compiles: AtomicU64,
}

impl StatCounters {
    pub(crate) fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_compile(&self) {
        self.compiles.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> RenderStats {
        RenderStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            compiles: self.compiles.load(Ordering::Relaxed),
        }
    }
}

//! Summary cache abstraction.
//!
//! The pipeline reads before generating and writes after a successful
//! generation; the backing storage is the host's concern. The in-memory
//! implementation serves tests and hosts without their own store.

use crate::error::Result;
use crate::summary::StructuredSummary;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::RwLock;

/// Cache key: content id plus the identity of the requesting caller.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub content_id: String,
    pub caller_id: String,
}

impl CacheKey {
    /// A missing caller identity normalizes to an empty segment.
    pub fn new(content_id: &str, caller_id: Option<&str>) -> Self {
        Self {
            content_id: content_id.to_string(),
            caller_id: caller_id.unwrap_or_default().to_string(),
        }
    }
}

/// A cached summary with its generation timestamp.
#[derive(Debug, Clone)]
pub struct CachedSummary {
    pub summary: StructuredSummary,
    pub generated_at: DateTime<Utc>,
}

/// Trait for summary caches.
///
/// Writes must be atomic per key; a read must never observe a partially
/// written entry.
#[async_trait]
pub trait SummaryCache: Send + Sync {
    /// Fetch the cached summary for a key, if any.
    async fn get(&self, key: &CacheKey) -> Result<Option<CachedSummary>>;

    /// Store a freshly generated summary, replacing any previous entry.
    async fn put(&self, key: &CacheKey, entry: CachedSummary) -> Result<()>;

    /// Remove an entry. Returns whether one existed.
    async fn remove(&self, key: &CacheKey) -> Result<bool>;

    /// Number of cached entries.
    async fn len(&self) -> Result<usize>;
}

/// In-memory summary cache.
pub struct MemorySummaryCache {
    entries: RwLock<HashMap<CacheKey, CachedSummary>>,
}

impl MemorySummaryCache {
    /// Create a new in-memory cache.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MemorySummaryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SummaryCache for MemorySummaryCache {
    async fn get(&self, key: &CacheKey) -> Result<Option<CachedSummary>> {
        let entries = self.entries.read().unwrap();
        Ok(entries.get(key).cloned())
    }

    async fn put(&self, key: &CacheKey, entry: CachedSummary) -> Result<()> {
        let mut entries = self.entries.write().unwrap();
        entries.insert(key.clone(), entry);
        Ok(())
    }

    async fn remove(&self, key: &CacheKey) -> Result<bool> {
        let mut entries = self.entries.write().unwrap();
        Ok(entries.remove(key).is_some())
    }

    async fn len(&self) -> Result<usize> {
        let entries = self.entries.read().unwrap();
        Ok(entries.len())
    }
}

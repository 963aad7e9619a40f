// Cache store port: at most one value per cache key, replaced wholesale.
//
// Responsibilities
// - get / put / invalidate on whole values. Values are shared behind `Arc` and never
//   mutated after `put`, so a reader can not observe a half-updated entry.
// - No TTL and no eviction. The key space (entities x granularities x periods) is
//   small and finite.
//
// Boundaries
// - No fetching here. Deciding when to fill or refresh an entry is the job of the
//   fetch coordinator.

pub mod in_memory;

use crate::shared::core::primitives::CacheKey;
use async_trait::async_trait;
use std::sync::Arc;

#[derive(Debug)]
pub struct CacheEntry<V> {
    pub value: Arc<V>,
    pub stored_at: i64,
}

impl<V> Clone for CacheEntry<V> {
    fn clone(&self) -> Self {
        Self {
            value: Arc::clone(&self.value),
            stored_at: self.stored_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct CacheEntryStatus {
    pub key: CacheKey,
    pub stored_at: i64,
}

#[async_trait]
pub trait CacheStore<V: Send + Sync + 'static>: Send + Sync {
    async fn get(&self, key: &CacheKey) -> Option<CacheEntry<V>>;
    async fn put(&self, key: CacheKey, value: Arc<V>, stored_at: i64);
    async fn invalidate(&self, key: &CacheKey) -> bool;
    async fn clear(&self);
    async fn entries(&self) -> Vec<CacheEntryStatus>;
}

// In memory implementation of the CacheStore port.
//
// Purpose
// - The process-lifetime snapshot cache. Constructed once in the composition root.

use crate::shared::core::primitives::CacheKey;
use crate::shared::infrastructure::cache_store::{CacheEntry, CacheEntryStatus, CacheStore};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

pub struct InMemoryCacheStore<V: Send + Sync + 'static> {
    inner: RwLock<HashMap<CacheKey, CacheEntry<V>>>,
}

impl<V: Send + Sync + 'static> InMemoryCacheStore<V> {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
        }
    }
}

impl<V: Send + Sync + 'static> Default for InMemoryCacheStore<V> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl<V> CacheStore<V> for InMemoryCacheStore<V>
where
    V: Send + Sync + 'static,
{
    async fn get(&self, key: &CacheKey) -> Option<CacheEntry<V>> {
        self.inner.read().await.get(key).cloned()
    }

    async fn put(&self, key: CacheKey, value: Arc<V>, stored_at: i64) {
        self.inner
            .write()
            .await
            .insert(key, CacheEntry { value, stored_at });
    }

    async fn invalidate(&self, key: &CacheKey) -> bool {
        self.inner.write().await.remove(key).is_some()
    }

    async fn clear(&self) {
        self.inner.write().await.clear();
    }

    async fn entries(&self) -> Vec<CacheEntryStatus> {
        let mut entries: Vec<CacheEntryStatus> = self
            .inner
            .read()
            .await
            .iter()
            .map(|(key, entry)| CacheEntryStatus {
                key: key.clone(),
                stored_at: entry.stored_at,
            })
            .collect();
        entries.sort_by(|a, b| a.key.cmp(&b.key));
        entries
    }
}

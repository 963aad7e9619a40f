// Fetch Coordinator.
//
// Purpose
// - Serve snapshots from the cache store and fill it from the data provider on a miss.
//
// Responsibilities
// - Hit: return the cached `Arc<Snapshot>` whatever its age.
// - Miss: start a fetch on a spawned task, or attach to the one already in flight for
//   the key. At most one fetch per key; different keys fetch concurrently.
// - Refresh: always start a new fetch (attaching only to another refresh in flight).
//   Replace the entry on success, keep it on failure.
// - Apply results under a per-key sequence number. A response older than the applied
//   snapshot is dropped.
// - Publish `SnapshotApplied` for the observed key only.
//
// Boundaries
// - Callers that stop waiting do not cancel the fetch. The spawned task still applies
//   its result to the cache.
// - Provider calls are the only suspension points of a fetch. Ingestion, filtering,
//   joining and metrics run synchronously in `Snapshot::build`.

use crate::modules::utilization::core::fetch_state::FetchState;
use crate::modules::utilization::core::ingest::ingest;
use crate::modules::utilization::core::pools::PoolCatalog;
use crate::modules::utilization::core::ports::{DataProvider, ProviderError};
use crate::modules::utilization::core::snapshot::{Snapshot, SnapshotSource};
use crate::shared::core::primitives::{CacheKey, PeriodKey, now_millis};
use crate::shared::infrastructure::cache_store::CacheStore;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{Mutex, broadcast, watch};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("entity {0:?} missing from provider payload")]
    EntityMissing(String),

    #[error("fetch task ended without a result")]
    TaskAborted,
}

pub type FetchResult = Result<Arc<Snapshot>, FetchError>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SnapshotApplied {
    pub key: CacheKey,
    pub fetch_id: Uuid,
    pub fetched_at: i64,
}

/// Non-blocking view of a key: what is cached now and what is happening to it.
#[derive(Debug, Clone)]
pub struct RequestOutcome {
    pub snapshot: Option<Arc<Snapshot>>,
    pub state: FetchState,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheStatusRow {
    pub key: CacheKey,
    pub fetched_at: Option<i64>,
    pub age_ms: Option<i64>,
    pub state: FetchState,
}

const APPLIED_CHANNEL_CAPACITY: usize = 64;

struct Inflight {
    seq: u64,
    forced: bool,
    rx: watch::Receiver<Option<FetchResult>>,
}

impl Inflight {
    // The sender is dropped without a value only if the fetch task died.
    fn is_alive(&self) -> bool {
        self.rx.has_changed().is_ok()
    }
}

#[derive(Default)]
struct KeyState {
    next_seq: u64,
    applied_seq: u64,
    inflight: Option<Inflight>,
    state: FetchState,
}

struct Inner<TProvider, TCache> {
    provider: Arc<TProvider>,
    cache: Arc<TCache>,
    pools: PoolCatalog,
    keys: Mutex<HashMap<CacheKey, KeyState>>,
    observed: Mutex<Option<CacheKey>>,
    applied: broadcast::Sender<SnapshotApplied>,
}

pub struct FetchCoordinator<TProvider, TCache>
where
    TProvider: DataProvider + 'static,
    TCache: CacheStore<Snapshot> + 'static,
{
    inner: Arc<Inner<TProvider, TCache>>,
}

impl<TProvider, TCache> Clone for FetchCoordinator<TProvider, TCache>
where
    TProvider: DataProvider + 'static,
    TCache: CacheStore<Snapshot> + 'static,
{
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<TProvider, TCache> FetchCoordinator<TProvider, TCache>
where
    TProvider: DataProvider + 'static,
    TCache: CacheStore<Snapshot> + 'static,
{
    pub fn new(provider: Arc<TProvider>, cache: Arc<TCache>, pools: PoolCatalog) -> Self {
        let (applied, _) = broadcast::channel(APPLIED_CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                provider,
                cache,
                pools,
                keys: Mutex::new(HashMap::new()),
                observed: Mutex::new(None),
                applied,
            }),
        }
    }

    pub fn provider(&self) -> &Arc<TProvider> {
        &self.inner.provider
    }

    pub async fn get_snapshot(&self, key: &CacheKey) -> FetchResult {
        let (seq, rx) = {
            let mut keys = self.inner.keys.lock().await;
            if let Some(entry) = self.inner.cache.get(key).await {
                debug!(%key, "cache hit");
                return Ok(entry.value);
            }
            self.attach_or_start(&mut keys, key, false)
        };
        self.wait(key, seq, rx).await
    }

    /// Starts (or joins) a fetch on a miss and returns at once.
    pub async fn request(&self, key: &CacheKey) -> RequestOutcome {
        let mut keys = self.inner.keys.lock().await;
        let snapshot = self.inner.cache.get(key).await.map(|entry| entry.value);
        if snapshot.is_none() {
            self.attach_or_start(&mut keys, key, false);
        }
        RequestOutcome {
            snapshot,
            state: keys.get(key).map(|k| k.state.clone()).unwrap_or_default(),
        }
    }

    /// Fetches regardless of the cache. On failure the cached snapshot stays in place.
    pub async fn refresh(&self, key: &CacheKey) -> FetchResult {
        let (seq, rx) = {
            let mut keys = self.inner.keys.lock().await;
            self.attach_or_start(&mut keys, key, true)
        };
        self.wait(key, seq, rx).await
    }

    /// Several entities for one period, fetched concurrently. Results keep the order of
    /// `entities`.
    pub async fn get_snapshots(
        &self,
        entities: &[String],
        period: &PeriodKey,
    ) -> Vec<(String, FetchResult)> {
        let mut results: Vec<(String, FetchResult)> = entities
            .iter()
            .map(|entity| (entity.clone(), Err(FetchError::TaskAborted)))
            .collect();

        let mut set = JoinSet::new();
        for (index, entity) in entities.iter().enumerate() {
            let coordinator = self.clone();
            let key = CacheKey::new(entity.as_str(), period);
            set.spawn(async move {
                let result = coordinator.get_snapshot(&key).await;
                (index, result)
            });
        }
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((index, result)) => results[index].1 = result,
                Err(error) => warn!(%error, "snapshot task failed"),
            }
        }
        results
    }

    /// The cached snapshot, without fetching.
    pub async fn cached(&self, key: &CacheKey) -> Option<Arc<Snapshot>> {
        self.inner.cache.get(key).await.map(|entry| entry.value)
    }

    pub async fn fetch_state(&self, key: &CacheKey) -> FetchState {
        self.inner
            .keys
            .lock()
            .await
            .get(key)
            .map(|k| k.state.clone())
            .unwrap_or_default()
    }

    /// Marks the key a view currently renders. Applied snapshots for any other key are
    /// cached silently.
    pub async fn observe(&self, key: Option<CacheKey>) {
        *self.inner.observed.lock().await = key;
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SnapshotApplied> {
        self.inner.applied.subscribe()
    }

    pub async fn cache_status(&self) -> Vec<CacheStatusRow> {
        let now = now_millis();
        let keys = self.inner.keys.lock().await;
        let mut rows: BTreeMap<CacheKey, CacheStatusRow> = BTreeMap::new();
        for entry in self.inner.cache.entries().await {
            let state = keys
                .get(&entry.key)
                .map(|k| k.state.clone())
                .unwrap_or_default();
            rows.insert(
                entry.key.clone(),
                CacheStatusRow {
                    key: entry.key,
                    fetched_at: Some(entry.stored_at),
                    age_ms: Some((now - entry.stored_at).max(0)),
                    state,
                },
            );
        }
        for (key, key_state) in keys.iter() {
            rows.entry(key.clone()).or_insert_with(|| CacheStatusRow {
                key: key.clone(),
                fetched_at: None,
                age_ms: None,
                state: key_state.state.clone(),
            });
        }
        rows.into_values().collect()
    }

    /// Drops every cached snapshot. Fetches in flight still apply their results.
    pub async fn clear(&self) {
        let keys = self.inner.keys.lock().await;
        self.inner.cache.clear().await;
        info!(tracked_keys = keys.len(), "cache cleared");
    }

    /// Drops the cached snapshot of one key. The fetch state is kept, and a fetch in
    /// flight still applies its result.
    pub async fn invalidate(&self, key: &CacheKey) -> bool {
        let _keys = self.inner.keys.lock().await;
        let removed = self.inner.cache.invalidate(key).await;
        info!(%key, removed, "cache entry invalidated");
        removed
    }

    fn attach_or_start(
        &self,
        keys: &mut HashMap<CacheKey, KeyState>,
        key: &CacheKey,
        forced: bool,
    ) -> (u64, watch::Receiver<Option<FetchResult>>) {
        let key_state = keys.entry(key.clone()).or_default();
        if let Some(inflight) = key_state
            .inflight
            .as_ref()
            .filter(|i| i.is_alive() && (i.forced || !forced))
        {
            debug!(%key, seq = inflight.seq, "joining fetch in flight");
            return (inflight.seq, inflight.rx.clone());
        }

        key_state.next_seq += 1;
        let seq = key_state.next_seq;
        let (tx, rx) = watch::channel(None);
        key_state.inflight = Some(Inflight {
            seq,
            forced,
            rx: rx.clone(),
        });
        key_state.state = FetchState::Fetching {
            since: now_millis(),
        };
        info!(%key, seq, forced, "fetch started");

        let inner = Arc::clone(&self.inner);
        let key = key.clone();
        tokio::spawn(async move {
            let loaded = inner.load(&key).await;
            let result = inner.apply(&key, seq, loaded).await;
            let _ = tx.send(Some(result));
        });
        (seq, rx)
    }

    async fn wait(
        &self,
        key: &CacheKey,
        seq: u64,
        mut rx: watch::Receiver<Option<FetchResult>>,
    ) -> FetchResult {
        let delivered = rx
            .wait_for(Option::is_some)
            .await
            .map(|value| (*value).clone());
        match delivered {
            Ok(Some(result)) => result,
            _ => {
                self.inner.abandon(key, seq).await;
                Err(FetchError::TaskAborted)
            }
        }
    }
}

impl<TProvider, TCache> Inner<TProvider, TCache>
where
    TProvider: DataProvider + 'static,
    TCache: CacheStore<Snapshot> + 'static,
{
    async fn load(&self, key: &CacheKey) -> Result<Snapshot, FetchError> {
        let entities = [key.entity.clone()];
        let (payload, external) = tokio::join!(
            self.provider
                .fetch_snapshot(&entities, key.granularity, &key.period_value),
            self.provider
                .fetch_external_hours(key.granularity, &key.period_value),
        );
        let mut payload = payload?;
        let external_hours = match external {
            Ok(hours) => Some(hours),
            Err(error) => {
                warn!(%key, %error, "external hours unavailable, external ratios are N/A");
                None
            }
        };
        let raw = payload
            .take_entity(&key.entity)
            .ok_or_else(|| FetchError::EntityMissing(key.entity.clone()))?;

        let source = SnapshotSource {
            entity: key.entity.clone(),
            period_key: key.period(),
            datasets: ingest(raw, key.granularity),
            external_hours,
            pools: self.pools.pools_for(&key.entity).to_vec(),
            source_cached: payload.cached,
            source_timestamp: payload.source_timestamp,
        };
        Ok(Snapshot::build(source, Uuid::now_v7(), now_millis()))
    }

    async fn apply(
        &self,
        key: &CacheKey,
        seq: u64,
        loaded: Result<Snapshot, FetchError>,
    ) -> FetchResult {
        let mut keys = self.keys.lock().await;
        let key_state = keys.entry(key.clone()).or_default();
        let is_latest = key_state.inflight.as_ref().is_some_and(|i| i.seq == seq);
        if is_latest {
            key_state.inflight = None;
        }

        match loaded {
            Ok(snapshot) if seq > key_state.applied_seq => {
                let snapshot = Arc::new(snapshot);
                self.cache
                    .put(key.clone(), Arc::clone(&snapshot), snapshot.fetched_at)
                    .await;
                key_state.applied_seq = seq;
                // A newer request that already failed is outdated by this snapshot.
                if key_state.inflight.is_none() {
                    key_state.state = FetchState::Succeeded {
                        at: snapshot.fetched_at,
                    };
                }
                info!(%key, seq, fetch_id = %snapshot.fetch_id, "snapshot applied");
                self.notify_if_observed(key, &snapshot).await;
                Ok(snapshot)
            }
            Ok(snapshot) => {
                debug!(
                    %key,
                    seq,
                    applied_seq = key_state.applied_seq,
                    "superseded response dropped"
                );
                match self.cache.get(key).await {
                    Some(entry) => Ok(entry.value),
                    None => Ok(Arc::new(snapshot)),
                }
            }
            Err(error) => {
                warn!(%key, seq, %error, "fetch failed, previous snapshot kept");
                if is_latest {
                    key_state.state = FetchState::Failed {
                        at: now_millis(),
                        error: error.to_string(),
                    };
                }
                Err(error)
            }
        }
    }

    async fn abandon(&self, key: &CacheKey, seq: u64) {
        let mut keys = self.keys.lock().await;
        if let Some(key_state) = keys.get_mut(key)
            && key_state.inflight.as_ref().is_some_and(|i| i.seq == seq)
        {
            key_state.inflight = None;
            key_state.state = FetchState::Failed {
                at: now_millis(),
                error: FetchError::TaskAborted.to_string(),
            };
        }
    }

    async fn notify_if_observed(&self, key: &CacheKey, snapshot: &Snapshot) {
        if self.observed.lock().await.as_ref() != Some(key) {
            return;
        }
        // No subscriber is not an error.
        let _ = self.applied.send(SnapshotApplied {
            key: key.clone(),
            fetch_id: snapshot.fetch_id,
            fetched_at: snapshot.fetched_at,
        });
    }
}

// In memory data provider.
//
// Purpose
// - Exercise the fetch coordinator without an ERP connection, and back the development
//   binary with seeded data.
//
// Responsibilities
// - Serve seeded entity payloads and sold hours per (granularity, period).
// - Mimic the upstream cache flag: the first read of a period after seeding or after a
//   `force_refresh` reports `cached = false`, later reads `cached = true`.
// - Failure and latency knobs for tests: `toggle_offline`, `toggle_external_offline`,
//   `set_delay_ms`. Call counters.

use crate::modules::utilization::core::ports::{
    DataProvider, ExternalHours, ProviderError, RawEntityPayload, RawPayload,
};
use crate::shared::core::primitives::{Granularity, now_millis};
use anyhow::Context;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;

type PeriodSlot = (Granularity, String);

#[derive(Debug, Deserialize)]
pub struct SeedFile {
    pub periods: Vec<SeedPeriod>,
}

#[derive(Debug, Deserialize)]
pub struct SeedPeriod {
    pub granularity: Granularity,
    pub period: String,
    #[serde(default)]
    pub entities: Vec<RawEntityPayload>,
    #[serde(default)]
    pub external_hours: Option<ExternalHours>,
}

#[derive(Default)]
pub struct InMemoryDataProvider {
    payloads: RwLock<HashMap<PeriodSlot, Vec<RawEntityPayload>>>,
    external: RwLock<HashMap<PeriodSlot, ExternalHours>>,
    served: RwLock<HashSet<PeriodSlot>>,
    is_offline: AtomicBool,
    is_external_offline: AtomicBool,
    delay_ms: AtomicU64,
    snapshot_calls: AtomicUsize,
    refresh_calls: AtomicUsize,
}

impl InMemoryDataProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn from_seed(seed: SeedFile) -> Self {
        let provider = Self::new();
        for period in seed.periods {
            for entity in period.entities {
                provider
                    .seed_entity(period.granularity, &period.period, entity)
                    .await;
            }
            if let Some(hours) = period.external_hours {
                provider
                    .seed_external_hours(period.granularity, &period.period, hours)
                    .await;
            }
        }
        provider
    }

    pub async fn from_seed_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("reading seed file {}", path.display()))?;
        let seed: SeedFile = serde_json::from_str(&raw)
            .with_context(|| format!("parsing seed file {}", path.display()))?;
        Ok(Self::from_seed(seed).await)
    }

    /// Adds or replaces one entity's payload for a period.
    pub async fn seed_entity(
        &self,
        granularity: Granularity,
        period: &str,
        payload: RawEntityPayload,
    ) {
        let slot = (granularity, period.to_string());
        let mut guard = self.payloads.write().await;
        let entities = guard.entry(slot.clone()).or_default();
        let wanted = payload.entity.trim().to_lowercase();
        entities.retain(|e| e.entity.trim().to_lowercase() != wanted);
        entities.push(payload);
        self.served.write().await.remove(&slot);
    }

    pub async fn seed_external_hours(
        &self,
        granularity: Granularity,
        period: &str,
        hours: ExternalHours,
    ) {
        self.external
            .write()
            .await
            .insert((granularity, period.to_string()), hours);
    }

    pub fn toggle_offline(&self) {
        self.is_offline.fetch_xor(true, Ordering::SeqCst);
    }

    pub fn toggle_external_offline(&self) {
        self.is_external_offline.fetch_xor(true, Ordering::SeqCst);
    }

    pub fn set_delay_ms(&self, delay_ms: u64) {
        self.delay_ms.store(delay_ms, Ordering::SeqCst);
    }

    pub fn snapshot_calls(&self) -> usize {
        self.snapshot_calls.load(Ordering::SeqCst)
    }

    pub fn refresh_calls(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    async fn simulate_latency(&self) {
        let delay = self.delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
    }

    fn check_online(&self, flag: &AtomicBool, what: &str) -> Result<(), ProviderError> {
        if flag.load(Ordering::SeqCst) {
            return Err(ProviderError::Unavailable(format!("{what} offline")));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl DataProvider for InMemoryDataProvider {
    async fn fetch_snapshot(
        &self,
        entities: &[String],
        granularity: Granularity,
        period_value: &str,
    ) -> Result<RawPayload, ProviderError> {
        self.snapshot_calls.fetch_add(1, Ordering::SeqCst);
        // Latency is read at call time so a test can slow one request and not the next.
        self.simulate_latency().await;
        self.check_online(&self.is_offline, "data provider")?;

        let slot = (granularity, period_value.to_string());
        let wanted: HashSet<String> = entities.iter().map(|e| e.trim().to_lowercase()).collect();
        let selected: Vec<RawEntityPayload> = self
            .payloads
            .read()
            .await
            .get(&slot)
            .map(|all| {
                all.iter()
                    .filter(|e| wanted.contains(&e.entity.trim().to_lowercase()))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        let cached = !self.served.write().await.insert(slot);

        Ok(RawPayload {
            entities: selected,
            cached,
            source_timestamp: Some(now_millis()),
        })
    }

    async fn fetch_external_hours(
        &self,
        granularity: Granularity,
        period_value: &str,
    ) -> Result<ExternalHours, ProviderError> {
        self.check_online(&self.is_offline, "data provider")?;
        self.check_online(&self.is_external_offline, "external hours source")?;
        Ok(self
            .external
            .read()
            .await
            .get(&(granularity, period_value.to_string()))
            .cloned()
            .unwrap_or_default())
    }

    async fn force_refresh(
        &self,
        granularity: Granularity,
        period_value: &str,
    ) -> Result<(), ProviderError> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        self.check_online(&self.is_offline, "data provider")?;
        self.served
            .write()
            .await
            .remove(&(granularity, period_value.to_string()));
        Ok(())
    }
}

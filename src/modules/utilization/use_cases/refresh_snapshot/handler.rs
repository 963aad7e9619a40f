// Refresh Controller: explicit "refresh from source".
//
// Responsibilities
// - Ask the provider to drop its own upstream cache for the period, then force a
//   coordinator fetch. A failed upstream invalidation is logged and the fetch proceeds.
// - Report the outcome with whatever snapshot is authoritative afterwards: the new one on
//   success, the previous one (if any) on failure.

use crate::modules::utilization::core::ports::DataProvider;
use crate::modules::utilization::core::snapshot::Snapshot;
use crate::modules::utilization::use_cases::get_snapshot::handler::{FetchCoordinator, FetchError};
use crate::shared::core::primitives::{CacheKey, Granularity, PeriodKey};
use crate::shared::infrastructure::cache_store::CacheStore;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct RefreshOutcome {
    pub key: CacheKey,
    pub snapshot: Option<Arc<Snapshot>>,
    pub error: Option<FetchError>,
}

impl RefreshOutcome {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// Failed, but an older snapshot is still served.
    pub fn is_stale(&self) -> bool {
        self.error.is_some() && self.snapshot.is_some()
    }
}

pub struct RefreshController<TProvider, TCache>
where
    TProvider: DataProvider + 'static,
    TCache: CacheStore<Snapshot> + 'static,
{
    coordinator: FetchCoordinator<TProvider, TCache>,
}

impl<TProvider, TCache> RefreshController<TProvider, TCache>
where
    TProvider: DataProvider + 'static,
    TCache: CacheStore<Snapshot> + 'static,
{
    pub fn new(coordinator: FetchCoordinator<TProvider, TCache>) -> Self {
        Self { coordinator }
    }

    pub async fn refresh(&self, key: &CacheKey) -> RefreshOutcome {
        self.invalidate_upstream(key.granularity, &key.period_value)
            .await;
        refresh_key(&self.coordinator, key.clone()).await
    }

    /// Refreshes every entity of one period. The upstream cache is invalidated once.
    pub async fn refresh_all(
        &self,
        entities: &[String],
        period: &PeriodKey,
    ) -> Vec<RefreshOutcome> {
        self.invalidate_upstream(period.granularity, &period.value)
            .await;

        let mut outcomes: Vec<Option<RefreshOutcome>> = vec![None; entities.len()];
        let mut set = JoinSet::new();
        for (index, entity) in entities.iter().enumerate() {
            let coordinator = self.coordinator.clone();
            let key = CacheKey::new(entity.as_str(), period);
            set.spawn(async move {
                let result = refresh_key(&coordinator, key).await;
                (index, result)
            });
        }
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((index, outcome)) => outcomes[index] = Some(outcome),
                Err(error) => warn!(%error, "refresh task failed"),
            }
        }

        let mut results = Vec::with_capacity(entities.len());
        for (entity, outcome) in entities.iter().zip(outcomes) {
            let key = CacheKey::new(entity.as_str(), period);
            let outcome = match outcome {
                Some(outcome) => outcome,
                None => RefreshOutcome {
                    snapshot: self.coordinator.cached(&key).await,
                    key,
                    error: Some(FetchError::TaskAborted),
                },
            };
            results.push(outcome);
        }
        info!(
            period = %period,
            refreshed = results.iter().filter(|o| o.is_success()).count(),
            failed = results.iter().filter(|o| !o.is_success()).count(),
            "refresh all finished"
        );
        results
    }

    async fn invalidate_upstream(&self, granularity: Granularity, period_value: &str) {
        if let Err(error) = self
            .coordinator
            .provider()
            .force_refresh(granularity, period_value)
            .await
        {
            warn!(
                %granularity, period_value, %error,
                "upstream cache invalidation failed, fetching anyway"
            );
        }
    }
}

async fn refresh_key<TProvider, TCache>(
    coordinator: &FetchCoordinator<TProvider, TCache>,
    key: CacheKey,
) -> RefreshOutcome
where
    TProvider: DataProvider + 'static,
    TCache: CacheStore<Snapshot> + 'static,
{
    match coordinator.refresh(&key).await {
        Ok(snapshot) => RefreshOutcome {
            key,
            snapshot: Some(snapshot),
            error: None,
        },
        Err(error) => RefreshOutcome {
            snapshot: coordinator.cached(&key).await,
            key,
            error: Some(error),
        },
    }
}

#[cfg(test)]
mod refresh_controller_tests {
    use super::*;
    use crate::modules::utilization::adapters::outbound::data_provider_in_memory::InMemoryDataProvider;
    use crate::modules::utilization::core::pools::PoolCatalog;
    use crate::modules::utilization::core::ports::{
        ProviderError, RawEntityPayload, RawTimesheet,
    };
    use crate::shared::infrastructure::cache_store::in_memory::InMemoryCacheStore;
    use crate::tests::fixtures::provider::{creative_january, period, seeded_provider};
    use rstest::{fixture, rstest};

    type Controller = RefreshController<InMemoryDataProvider, InMemoryCacheStore<Snapshot>>;
    type Coordinator = FetchCoordinator<InMemoryDataProvider, InMemoryCacheStore<Snapshot>>;

    #[fixture]
    async fn before_each() -> (Controller, Coordinator, Arc<InMemoryDataProvider>) {
        let provider = Arc::new(seeded_provider().await);
        let coordinator = FetchCoordinator::new(
            provider.clone(),
            Arc::new(InMemoryCacheStore::new()),
            PoolCatalog::standard(),
        );
        (
            RefreshController::new(coordinator.clone()),
            coordinator,
            provider,
        )
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_invalidate_upstream_and_replace_the_snapshot(
        #[future] before_each: (Controller, Coordinator, Arc<InMemoryDataProvider>),
    ) {
        let (controller, coordinator, provider) = before_each.await;
        let key = creative_january();
        let before = coordinator.get_snapshot(&key).await.unwrap();
        assert_eq!(before.entity_metrics.logged_hours, 133.0);

        provider
            .seed_entity(
                Granularity::Monthly,
                "2025-01",
                RawEntityPayload {
                    entity: "Creative".to_string(),
                    timesheets: Some(vec![RawTimesheet {
                        name: Some("Sara Ali".to_string()),
                        total_hours: Some(42.0),
                        ..Default::default()
                    }]),
                    ..Default::default()
                },
            )
            .await;
        let outcome = controller.refresh(&key).await;

        assert!(outcome.is_success());
        let after = outcome.snapshot.unwrap();
        assert_eq!(after.entity_metrics.logged_hours, 42.0);
        assert!(!after.source_cached);
        assert_eq!(provider.refresh_calls(), 1);
        let cached = coordinator.cached(&key).await.unwrap();
        assert!(Arc::ptr_eq(&cached, &after));
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_surface_a_failure_and_keep_serving_the_stale_snapshot(
        #[future] before_each: (Controller, Coordinator, Arc<InMemoryDataProvider>),
    ) {
        let (controller, coordinator, provider) = before_each.await;
        let key = creative_january();
        let before = coordinator.get_snapshot(&key).await.unwrap();

        provider.toggle_offline();
        let failed = controller.refresh(&key).await;
        assert!(failed.is_stale());
        assert!(Arc::ptr_eq(failed.snapshot.as_ref().unwrap(), &before));
        assert_eq!(
            failed.error,
            Some(FetchError::Provider(ProviderError::Unavailable(
                "data provider offline".to_string()
            )))
        );

        provider.toggle_offline();
        let recovered = controller.refresh(&key).await;
        assert!(recovered.is_success());
        assert_ne!(recovered.snapshot.unwrap().fetch_id, before.fetch_id);
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_report_a_failed_refresh_without_any_snapshot(
        #[future] before_each: (Controller, Coordinator, Arc<InMemoryDataProvider>),
    ) {
        let (controller, _, provider) = before_each.await;
        provider.toggle_offline();

        let outcome = controller.refresh(&creative_january()).await;

        assert!(!outcome.is_success());
        assert!(!outcome.is_stale());
        assert!(outcome.snapshot.is_none());
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_refresh_every_entity_of_a_period(
        #[future] before_each: (Controller, Coordinator, Arc<InMemoryDataProvider>),
    ) {
        let (controller, _, provider) = before_each.await;
        let entities = vec![
            "Creative".to_string(),
            "Creative Strategy".to_string(),
            "Instructional Design".to_string(),
        ];

        let outcomes = controller
            .refresh_all(&entities, &period(Granularity::Monthly, "2025-01"))
            .await;

        assert_eq!(provider.refresh_calls(), 1);
        assert_eq!(outcomes.len(), 3);
        assert!(outcomes[0].is_success());
        assert!(outcomes[1].is_success());
        let missing = FetchError::EntityMissing("Instructional Design".to_string());
        assert_eq!(outcomes[2].error, Some(missing));
        assert_eq!(outcomes[2].key.entity, "Instructional Design");
    }
}

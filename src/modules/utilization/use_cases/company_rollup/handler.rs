// Company roll-up: every configured entity for one period, one metric set.
//
// Entities whose snapshot can not be obtained are reported and left out of the sums.

use crate::modules::utilization::core::metrics::DerivedMetricSet;
use crate::modules::utilization::core::pool_filter::{DatasetKind, PoolSelection};
use crate::modules::utilization::core::ports::DataProvider;
use crate::modules::utilization::core::rollup::{
    PoolContribution, company_rollup, pool_contributions,
};
use crate::modules::utilization::core::snapshot::Snapshot;
use crate::modules::utilization::use_cases::get_snapshot::handler::FetchCoordinator;
use crate::shared::core::primitives::PeriodKey;
use crate::shared::infrastructure::cache_store::CacheStore;
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityInclusion {
    pub entity: String,
    pub included: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompanyRollup {
    pub period_key: PeriodKey,
    pub selection: String,
    pub metrics: DerivedMetricSet,
    pub contributions: Vec<PoolContribution>,
    pub entities: Vec<EntityInclusion>,
}

pub struct CompanyRollupHandler<TProvider, TCache>
where
    TProvider: DataProvider + 'static,
    TCache: CacheStore<Snapshot> + 'static,
{
    coordinator: FetchCoordinator<TProvider, TCache>,
    entities: Vec<String>,
}

impl<TProvider, TCache> CompanyRollupHandler<TProvider, TCache>
where
    TProvider: DataProvider + 'static,
    TCache: CacheStore<Snapshot> + 'static,
{
    pub fn new(coordinator: FetchCoordinator<TProvider, TCache>, entities: Vec<String>) -> Self {
        Self {
            coordinator,
            entities,
        }
    }

    pub async fn handle(&self, period: &PeriodKey, pools: &[String]) -> CompanyRollup {
        let results = self.coordinator.get_snapshots(&self.entities, period).await;

        let mut snapshots: Vec<Arc<Snapshot>> = Vec::new();
        let mut entities = Vec::with_capacity(results.len());
        for (entity, result) in results {
            match result {
                Ok(snapshot) => {
                    snapshots.push(snapshot);
                    entities.push(EntityInclusion {
                        entity,
                        included: true,
                        error: None,
                    });
                }
                Err(error) => entities.push(EntityInclusion {
                    entity,
                    included: false,
                    error: Some(error.to_string()),
                }),
            }
        }

        CompanyRollup {
            period_key: period.clone(),
            selection: PoolSelection::from_pools(DatasetKind::Resources, pools).label(),
            metrics: company_rollup(&snapshots, pools),
            contributions: pool_contributions(&snapshots, &[]),
            entities,
        }
    }
}

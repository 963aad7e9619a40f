use crate::modules::utilization::adapters::outbound::data_provider_in_memory::InMemoryDataProvider;
use crate::modules::utilization::core::pools::PoolCatalog;
use crate::modules::utilization::core::snapshot::Snapshot;
use crate::modules::utilization::use_cases::company_rollup::handler::CompanyRollupHandler;
use crate::modules::utilization::use_cases::get_snapshot::handler::FetchCoordinator;
use crate::modules::utilization::use_cases::refresh_snapshot::handler::RefreshController;
use crate::shared::core::periods::PeriodCatalog;
use crate::shared::infrastructure::cache_store::in_memory::InMemoryCacheStore;
use std::sync::Arc;

pub type SnapshotCache = InMemoryCacheStore<Snapshot>;
pub type Coordinator = FetchCoordinator<InMemoryDataProvider, SnapshotCache>;

#[derive(Clone)]
pub struct AppState {
    pub periods: Arc<PeriodCatalog>,
    pub entities: Arc<Vec<String>>,
    pub coordinator: Coordinator,
    pub refresh_controller: Arc<RefreshController<InMemoryDataProvider, SnapshotCache>>,
    pub company_rollup: Arc<CompanyRollupHandler<InMemoryDataProvider, SnapshotCache>>,
}

impl AppState {
    pub fn new(
        provider: Arc<InMemoryDataProvider>,
        periods: PeriodCatalog,
        entities: Vec<String>,
        pools: PoolCatalog,
    ) -> Self {
        let cache = Arc::new(SnapshotCache::new());
        let coordinator = FetchCoordinator::new(provider, cache, pools);
        Self {
            periods: Arc::new(periods),
            refresh_controller: Arc::new(RefreshController::new(coordinator.clone())),
            company_rollup: Arc::new(CompanyRollupHandler::new(
                coordinator.clone(),
                entities.clone(),
            )),
            entities: Arc::new(entities),
            coordinator,
        }
    }
}

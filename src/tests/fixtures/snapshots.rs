// Snapshot builder for tests that do not need the fetch path.

use crate::modules::utilization::core::ingest::EntityDatasets;
use crate::modules::utilization::core::ports::ExternalHours;
use crate::modules::utilization::core::snapshot::{Snapshot, SnapshotSource};
use crate::shared::core::primitives::{Granularity, PeriodKey};
use std::sync::Arc;
use uuid::Uuid;

pub struct SnapshotBuilder {
    source: SnapshotSource,
}

impl SnapshotBuilder {
    pub fn new(entity: &str) -> Self {
        Self {
            source: SnapshotSource {
                entity: entity.to_string(),
                period_key: PeriodKey {
                    granularity: Granularity::Monthly,
                    value: "2025-01".to_string(),
                },
                datasets: EntityDatasets::default(),
                external_hours: None,
                pools: vec![],
                source_cached: false,
                source_timestamp: None,
            },
        }
    }

    pub fn period(mut self, granularity: Granularity, value: &str) -> Self {
        self.source.period_key = PeriodKey {
            granularity,
            value: value.to_string(),
        };
        self
    }

    pub fn pools(mut self, pools: &[&str]) -> Self {
        self.source.pools = pools.iter().map(|p| p.to_string()).collect();
        self
    }

    pub fn datasets(mut self, datasets: EntityDatasets) -> Self {
        self.source.datasets = datasets;
        self
    }

    pub fn external(mut self, hours: &[(&str, f64)]) -> Self {
        let map: ExternalHours = hours.iter().map(|(p, h)| (p.to_string(), *h)).collect();
        self.source.external_hours = Some(map);
        self
    }

    pub fn build(self) -> Arc<Snapshot> {
        let snapshot = Snapshot::build(self.source, Uuid::now_v7(), 1_700_000_000_000);
        Arc::new(snapshot)
    }
}

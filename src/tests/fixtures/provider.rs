// Seeded provider and key builders shared by use case and HTTP tests.

use crate::modules::utilization::adapters::outbound::data_provider_in_memory::InMemoryDataProvider;
use crate::shared::core::primitives::{CacheKey, Granularity, PeriodKey};

pub const SEED_PATH: &str = "./src/tests/fixtures/json/seed.json";

pub async fn seeded_provider() -> InMemoryDataProvider {
    InMemoryDataProvider::from_seed_file(SEED_PATH)
        .await
        .expect("seed fixture should load")
}

pub fn period(granularity: Granularity, value: &str) -> PeriodKey {
    PeriodKey {
        granularity,
        value: value.to_string(),
    }
}

pub fn key(entity: &str, granularity: Granularity, value: &str) -> CacheKey {
    CacheKey::new(entity, &period(granularity, value))
}

pub fn creative_january() -> CacheKey {
    key("Creative", Granularity::Monthly, "2025-01")
}

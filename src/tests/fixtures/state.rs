// AppState wired to the seeded in-memory provider, for inbound HTTP tests.

use crate::modules::utilization::adapters::outbound::data_provider_in_memory::InMemoryDataProvider;
use crate::modules::utilization::core::pools::PoolCatalog;
use crate::shared::core::periods::PeriodCatalog;
use crate::shell::state::AppState;
use crate::tests::fixtures::provider::seeded_provider;
use std::sync::Arc;

pub async fn make_test_state() -> (AppState, Arc<InMemoryDataProvider>) {
    let provider = Arc::new(seeded_provider().await);
    let state = AppState::new(
        provider.clone(),
        PeriodCatalog::new(2025).expect("2025 is a valid reporting year"),
        vec![
            "Creative".to_string(),
            "Creative Strategy".to_string(),
            "Instructional Design".to_string(),
        ],
        PoolCatalog::standard(),
    );
    (state, provider)
}

pub async fn body_json(response: axum::response::Response) -> serde_json::Value {
    use http_body_util::BodyExt;
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{EnvFilter, fmt};

use resource_utilization::modules::utilization::adapters::outbound::data_provider_in_memory::InMemoryDataProvider;
use resource_utilization::shared::core::periods::PeriodCatalog;
use resource_utilization::shell::config::AppConfig;
use resource_utilization::shell::http::router;
use resource_utilization::shell::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let config = AppConfig::from_env();

    // In-memory provider for now
    let provider = match &config.seed_file {
        Some(path) => InMemoryDataProvider::from_seed_file(path).await?,
        None => InMemoryDataProvider::new(),
    };
    provider.set_delay_ms(config.provider_delay_ms);

    let periods = PeriodCatalog::new(config.reporting_year)?;
    let state = AppState::new(
        Arc::new(provider),
        periods,
        config.entities.clone(),
        config.pools.clone(),
    );

    let listener = TcpListener::bind(config.bind).await?;
    tracing::info!(
        bind = %config.bind,
        year = config.reporting_year,
        entities = config.entities.len(),
        "utilization endpoint listening"
    );
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::error!(%error, "failed to listen for the shutdown signal");
    }
    tracing::info!("shutting down");
}

//! IVMA Store - multi-vendor storefront backend

use anyhow::Result;
use std::sync::Arc;
use tracing::warn;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ivma_store::{api, config::Config, publisher::EventPublisher, repository::PgRepository};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry().with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into())).with(tracing_subscriber::fmt::layer()).init();

    let config = Config::from_env()?;
    let repo = PgRepository::connect(&config.database_url, config.db_max_connections).await?;
    repo.migrate().await?;

    let nats = match config.nats_url.as_deref() {
        Some(url) => match async_nats::connect(url).await {
            Ok(client) => Some(client),
            Err(e) => { warn!(error = %e, "NATS unavailable, events will not be published"); None }
        },
        None => None,
    };

    let state = api::AppState::from_config(Arc::new(repo), &config, EventPublisher::new(nats));
    let app = api::router(state);

    tracing::info!("🚀 IVMA Store listening on 0.0.0.0:{}", config.port);
    axum::serve(tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port)).await?, app).await?;
    Ok(())
}

//! Herambha Storefront API server

use anyhow::Result;
use secrecy::ExposeSecret;
use sqlx::postgres::PgPoolOptions;

use herambha_storefront::api::{self, AppState};
use herambha_storefront::config::AppConfig;
use herambha_storefront::events::EventPublisher;
use herambha_storefront::store::{MemoryStore, PgStore};
use herambha_storefront::{seed, telemetry};

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::from_env()?;
    telemetry::init_tracing();

    let events = EventPublisher::connect(config.nats_url.as_deref()).await;
    let addr = config.socket_addr();
    let seed_catalog = config.seed_catalog;

    let state = match config.database_url.clone() {
        Some(url) => {
            let db = PgPoolOptions::new().max_connections(10).connect(url.expose_secret()).await?;
            let store = PgStore::new(db);
            store.migrate().await?;
            AppState::new(store, events, config)
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using in-memory store");
            AppState::new(MemoryStore::new(), events, config)
        }
    };

    if seed_catalog {
        let added = seed::seed_if_empty(state.catalog.as_ref()).await?;
        tracing::info!(added, "catalog seeded");
    }

    let app = api::router(state);
    tracing::info!("🚀 Herambha Storefront listening on {}", addr);
    axum::serve(tokio::net::TcpListener::bind(addr).await?, app).await?;
    Ok(())
}

//! Areca Market - marketplace state service

use std::sync::Arc;
use anyhow::{Context, Result};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use areca_market::events::EventPublisher;
use areca_market::storage::{KeyValueStore, MemoryStore, PgStore};
use areca_market::{api, Config, Marketplace};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().context("Failed to load configuration")?;

    let store: Arc<dyn KeyValueStore> = match &config.database_url {
        Some(url) => {
            let pg = PgStore::connect(url, config.database_max_connections).await.context("Failed to connect to database")?;
            pg.migrate().await.context("Failed to run migrations")?;
            Arc::new(pg)
        }
        None => {
            tracing::warn!("DATABASE_URL not set, state is kept in memory");
            Arc::new(MemoryStore::new())
        }
    };

    let events = match &config.nats_url {
        Some(url) => match EventPublisher::connect(url, config.event_subject_prefix.clone()).await {
            Ok(publisher) => publisher,
            Err(e) => {
                tracing::warn!(error = %e, "NATS unavailable, events are only logged");
                EventPublisher::disabled()
            }
        },
        None => EventPublisher::disabled(),
    };

    let marketplace = Marketplace::from_config(store, &config, events);
    let app = api::router(marketplace).layer(TraceLayer::new_for_http()).layer(CorsLayer::permissive());

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await.with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!("Areca Market listening on {}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}

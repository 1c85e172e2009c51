//! Kicklab Storefront - storefront backend service

use anyhow::Result;
use kicklab_storefront::api::{router, AppState, SERVICE_NAME};
use kicklab_storefront::publisher::EventPublisher;
use kicklab_storefront::{Config, Store};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry().with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into())).with(tracing_subscriber::fmt::layer()).init();

    let config = Config::from_env()?;
    if config.admin_password.is_none() {
        tracing::warn!("ADMIN_PASSWORD not set, admin login is disabled");
    }
    let store = Store::connect(&config).await?;
    let events = EventPublisher::connect(config.nats_url.as_deref()).await;
    let port = config.port;
    let state = AppState { store, events, config: Arc::new(config) };

    tracing::info!("{} listening on 0.0.0.0:{}", SERVICE_NAME, port);
    axum::serve(tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?, router(state)).await?;
    Ok(())
}

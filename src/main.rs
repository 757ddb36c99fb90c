use anyhow::Context;
use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::info;

use shopcart_rs::{
    config::StorageBackend,
    handlers::create_app,
    init_observability,
    observability::{Metrics, TracingSettings},
    repositories::{CartRepository, FileCartRepository, InMemoryCartRepository},
    services::{HttpInventoryClient, TracingNotifier},
    shutdown_observability, CartStore, Config,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_environment()?;

    init_observability(&TracingSettings {
        service_name: &config.observability.service_name,
        service_version: &config.observability.service_version,
        otlp_endpoint: config.observability.otlp_endpoint.as_deref(),
        log_level: &config.observability.log_level,
        enable_json_logging: config.observability.enable_json_logging,
    })?;

    info!(
        "Starting {} v{}",
        config.observability.service_name, config.observability.service_version
    );

    let metrics = Arc::new(Metrics::new()?);

    let inventory = Arc::new(
        HttpInventoryClient::new(
            config.inventory_api.api_base_url.clone(),
            config.inventory_api.timeout(),
        )?
        .with_metrics(metrics.clone()),
    );
    info!("Inventory API: {}", inventory.base_url());

    let repository: Arc<dyn CartRepository> = match config.storage.storage_backend {
        StorageBackend::File => {
            info!(
                "Cart snapshots stored in {} under key {}",
                config.storage.storage_directory.display(),
                config.storage.storage_key
            );
            Arc::new(FileCartRepository::new(
                config.storage.storage_directory.clone(),
                config.storage.storage_key.clone(),
            ))
        }
        StorageBackend::Memory => {
            info!("Cart snapshots kept in memory only");
            Arc::new(InMemoryCartRepository::new())
        }
    };

    let store = CartStore::open(
        inventory.clone(),
        inventory,
        repository,
        Arc::new(TracingNotifier),
    )
    .await
    .context("Failed to restore cart snapshot")?
    .with_metrics(metrics.clone());

    let app = create_app(
        Arc::new(store),
        metrics,
        config.server.request_timeout(),
    );

    let addr: SocketAddr = config
        .server
        .bind_address()
        .parse()
        .with_context(|| format!("Invalid bind address {}", config.server.bind_address()))?;
    let listener = TcpListener::bind(addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    shutdown_observability().await;
    info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => {
            tracing::error!("Failed to listen for shutdown signal: {}", e);
            std::future::pending::<()>().await
        }
    }
}

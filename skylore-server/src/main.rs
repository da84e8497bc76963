mod config;
mod logging;
mod server;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

use config::ServerConfig;
use skylore_core::catalog::{CatalogueManager, start_catalogue_updater};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = ServerConfig::load_or_default("config.toml");

    // Initialize logging
    let _logging_guard = logging::init_logging(&config.log_dir, "skylore-server", &config.log_level);

    info!("Skylore backend starting...");
    info!("Server will listen on {}", config.server_address());

    // Catalogue manager: load the disk snapshot so a restart inside the
    // cache TTL serves without any network work.
    let manager = Arc::new(CatalogueManager::new(&config.cache_dir, config.harvest_config())?);
    manager.initialize().await?;
    info!("Catalogue manager initialized");

    // Optional background refresh keeps the cache warm ahead of its TTL.
    if config.catalog.refresh_interval_hours > 0 {
        let _refresh_task = start_catalogue_updater(
            manager.clone(),
            config.catalog.refresh_interval_hours,
            config.catalog.refresh_on_startup,
        )
        .await;
        info!(
            "Catalogue refresh scheduled every {} hours",
            config.catalog.refresh_interval_hours
        );
    } else if config.catalog.refresh_on_startup {
        // One warm-up harvest in the background; requests meanwhile get
        // whatever is cached (possibly nothing yet).
        let warm = manager.clone();
        tokio::spawn(async move {
            let count = warm.catalogue().await.len();
            info!("Startup harvest finished with {} entries", count);
        });
    }

    let app = server::build_router(server::AppState { manager });

    let addr: SocketAddr = config.server_address().parse()?;
    info!("HTTP server starting on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

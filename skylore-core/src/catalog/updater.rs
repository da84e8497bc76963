///! Catalogue updater - scheduled refresh task
///!
///! Optional background loop that re-harvests the catalogue ahead of the
///! cache TTL, so steady-state requests never pay harvest latency.

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

use super::manager::CatalogueManager;

const MAX_RETRIES: u32 = 3;
const RETRY_DELAY_SECONDS: u64 = 60;
const REFRESH_TIMEOUT_SECONDS: u64 = 600;

/// Periodic catalogue refresher.
pub struct CatalogueUpdater {
    manager: Arc<CatalogueManager>,
    refresh_interval: Duration,
}

impl CatalogueUpdater {
    pub fn new(manager: Arc<CatalogueManager>, refresh_interval_hours: u64) -> Self {
        Self {
            manager,
            refresh_interval: Duration::from_secs(refresh_interval_hours.max(1) * 3600),
        }
    }

    /// Refresh once now, then keep refreshing on the interval.
    /// Returns a JoinHandle for the background task.
    pub async fn start_with_initial_refresh(self) -> JoinHandle<()> {
        tracing::info!("Starting catalogue updater (initial refresh + schedule)");

        self.run_refresh_cycle().await;

        tokio::spawn(async move {
            self.run_scheduled_loop().await;
        })
    }

    /// Start the loop without an immediate refresh.
    pub async fn start(self) -> JoinHandle<()> {
        tracing::info!("Starting catalogue updater (scheduled only)");

        tokio::spawn(async move {
            self.run_scheduled_loop().await;
        })
    }

    async fn run_scheduled_loop(&self) {
        loop {
            tracing::info!(
                "Next catalogue refresh in {:.1} hours",
                self.refresh_interval.as_secs_f64() / 3600.0
            );
            tokio::time::sleep(self.refresh_interval).await;

            self.run_refresh_cycle().await;
        }
    }

    /// One refresh with retries; a cycle that keeps failing is logged and
    /// abandoned until the next interval.
    async fn run_refresh_cycle(&self) {
        for attempt in 1..=MAX_RETRIES {
            tracing::info!("Starting catalogue refresh (attempt {}/{})", attempt, MAX_RETRIES);

            let result = tokio::time::timeout(
                Duration::from_secs(REFRESH_TIMEOUT_SECONDS),
                self.manager.refresh(),
            )
            .await;

            match result {
                Ok(Ok(count)) => {
                    tracing::info!("Catalogue refresh completed: {} entries", count);
                    break;
                }
                Ok(Err(e)) => {
                    tracing::error!(
                        "Catalogue refresh failed (attempt {}/{}): {}",
                        attempt,
                        MAX_RETRIES,
                        e
                    );
                }
                Err(_) => {
                    tracing::error!(
                        "Catalogue refresh timed out after {}s (attempt {}/{})",
                        REFRESH_TIMEOUT_SECONDS,
                        attempt,
                        MAX_RETRIES
                    );
                }
            }

            if attempt < MAX_RETRIES {
                let delay = Duration::from_secs(RETRY_DELAY_SECONDS * attempt as u64);
                tracing::info!("Retrying in {:?}...", delay);
                tokio::time::sleep(delay).await;
            } else {
                tracing::error!(
                    "Catalogue refresh failed after {} attempts, waiting for next interval",
                    MAX_RETRIES
                );
            }
        }
    }
}

/// Helper to create and start the updater.
pub async fn start_catalogue_updater(
    manager: Arc<CatalogueManager>,
    refresh_interval_hours: u64,
    initial_refresh: bool,
) -> JoinHandle<()> {
    let updater = CatalogueUpdater::new(manager, refresh_interval_hours);

    if initial_refresh {
        updater.start_with_initial_refresh().await
    } else {
        updater.start().await
    }
}

///! Catalogue manager
///!
///! Drives the whole harvest: listing from the primary source (backup when
///! the primary yields nothing), detail fetch+parse in fixed-size batches
///! with a pause between them, assembly, and TTL caching in memory and on
///! disk. A failed entry is dropped, a failed source is skipped, and a
///! fully failed harvest degrades to an empty catalogue, never an error.

use anyhow::Result;
use chrono::Duration;
use futures::future::join_all;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration as StdDuration;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::builder::build_entry;
use super::cache::{Clock, SnapshotStore, SystemClock, TtlCache};
use super::fetcher::{HttpFetcher, PageFetcher};
use super::parser::parse_detail;
use super::sources::{CatalogSource, ListedConstellation, extract_listing};
use super::types::CatalogueEntry;
use crate::error::HarvestError;

/// The full aggregated catalogue lives under a single cache key.
const CATALOGUE_KEY: &str = "catalogue";

/// Harvest tuning; defaults match the upstream sites' tolerance.
#[derive(Debug, Clone)]
pub struct HarvestConfig {
    /// Listing links processed together with bounded parallelism.
    pub batch_size: usize,
    /// Pause between batches, so the scraped host is not hammered.
    pub batch_delay_ms: u64,
    pub request_timeout_secs: u64,
    pub max_retries: u32,
    pub catalogue_ttl_days: i64,
    pub record_ttl_hours: i64,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            batch_size: 10,
            batch_delay_ms: 300,
            request_timeout_secs: 15,
            max_retries: 3,
            catalogue_ttl_days: 30,
            record_ttl_hours: 24,
        }
    }
}

/// Owns the fetcher, both TTL caches, and the disk snapshot.
///
/// Concurrency discipline: readers take the cache read lock and see the
/// previously stored value or miss through; a harvesting request holds
/// the write lock only while storing its result. Readers never block for
/// the duration of a harvest.
pub struct CatalogueManager {
    fetcher: Arc<dyn PageFetcher>,
    clock: Arc<dyn Clock>,
    snapshot: SnapshotStore,
    config: HarvestConfig,
    catalogue_cache: RwLock<TtlCache<Vec<CatalogueEntry>>>,
    record_cache: RwLock<TtlCache<CatalogueEntry>>,
}

impl CatalogueManager {
    pub fn new<P: AsRef<Path>>(cache_dir: P, config: HarvestConfig) -> Result<Self> {
        let fetcher = HttpFetcher::with_config(
            config.request_timeout_secs,
            config.max_retries,
            500,
        )?;
        Ok(Self::with_fetcher(
            Arc::new(fetcher),
            Arc::new(SystemClock),
            cache_dir,
            config,
        ))
    }

    /// Full dependency injection; the seam the tests drive scripted
    /// fetchers and manual clocks through.
    pub fn with_fetcher<P: AsRef<Path>>(
        fetcher: Arc<dyn PageFetcher>,
        clock: Arc<dyn Clock>,
        cache_dir: P,
        config: HarvestConfig,
    ) -> Self {
        let catalogue_ttl = Duration::days(config.catalogue_ttl_days.max(1));
        let record_ttl = Duration::hours(config.record_ttl_hours.max(1));
        Self {
            snapshot: SnapshotStore::new(cache_dir),
            catalogue_cache: RwLock::new(TtlCache::new(catalogue_ttl, clock.clone())),
            record_cache: RwLock::new(TtlCache::new(record_ttl, clock.clone())),
            fetcher,
            clock,
            config,
        }
    }

    /// Load a still-valid disk snapshot into the in-memory caches, so a
    /// restart inside the TTL serves immediately without network work.
    pub async fn initialize(&self) -> Result<()> {
        info!("Initializing catalogue manager...");

        let ttl = Duration::days(self.config.catalogue_ttl_days.max(1));
        match self
            .snapshot
            .load::<Vec<CatalogueEntry>>(ttl, self.clock.now())
            .await
        {
            Ok(Some((entries, stored_at))) => {
                info!("Loaded {} catalogue entries from snapshot", entries.len());
                self.seed_record_cache(&entries).await;
                self.catalogue_cache
                    .write()
                    .await
                    .put_stamped(CATALOGUE_KEY, entries, stored_at);
            }
            Ok(None) => {
                info!("No usable catalogue snapshot, first request will harvest");
            }
            Err(e) => {
                warn!("Failed to load catalogue snapshot: {}", e);
            }
        }

        Ok(())
    }

    /// The full catalogue: cached when fresh, harvested otherwise. An
    /// empty vec means every source failed; it is not cached, so the next
    /// request tries again.
    pub async fn catalogue(&self) -> Vec<CatalogueEntry> {
        if let Some(entries) = self.catalogue_cache.read().await.get(CATALOGUE_KEY) {
            debug!("Serving catalogue from cache ({} entries)", entries.len());
            return entries;
        }

        let entries = self.harvest_catalogue().await;
        if !entries.is_empty() {
            self.store_catalogue(&entries).await;
        }
        entries
    }

    /// One constellation by slug, through the short-TTL record cache.
    pub async fn constellation(&self, id: &str) -> Option<CatalogueEntry> {
        if let Some(entry) = self.record_cache.read().await.get(id) {
            return Some(entry);
        }

        let entry = self.catalogue().await.into_iter().find(|e| e.id == id)?;
        self.record_cache.write().await.put(id, entry.clone());
        Some(entry)
    }

    /// Unconditional re-harvest, used by the background refresh task.
    /// Unlike [`catalogue`](Self::catalogue), an empty result is an error
    /// here so the updater's retry loop can kick in.
    pub async fn refresh(&self) -> Result<usize> {
        let entries = self.harvest_catalogue().await;
        if entries.is_empty() {
            anyhow::bail!("no catalogue source yielded any entries");
        }

        let count = entries.len();
        self.store_catalogue(&entries).await;
        Ok(count)
    }

    async fn store_catalogue(&self, entries: &[CatalogueEntry]) {
        self.seed_record_cache(entries).await;
        self.catalogue_cache
            .write()
            .await
            .put(CATALOGUE_KEY, entries.to_vec());

        if let Err(e) = self.snapshot.save(&entries, self.clock.now()).await {
            warn!("Failed to persist catalogue snapshot: {}", e);
        }
    }

    async fn seed_record_cache(&self, entries: &[CatalogueEntry]) {
        let mut cache = self.record_cache.write().await;
        for entry in entries {
            cache.put(&entry.id, entry.clone());
        }
    }

    /// Listing from the primary source, backup when the primary is down
    /// or yields zero links; then batches over the chosen listing. Both
    /// sources exhausted means an empty catalogue.
    async fn harvest_catalogue(&self) -> Vec<CatalogueEntry> {
        for source in [CatalogSource::Primary, CatalogSource::Backup] {
            let listing_url = source.listing_url();
            let body = match self.fetcher.fetch_page(listing_url).await {
                Ok(body) => body,
                Err(HarvestError::Unavailable { .. }) => {
                    warn!("{} listing unavailable: {}", source.label(), listing_url);
                    continue;
                }
            };

            let links = extract_listing(&body, source);
            if links.is_empty() {
                warn!(
                    "{} listing produced no links, trying next source",
                    source.label()
                );
                continue;
            }

            info!(
                "Harvesting {} constellations from {} source",
                links.len(),
                source.label()
            );
            let entries = self.harvest_batches(&links, source).await;
            if !entries.is_empty() {
                info!(
                    "Harvest complete: {} of {} entries from {} source",
                    entries.len(),
                    links.len(),
                    source.label()
                );
                return entries;
            }
            warn!("Every detail fetch from the {} source failed", source.label());
        }

        warn!("All catalogue sources exhausted, returning empty catalogue");
        Vec::new()
    }

    async fn harvest_batches(
        &self,
        links: &[ListedConstellation],
        source: CatalogSource,
    ) -> Vec<CatalogueEntry> {
        let mut entries = Vec::with_capacity(links.len());

        for (index, batch) in links.chunks(self.config.batch_size.max(1)).enumerate() {
            if index > 0 && self.config.batch_delay_ms > 0 {
                tokio::time::sleep(StdDuration::from_millis(self.config.batch_delay_ms)).await;
            }

            // One concurrent fetch+parse per link; join_all keeps results
            // in listing order regardless of completion order.
            let results = join_all(batch.iter().map(|link| self.harvest_entry(link, source))).await;
            for result in results {
                match result {
                    Ok(entry) => entries.push(entry),
                    Err(HarvestError::Unavailable { url, attempts }) => {
                        warn!("Dropping entry after {} attempts: {}", attempts, url);
                    }
                }
            }
        }

        entries
    }

    async fn harvest_entry(
        &self,
        link: &ListedConstellation,
        source: CatalogSource,
    ) -> Result<CatalogueEntry, HarvestError> {
        let body = self.fetcher.fetch_page(&link.url).await?;
        let parsed = parse_detail(&body, &link.name, source);
        Ok(build_entry(&link.name, parsed))
    }
}

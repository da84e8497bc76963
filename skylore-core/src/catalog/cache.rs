///! TTL-bounded result caching
///!
///! `TtlCache` memoizes expensive harvest results in memory; entries
///! expire on read once `now - stored_at` passes the TTL. The clock is
///! injected so tests can simulate expiry without waiting. `SnapshotStore`
///! persists the full catalogue as pretty-printed JSON so a process
///! restart inside the TTL does not trigger a re-harvest.

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tracing::{debug, info};

const SNAPSHOT_FILE: &str = "catalogue_cache.json";

/// Time source for TTL checks.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Production clock.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// One cached value plus its storage timestamp.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry<T> {
    pub value: T,
    pub stored_at: DateTime<Utc>,
}

/// String-keyed store; a value is served only while younger than the TTL.
/// Expired entries are dropped on the read that notices them and silently
/// replaced by the next `put`; there is no other invalidation path.
pub struct TtlCache<T> {
    entries: HashMap<String, CacheEntry<T>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl<T: Clone> TtlCache<T> {
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: HashMap::new(),
            ttl,
            clock,
        }
    }

    pub fn get(&self, key: &str) -> Option<T> {
        let entry = self.entries.get(key)?;
        if self.clock.now() - entry.stored_at < self.ttl {
            Some(entry.value.clone())
        } else {
            debug!("Cache entry '{}' expired", key);
            None
        }
    }

    pub fn put(&mut self, key: &str, value: T) {
        let stored_at = self.clock.now();
        self.put_stamped(key, value, stored_at);
    }

    /// Insert with an explicit timestamp; used when rehydrating from a
    /// disk snapshot so the original TTL window keeps counting.
    pub fn put_stamped(&mut self, key: &str, value: T, stored_at: DateTime<Utc>) {
        self.entries.insert(key.to_string(), CacheEntry { value, stored_at });
    }
}

/// Disk persistence for the aggregated catalogue.
pub struct SnapshotStore {
    cache_dir: PathBuf,
}

impl SnapshotStore {
    pub fn new<P: AsRef<Path>>(cache_dir: P) -> Self {
        Self {
            cache_dir: cache_dir.as_ref().to_path_buf(),
        }
    }

    fn snapshot_path(&self) -> PathBuf {
        self.cache_dir.join(SNAPSHOT_FILE)
    }

    /// Load the snapshot if present and still younger than `ttl`.
    /// Returns the value together with its original storage time.
    pub async fn load<T: DeserializeOwned>(
        &self,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> Result<Option<(T, DateTime<Utc>)>> {
        let path = self.snapshot_path();
        if !path.exists() {
            debug!("Snapshot file does not exist: {:?}", path);
            return Ok(None);
        }

        let content = fs::read_to_string(&path)
            .await
            .context("Failed to read catalogue snapshot")?;
        let entry: CacheEntry<T> =
            serde_json::from_str(&content).context("Failed to parse catalogue snapshot")?;

        if now - entry.stored_at >= ttl {
            info!("Catalogue snapshot expired (stored at {})", entry.stored_at);
            return Ok(None);
        }

        Ok(Some((entry.value, entry.stored_at)))
    }

    pub async fn save<T: Serialize>(&self, value: &T, stored_at: DateTime<Utc>) -> Result<()> {
        if !self.cache_dir.exists() {
            fs::create_dir_all(&self.cache_dir)
                .await
                .context("Failed to create cache directory")?;
            info!("Created cache directory: {:?}", self.cache_dir);
        }

        let entry = CacheEntry {
            value,
            stored_at,
        };
        let content =
            serde_json::to_string_pretty(&entry).context("Failed to serialize catalogue snapshot")?;

        fs::write(self.snapshot_path(), content)
            .await
            .context("Failed to write catalogue snapshot")?;

        debug!("Saved catalogue snapshot to {:?}", self.snapshot_path());
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::ManualClock;
    use super::*;

    #[test]
    fn test_cache_hit_within_ttl() {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let mut cache = TtlCache::new(Duration::hours(24), clock.clone());

        cache.put("catalogue", vec!["lyra".to_string()]);
        clock.advance(Duration::hours(23));
        assert_eq!(cache.get("catalogue"), Some(vec!["lyra".to_string()]));
    }

    #[test]
    fn test_cache_expires_after_ttl() {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let mut cache = TtlCache::new(Duration::hours(24), clock.clone());

        cache.put("catalogue", 1u32);
        clock.advance(Duration::hours(25));
        assert_eq!(cache.get("catalogue"), None);

        // A fresh put silently replaces the expired entry.
        cache.put("catalogue", 2u32);
        assert_eq!(cache.get("catalogue"), Some(2));
    }

    #[test]
    fn test_cache_miss_on_unknown_key() {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let cache: TtlCache<u32> = TtlCache::new(Duration::hours(1), clock);
        assert_eq!(cache.get("nope"), None);
    }

    #[tokio::test]
    async fn test_snapshot_roundtrip() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let store = SnapshotStore::new(temp_dir.path());
        let now = Utc::now();

        store.save(&vec!["orion".to_string()], now).await.unwrap();
        let loaded: Option<(Vec<String>, _)> =
            store.load(Duration::days(30), now).await.unwrap();
        let (value, stored_at) = loaded.unwrap();
        assert_eq!(value, vec!["orion".to_string()]);
        assert_eq!(stored_at, now);
    }

    #[tokio::test]
    async fn test_snapshot_expired_not_loaded() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let store = SnapshotStore::new(temp_dir.path());
        let stored = Utc::now();

        store.save(&vec![1u32], stored).await.unwrap();
        let later = stored + Duration::days(31);
        let loaded: Option<(Vec<u32>, _)> = store.load(Duration::days(30), later).await.unwrap();
        assert!(loaded.is_none());
    }

    #[tokio::test]
    async fn test_snapshot_missing_file() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let store = SnapshotStore::new(temp_dir.path());
        let loaded: Option<(Vec<u32>, _)> =
            store.load(Duration::days(30), Utc::now()).await.unwrap();
        assert!(loaded.is_none());
    }
}

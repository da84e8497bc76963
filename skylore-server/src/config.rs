use serde::{Deserialize, Serialize};
use skylore_core::catalog::HarvestConfig;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default = "default_log_dir")]
    pub log_dir: String,

    /// Directory for the catalogue snapshot.
    #[serde(default = "default_cache_dir")]
    pub cache_dir: String,

    #[serde(default)]
    pub catalog: CatalogConfig,
}

/// Harvest tuning, all optional in the TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    #[serde(default = "default_batch_delay_ms")]
    pub batch_delay_ms: u64,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_catalogue_ttl_days")]
    pub catalogue_ttl_days: i64,

    #[serde(default = "default_record_ttl_hours")]
    pub record_ttl_hours: i64,

    /// 0 disables the background refresh task.
    #[serde(default)]
    pub refresh_interval_hours: u64,

    /// Harvest once at startup instead of on the first request.
    #[serde(default)]
    pub refresh_on_startup: bool,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_dir() -> String {
    "logs".to_string()
}

fn default_cache_dir() -> String {
    "data".to_string()
}

fn default_batch_size() -> usize {
    10
}

fn default_batch_delay_ms() -> u64 {
    300
}

fn default_request_timeout_secs() -> u64 {
    15
}

fn default_max_retries() -> u32 {
    3
}

fn default_catalogue_ttl_days() -> i64 {
    30
}

fn default_record_ttl_hours() -> i64 {
    24
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
            log_dir: default_log_dir(),
            cache_dir: default_cache_dir(),
            catalog: CatalogConfig::default(),
        }
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            batch_delay_ms: default_batch_delay_ms(),
            request_timeout_secs: default_request_timeout_secs(),
            max_retries: default_max_retries(),
            catalogue_ttl_days: default_catalogue_ttl_days(),
            record_ttl_hours: default_record_ttl_hours(),
            refresh_interval_hours: 0,
            refresh_on_startup: false,
        }
    }
}

impl ServerConfig {
    /// Load from a TOML file; a missing or unreadable file falls back to
    /// full defaults so the service can always start.
    pub fn load_or_default(path: &str) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(config) => config,
                Err(e) => {
                    tracing::warn!("Failed to parse config file '{}': {}, using defaults", path, e);
                    Self::default()
                }
            },
            Err(e) => {
                tracing::warn!("Failed to read config file '{}': {}, using defaults", path, e);
                Self::default()
            }
        }
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn harvest_config(&self) -> HarvestConfig {
        HarvestConfig {
            batch_size: self.catalog.batch_size,
            batch_delay_ms: self.catalog.batch_delay_ms,
            request_timeout_secs: self.catalog.request_timeout_secs,
            max_retries: self.catalog.max_retries,
            catalogue_ttl_days: self.catalog.catalogue_ttl_days,
            record_ttl_hours: self.catalog.record_ttl_hours,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_file_missing() {
        let config = ServerConfig::load_or_default("/nonexistent/config.toml");
        assert_eq!(config.port, 8080);
        assert_eq!(config.catalog.batch_size, 10);
        assert_eq!(config.catalog.catalogue_ttl_days, 30);
        assert_eq!(config.catalog.refresh_interval_hours, 0);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: ServerConfig = toml::from_str(
            r#"
            port = 9090

            [catalog]
            batch_size = 5
            "#,
        )
        .unwrap();
        assert_eq!(config.port, 9090);
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.catalog.batch_size, 5);
        assert_eq!(config.catalog.batch_delay_ms, 300);
    }

    #[test]
    fn test_server_address() {
        let config = ServerConfig::default();
        assert_eq!(config.server_address(), "0.0.0.0:8080");
    }
}

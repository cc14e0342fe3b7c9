//! # Sync Configuration
//!
//! Configuration management for the sync engine.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     RAILAX_REMOTE_URL=https://...                                      │
//! │     RAILAX_SYNC_ENABLED=false                                          │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/railax-sync/sync.toml (Linux)                            │
//! │     ~/Library/Application Support/com.railax.sync/sync.toml (macOS)    │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # sync.toml
//! [database]
//! path = "/var/lib/railax/railax.db"
//!
//! [remote]
//! base_url = "https://railway-worker-backend.artechnology.pro/api"
//! request_timeout_secs = 10
//!
//! [sync]
//! enabled = true
//! sweep_interval_secs = 60
//! create_batch_size = 50
//! batch_pause_ms = 5000
//! item_pause_ms = 500
//!
//! [connectivity]
//! probe_interval_secs = 5
//! probe_timeout_secs = 3
//! probe_addr = "8.8.8.8:53"
//! ```
//!
//! The settings expiry (8 h) and the disconnect threshold (3 failures) are
//! fixed in `railax-core` and cannot be configured.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::{SyncError, SyncResult};

/// Production booking API.
pub const DEFAULT_BASE_URL: &str = "https://railway-worker-backend.artechnology.pro/api";

// =============================================================================
// Database Settings
// =============================================================================

/// Where the local record store lives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// SQLite file path.
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

fn default_db_path() -> PathBuf {
    directories::ProjectDirs::from("com", "railax", "sync")
        .map(|dirs| dirs.data_dir().join("railax.db"))
        .unwrap_or_else(|| PathBuf::from("railax.db"))
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

// =============================================================================
// Remote Settings
// =============================================================================

/// The booking API the engine reconciles against.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteSettings {
    /// Base URL; endpoint paths are appended to it.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request deadline for create, checkout and settings calls.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_request_timeout() -> u64 {
    10
}

fn default_user_agent() -> String {
    format!("railax-sync/{}", env!("CARGO_PKG_VERSION"))
}

impl Default for RemoteSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

// =============================================================================
// Sweep Settings
// =============================================================================

/// Reconciliation sweep behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepSettings {
    /// When false the agent never runs scheduled sweeps.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Seconds between scheduled sweeps.
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,

    /// Records per bulk-create request.
    #[serde(default = "default_batch_size")]
    pub create_batch_size: usize,

    /// Pause after each successful create batch.
    #[serde(default = "default_batch_pause")]
    pub batch_pause_ms: u64,

    /// Pause between update pushes.
    #[serde(default = "default_item_pause")]
    pub item_pause_ms: u64,

    /// How long shutdown waits for in-flight background work.
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_secs: u64,
}

fn default_true() -> bool {
    true
}
fn default_sweep_interval() -> u64 {
    60
}
fn default_batch_size() -> usize {
    railax_core::CREATE_BATCH_SIZE
}
fn default_batch_pause() -> u64 {
    5_000
}
fn default_item_pause() -> u64 {
    500
}
fn default_shutdown_timeout() -> u64 {
    10
}

impl Default for SweepSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            sweep_interval_secs: default_sweep_interval(),
            create_batch_size: default_batch_size(),
            batch_pause_ms: default_batch_pause(),
            item_pause_ms: default_item_pause(),
            shutdown_timeout_secs: default_shutdown_timeout(),
        }
    }
}

// =============================================================================
// Connectivity Settings
// =============================================================================

/// Reachability probing for the classifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectivitySettings {
    #[serde(default = "default_probe_interval")]
    pub probe_interval_secs: u64,

    #[serde(default = "default_probe_timeout")]
    pub probe_timeout_secs: u64,

    /// Well-known external address; `host:port`.
    #[serde(default = "default_probe_addr")]
    pub probe_addr: String,
}

fn default_probe_interval() -> u64 {
    5
}
fn default_probe_timeout() -> u64 {
    3
}
fn default_probe_addr() -> String {
    "8.8.8.8:53".to_string()
}

impl Default for ConnectivitySettings {
    fn default() -> Self {
        Self {
            probe_interval_secs: default_probe_interval(),
            probe_timeout_secs: default_probe_timeout(),
            probe_addr: default_probe_addr(),
        }
    }
}

// =============================================================================
// Main Config
// =============================================================================

/// Complete sync engine configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncConfig {
    #[serde(default)]
    pub database: DatabaseSettings,

    #[serde(default)]
    pub remote: RemoteSettings,

    #[serde(default)]
    pub sync: SweepSettings,

    #[serde(default)]
    pub connectivity: ConnectivitySettings,
}

impl SyncConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (sync.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> SyncResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading sync config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load sync config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> SyncResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| SyncError::ConfigSaveFailed("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents)?;

        info!(?path, "Sync config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> SyncResult<()> {
        let url = url::Url::parse(&self.remote.base_url)?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(SyncError::InvalidUrl(format!(
                "Remote URL must start with http:// or https://, got: {}",
                self.remote.base_url
            )));
        }

        if self.sync.create_batch_size == 0 {
            return Err(SyncError::InvalidConfig(
                "create_batch_size must be greater than 0".into(),
            ));
        }

        if self.sync.sweep_interval_secs == 0 {
            return Err(SyncError::InvalidConfig(
                "sweep_interval_secs must be greater than 0".into(),
            ));
        }

        if self.connectivity.probe_interval_secs == 0 {
            return Err(SyncError::InvalidConfig(
                "probe_interval_secs must be greater than 0".into(),
            ));
        }

        if self.connectivity.probe_timeout_secs > self.connectivity.probe_interval_secs {
            return Err(SyncError::InvalidConfig(format!(
                "probe_timeout_secs ({}) must not exceed probe_interval_secs ({})",
                self.connectivity.probe_timeout_secs, self.connectivity.probe_interval_secs
            )));
        }

        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(path) = std::env::var("RAILAX_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database.path = PathBuf::from(path);
        }

        if let Ok(url) = std::env::var("RAILAX_REMOTE_URL") {
            debug!(url = %url, "Overriding remote URL from environment");
            self.remote.base_url = url;
        }

        if let Ok(enabled) = std::env::var("RAILAX_SYNC_ENABLED") {
            match enabled.to_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => self.sync.enabled = true,
                "0" | "false" | "no" | "off" => self.sync.enabled = false,
                _ => warn!(value = %enabled, "Unknown RAILAX_SYNC_ENABLED value"),
            }
        }

        if let Ok(secs) = std::env::var("RAILAX_SWEEP_INTERVAL_SECS") {
            if let Ok(s) = secs.parse::<u64>() {
                self.sync.sweep_interval_secs = s;
            }
        }

        if let Ok(addr) = std::env::var("RAILAX_PROBE_ADDR") {
            self.connectivity.probe_addr = addr;
        }
    }

    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "railax", "sync")
            .map(|dirs| dirs.config_dir().join("sync.toml"))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.remote.request_timeout_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sync.sweep_interval_secs.max(1))
    }

    pub fn probe_interval(&self) -> Duration {
        Duration::from_secs(self.connectivity.probe_interval_secs)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.connectivity.probe_timeout_secs)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.sync.shutdown_timeout_secs)
    }

    /// Sweep tuning handed to the reconciliation engines.
    pub fn sweep_options(&self) -> crate::SweepOptions {
        crate::SweepOptions {
            batch_size: self.sync.create_batch_size,
            batch_pause: Duration::from_millis(self.sync.batch_pause_ms),
            item_pause: Duration::from_millis(self.sync.item_pause_ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SyncConfig::default();
        assert_eq!(config.remote.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.remote.request_timeout_secs, 10);
        assert_eq!(config.sync.create_batch_size, 50);
        assert_eq!(config.sync.batch_pause_ms, 5_000);
        assert_eq!(config.sync.item_pause_ms, 500);
        assert_eq!(config.probe_interval(), Duration::from_secs(5));
        assert_eq!(config.probe_timeout(), Duration::from_secs(3));
        assert!(config.database.path.ends_with("railax.db"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = SyncConfig::default();

        config.remote.base_url = "ftp://example.com".to_string();
        assert!(matches!(config.validate(), Err(SyncError::InvalidUrl(_))));

        config.remote.base_url = String::new();
        assert!(matches!(config.validate(), Err(SyncError::InvalidUrl(_))));

        config.remote.base_url = "http://localhost:8080/api".to_string();
        assert!(config.validate().is_ok());

        config.sync.create_batch_size = 0;
        assert!(matches!(config.validate(), Err(SyncError::InvalidConfig(_))));
        config.sync.create_batch_size = 50;

        config.sync.sweep_interval_secs = 0;
        assert!(matches!(config.validate(), Err(SyncError::InvalidConfig(_))));
        config.sync.sweep_interval_secs = 60;

        config.connectivity.probe_timeout_secs = 6;
        assert!(config.validate().is_err());

        config.connectivity.probe_interval_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: SyncConfig = toml::from_str(
            r#"
            [sync]
            item_pause_ms = 0

            [connectivity]
            probe_addr = "1.1.1.1:53"
            "#,
        )
        .unwrap();

        assert_eq!(config.sync.item_pause_ms, 0);
        assert_eq!(config.sync.batch_pause_ms, 5_000);
        assert_eq!(config.connectivity.probe_addr, "1.1.1.1:53");
        assert_eq!(config.remote.base_url, DEFAULT_BASE_URL);
        assert!(config.sync.enabled);
    }

    #[test]
    fn test_toml_serialization() {
        let config = SyncConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[remote]"));
        assert!(toml_str.contains("[sync]"));
        assert!(toml_str.contains("[connectivity]"));
    }

    #[test]
    fn test_sweep_options_from_config() {
        let mut config = SyncConfig::default();
        config.sync.batch_pause_ms = 0;
        let options = config.sweep_options();
        assert_eq!(options.batch_size, 50);
        assert_eq!(options.batch_pause, Duration::ZERO);
        assert_eq!(options.item_pause, Duration::from_millis(500));
    }
}

//! # Database Pool Management
//!
//! Opens the local record store and hands out repositories over one shared
//! pool and one shared lock registry.
//!
//! ```text
//!  save_booking ──┐
//!  create sweep ──┼──► RecordLocks (per booking id) ──► SqlitePool ──► railax.db (WAL)
//!  update sweep ──┘
//! ```
//!
//! Saves and sweeps touch the same rows from different tasks. Same-id
//! writers are serialized by [`RecordLocks`]; writers of different ids can
//! still collide on SQLite's single write lock, which `busy_timeout` absorbs.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

use crate::error::{DbError, DbResult};
use crate::locks::RecordLocks;
use crate::migrations;
use crate::repository::booking::BookingRepository;
use crate::repository::settings::SettingsRepository;

/// Where the record store lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DbLocation {
    /// A database file, created on first open.
    File(PathBuf),
    /// A private in-memory database. Gone once the pool closes.
    Memory,
}

/// Database configuration.
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub location: DbLocation,

    /// One foreground writer plus both sweeps need three; the rest is slack
    /// for status reads.
    pub max_connections: u32,

    /// How long a statement waits on another connection's write lock.
    pub busy_timeout: Duration,

    pub acquire_timeout: Duration,
}

impl DbConfig {
    /// File-backed store at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            location: DbLocation::File(path.into()),
            max_connections: 5,
            busy_timeout: Duration::from_secs(5),
            acquire_timeout: Duration::from_secs(30),
        }
    }

    /// Isolated store for tests.
    pub fn in_memory() -> Self {
        DbConfig {
            location: DbLocation::Memory,
            // Every connection to `:memory:` is a separate database.
            max_connections: 1,
            busy_timeout: Duration::from_secs(5),
            acquire_timeout: Duration::from_secs(5),
        }
    }
}

/// Handle to the local record store.
///
/// Cloning is cheap: the pool and the record-lock registry are shared, so
/// every clone serializes writers of the same booking against every other.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
    locks: RecordLocks,
}

impl Database {
    /// Opens the store and applies pending migrations.
    ///
    /// File stores run in WAL mode with `synchronous = NORMAL`: a crash can
    /// lose the last committed save, never corrupt the file. The caller
    /// creates the parent directory.
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        let pool_options = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout);

        let (connect_options, pool_options) = match &config.location {
            DbLocation::File(path) => {
                info!(path = %path.display(), "Opening booking store");
                let options = SqliteConnectOptions::new()
                    .filename(path)
                    .create_if_missing(true)
                    .journal_mode(SqliteJournalMode::Wal)
                    .synchronous(SqliteSynchronous::Normal);
                (options, pool_options)
            }
            DbLocation::Memory => {
                let options = SqliteConnectOptions::from_str("sqlite::memory:")
                    .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;
                // Dropping the only connection would drop the data with it.
                let pool_options = pool_options
                    .min_connections(1)
                    .idle_timeout(None)
                    .max_lifetime(None);
                (options, pool_options)
            }
        };

        let pool = pool_options
            .connect_with(connect_options.busy_timeout(config.busy_timeout))
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;

        migrations::run_migrations(&pool).await?;

        info!(max_connections = config.max_connections, "Booking store ready");

        Ok(Database {
            pool,
            locks: RecordLocks::new(),
        })
    }

    /// Raw pool, for diagnostics and tests.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// The local record store.
    pub fn bookings(&self) -> BookingRepository {
        BookingRepository::new(self.pool.clone(), self.locks.clone())
    }

    /// The settings snapshot.
    pub fn settings(&self) -> SettingsRepository {
        SettingsRepository::new(self.pool.clone())
    }

    /// Closes the pool. Repository calls fail afterwards.
    pub async fn close(&self) {
        info!("Closing booking store");
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use railax_core::{Percentage, SettingsSnapshot};
    use std::time::{SystemTime, UNIX_EPOCH};

    fn snapshot(admin: &str) -> SettingsSnapshot {
        SettingsSnapshot {
            admin_id: admin.to_string(),
            fee_types: Vec::new(),
            advance_payment_enabled: false,
            default_advance: Percentage::from_bps(0),
            hall_name: None,
            last_synced: Utc::now(),
        }
    }

    fn scratch_path() -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir().join(format!("railax-pool-{}-{nanos}.db", std::process::id()))
    }

    fn remove_store(path: &PathBuf) {
        for suffix in ["", "-wal", "-shm"] {
            let mut name = path.clone().into_os_string();
            name.push(suffix);
            let _ = std::fs::remove_file(name);
        }
    }

    #[tokio::test]
    async fn test_schema_is_migrated() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let tables: Vec<String> = sqlx::query_scalar(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name IN ('bookings', 'settings') ORDER BY name",
        )
        .fetch_all(db.pool())
        .await
        .unwrap();

        assert_eq!(tables, ["bookings", "settings"]);
        assert_eq!(db.bookings().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_file_store_uses_wal_and_survives_reopen() {
        let path = scratch_path();

        let db = Database::new(DbConfig::new(&path)).await.unwrap();
        assert!(path.exists());

        let mode: String = sqlx::query_scalar("PRAGMA journal_mode")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(mode, "wal");

        db.settings().replace(&snapshot("ADM-1")).await.unwrap();
        db.close().await;

        let reopened = Database::new(DbConfig::new(&path)).await.unwrap();
        let latest = reopened.settings().latest().await.unwrap().unwrap();
        assert_eq!(latest.admin_id, "ADM-1");
        reopened.close().await;

        remove_store(&path);
    }

    #[tokio::test]
    async fn test_in_memory_stores_are_isolated() {
        let a = Database::new(DbConfig::in_memory()).await.unwrap();
        let b = Database::new(DbConfig::in_memory()).await.unwrap();

        a.settings().replace(&snapshot("ADM-1")).await.unwrap();

        assert!(a.settings().latest().await.unwrap().is_some());
        assert_eq!(b.settings().latest().await.unwrap(), None);
    }
}

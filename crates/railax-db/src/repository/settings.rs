//! # Settings Repository
//!
//! Persists the single cached settings snapshot.
//!
//! The table holds at most one row (`id = 1`): `replace` overwrites it,
//! `purge_expired` deletes it once it is 8 hours old. Expiry is only ever
//! checked when somebody reads; nothing here runs on a timer.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use tracing::{debug, info};

use crate::error::DbResult;
use railax_core::{FeeType, Percentage, SettingsSnapshot};

#[derive(Debug, FromRow)]
struct SettingsRow {
    admin_id: String,
    fee_types: String,
    advance_payment_enabled: bool,
    default_advance_bps: i64,
    hall_name: Option<String>,
    last_synced: DateTime<Utc>,
}

impl SettingsRow {
    fn into_snapshot(self) -> DbResult<SettingsSnapshot> {
        let fee_types: Vec<FeeType> = serde_json::from_str(&self.fee_types)?;

        Ok(SettingsSnapshot {
            admin_id: self.admin_id,
            fee_types,
            advance_payment_enabled: self.advance_payment_enabled,
            default_advance: Percentage::from_bps(self.default_advance_bps.clamp(0, u32::MAX as i64) as u32),
            hall_name: self.hall_name,
            last_synced: self.last_synced,
        })
    }
}

/// Repository for the settings snapshot.
#[derive(Debug, Clone)]
pub struct SettingsRepository {
    pool: SqlitePool,
}

impl SettingsRepository {
    /// Creates a new SettingsRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SettingsRepository { pool }
    }

    /// Stores `snapshot`, discarding whatever was there before.
    pub async fn replace(&self, snapshot: &SettingsSnapshot) -> DbResult<()> {
        let fee_types = serde_json::to_string(&snapshot.fee_types)?;

        sqlx::query(
            r#"
            INSERT INTO settings (
                id, admin_id, fee_types, advance_payment_enabled,
                default_advance_bps, hall_name, last_synced
            ) VALUES (1, ?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(id) DO UPDATE SET
                admin_id = excluded.admin_id,
                fee_types = excluded.fee_types,
                advance_payment_enabled = excluded.advance_payment_enabled,
                default_advance_bps = excluded.default_advance_bps,
                hall_name = excluded.hall_name,
                last_synced = excluded.last_synced
            "#,
        )
        .bind(&snapshot.admin_id)
        .bind(fee_types)
        .bind(snapshot.advance_payment_enabled)
        .bind(snapshot.default_advance.bps() as i64)
        .bind(&snapshot.hall_name)
        .bind(snapshot.last_synced)
        .execute(&self.pool)
        .await?;

        info!(
            admin_id = %snapshot.admin_id,
            fee_types = snapshot.fee_types.len(),
            advance_enabled = snapshot.advance_payment_enabled,
            "Settings snapshot saved"
        );

        Ok(())
    }

    /// Returns the stored snapshot regardless of age.
    pub async fn latest(&self) -> DbResult<Option<SettingsSnapshot>> {
        let row: Option<SettingsRow> = sqlx::query_as(
            r#"
            SELECT admin_id, fee_types, advance_payment_enabled,
                   default_advance_bps, hall_name, last_synced
            FROM settings
            WHERE id = 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await?;

        row.map(SettingsRow::into_snapshot).transpose()
    }

    /// Deletes the snapshot if it is expired at `now`.
    ///
    /// ## Returns
    /// `true` if a snapshot was purged.
    pub async fn purge_expired(&self, now: DateTime<Utc>) -> DbResult<bool> {
        let Some(snapshot) = self.latest().await? else {
            return Ok(false);
        };

        if !snapshot.is_expired_at(now) {
            return Ok(false);
        }

        let result = sqlx::query("DELETE FROM settings WHERE id = 1")
            .execute(&self.pool)
            .await?;

        debug!(
            last_synced = %snapshot.last_synced,
            "Purged expired settings snapshot"
        );

        Ok(result.rows_affected() > 0)
    }

    /// Purges an expired snapshot, then returns what is left.
    pub async fn read_fresh(&self, now: DateTime<Utc>) -> DbResult<Option<SettingsSnapshot>> {
        self.purge_expired(now).await?;
        self.latest().await
    }
}

//! # Settings Cache
//!
//! Remote hall configuration (fee types, advance-payment policy) cached as a
//! single snapshot that expires 8 hours after it was fetched.
//!
//! Expiry is enforced lazily: every read first purges an expired snapshot.
//! There is no background eviction.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{info, warn};

use railax_core::{FeeType, Money, SettingsSnapshot};
use railax_db::SettingsRepository;

use crate::error::SyncResult;
use crate::remote::BookingRemote;

#[derive(Clone)]
pub struct SettingsCache {
    repo: SettingsRepository,
    remote: Arc<dyn BookingRemote>,
}

impl SettingsCache {
    pub fn new(repo: SettingsRepository, remote: Arc<dyn BookingRemote>) -> Self {
        SettingsCache { repo, remote }
    }

    /// Fetches settings for `admin_id` and replaces the cached snapshot.
    ///
    /// On failure the cached snapshot is left untouched.
    pub async fn fetch(&self, admin_id: &str) -> SyncResult<SettingsSnapshot> {
        self.fetch_at(admin_id, Utc::now()).await
    }

    pub async fn fetch_at(&self, admin_id: &str, now: DateTime<Utc>) -> SyncResult<SettingsSnapshot> {
        let response = self.remote.fetch_settings(admin_id).await?;

        let mut snapshot = response.into_snapshot(admin_id, now);
        let dropped = snapshot.normalize_fee_types();
        if dropped > 0 {
            warn!(
                admin_id = %admin_id,
                dropped,
                kept = snapshot.fee_types.len(),
                "Remote sent unusable or surplus fee types"
            );
        }

        self.repo.replace(&snapshot).await?;

        info!(
            admin_id = %admin_id,
            fee_types = snapshot.fee_types.len(),
            hall = snapshot.hall_name.as_deref().unwrap_or("-"),
            "Settings refreshed"
        );

        Ok(snapshot)
    }

    /// The cached snapshot, or `None` if absent or expired.
    pub async fn read(&self) -> SyncResult<Option<SettingsSnapshot>> {
        self.read_at(Utc::now()).await
    }

    pub async fn read_at(&self, now: DateTime<Utc>) -> SyncResult<Option<SettingsSnapshot>> {
        Ok(self.repo.read_fresh(now).await?)
    }

    /// Fetches, falling back to an unexpired cached snapshot if the fetch
    /// fails for any reason.
    pub async fn fetch_or_cached(&self, admin_id: &str) -> SyncResult<SettingsSnapshot> {
        match self.fetch(admin_id).await {
            Ok(snapshot) => Ok(snapshot),
            Err(e) => match self.read().await? {
                Some(cached) => {
                    warn!(
                        admin_id = %admin_id,
                        error = %e,
                        cached_at = %cached.last_synced,
                        "Settings fetch failed; using cached snapshot"
                    );
                    Ok(cached)
                }
                None => Err(e),
            },
        }
    }

    /// Configured booking types; empty when nothing fresh is cached.
    pub async fn booking_types(&self) -> SyncResult<Vec<FeeType>> {
        Ok(self.read().await?.map(|s| s.fee_types).unwrap_or_default())
    }

    /// Fee for one booking type, matched case-insensitively.
    pub async fn booking_type_amount(&self, name: &str) -> SyncResult<Option<Money>> {
        Ok(self.read().await?.and_then(|s| s.fee_for(name)))
    }
}

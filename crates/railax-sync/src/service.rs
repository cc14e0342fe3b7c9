//! # Booking Service
//!
//! The foreground entry points the counter UI calls.
//!
//! ## Save Path
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  save_booking(new)                                                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  validate ──► upsert as PendingCreate   (storage error → Err)           │
//! │       │                                                                 │
//! │       ├── classifier says Disconnected ──► SavedLocally { "offline" }   │
//! │       ▼                                                                 │
//! │  POST [record] (10 s) ── fails ─────────► SavedLocally { reason }       │
//! │       │                                                                 │
//! │     ok / 409                                                            │
//! │       ▼                                                                 │
//! │  PendingCreate → Created ───────────────► SyncedOnline                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Completion Path
//! Completing a `Created` record moves it to `PendingUpdate`. If the
//! classifier said `Good` at that moment, a detached task pushes the update
//! right away; its outcome is only logged. The scheduled update sweep picks
//! up whatever the detached push did not.

use chrono::{NaiveTime, Utc};
use serde::Serialize;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use railax_core::validation::{validate_checkout, validate_new_booking};
use railax_core::{
    BookingRecord, Checkout, ConnectivitySnapshot, ConnectivityState, CoreError, NewBooking,
    SyncState,
};
use railax_db::{BookingRepository, Database};

use crate::connectivity::ConnectivitySignal;
use crate::create_sync::{CreateSweep, CreateSweepReport, SweepOptions};
use crate::error::{SyncError, SyncResult};
use crate::protocol::CreateBookingDto;
use crate::remote::BookingRemote;
use crate::settings_cache::SettingsCache;
use crate::update_sync::{UpdateSweep, UpdateSweepReport};

/// How a save ended. Both variants mean the booking is durably stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SaveOutcome {
    /// The remote accepted the booking during the save.
    SyncedOnline { booking: BookingRecord },
    /// Stored locally only; a later sweep will push it.
    SavedLocally { booking: BookingRecord, reason: String },
}

impl SaveOutcome {
    pub fn booking(&self) -> &BookingRecord {
        match self {
            SaveOutcome::SyncedOnline { booking } | SaveOutcome::SavedLocally { booking, .. } => booking,
        }
    }

    pub fn is_synced(&self) -> bool {
        matches!(self, SaveOutcome::SyncedOnline { .. })
    }
}

/// Result of one create sweep followed by one update sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub create: CreateSweepReport,
    pub update: UpdateSweepReport,
}

/// Foreground operations plus the detached work they start.
#[derive(Clone)]
pub struct BookingService {
    bookings: BookingRepository,
    remote: Arc<dyn BookingRemote>,
    signal: ConnectivitySignal,
    create: CreateSweep,
    update: UpdateSweep,
    settings: SettingsCache,
    tasks: Arc<Mutex<JoinSet<()>>>,
    closed: Arc<AtomicBool>,
}

impl BookingService {
    pub fn new(
        db: &Database,
        remote: Arc<dyn BookingRemote>,
        signal: ConnectivitySignal,
        options: SweepOptions,
    ) -> Self {
        let bookings = db.bookings();

        BookingService {
            create: CreateSweep::new(bookings.clone(), remote.clone(), options),
            update: UpdateSweep::new(bookings.clone(), remote.clone(), options),
            settings: SettingsCache::new(db.settings(), remote.clone()),
            bookings,
            remote,
            signal,
            tasks: Arc::new(Mutex::new(JoinSet::new())),
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn settings(&self) -> &SettingsCache {
        &self.settings
    }

    pub fn connectivity(&self) -> ConnectivitySnapshot {
        self.signal.snapshot()
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Stores a new booking, then tries to create it remotely unless the
    /// classifier says the link is down.
    ///
    /// ## Errors
    /// * `Domain(Validation)` - input rejected; nothing stored
    /// * `Domain(MutationNotAllowed)` - the id is already known to the
    ///   remote; use `complete_booking` to change it
    /// * `Storage` - the booking could not be stored
    ///
    /// A failed remote attempt is not an error.
    pub async fn save_booking(&self, new: NewBooking) -> SyncResult<SaveOutcome> {
        validate_new_booking(&new).map_err(CoreError::from)?;

        let record = BookingRecord::from_new(new, Utc::now());
        let stored = self.bookings.upsert(&record).await?;

        info!(
            booking_id = %stored.booking_id,
            guest = %stored.guest_name,
            total = %stored.total_amount,
            "Booking saved locally"
        );

        if self.signal.state() == ConnectivityState::Disconnected {
            debug!(booking_id = %stored.booking_id, "Offline; skipping immediate create");
            return Ok(SaveOutcome::SavedLocally {
                booking: stored,
                reason: "offline".to_string(),
            });
        }

        match self.create_remote(&stored).await {
            Ok(()) => {
                let booking = self.bookings.get_required(&stored.booking_id).await?;
                info!(booking_id = %booking.booking_id, "Booking synced online");
                Ok(SaveOutcome::SyncedOnline { booking })
            }
            Err(e) if e.is_storage() => Err(e),
            Err(e) => {
                info!(
                    booking_id = %stored.booking_id,
                    error = %e,
                    "Remote create failed; booking stays pending"
                );
                Ok(SaveOutcome::SavedLocally {
                    booking: stored,
                    reason: e.to_string(),
                })
            }
        }
    }

    /// Manual single-record create retry.
    ///
    /// ## Returns
    /// `false` when the booking is no longer `PendingCreate`.
    pub async fn push_booking(&self, booking_id: &str) -> SyncResult<bool> {
        let record = self.bookings.get_required(booking_id).await?;
        if record.sync_state != SyncState::PendingCreate {
            debug!(booking_id = %booking_id, state = %record.sync_state, "Nothing to create");
            return Ok(false);
        }
        self.create_remote(&record).await?;
        Ok(true)
    }

    /// Checks a guest out with final amounts.
    pub async fn complete_booking(&self, booking_id: &str, checkout: Checkout) -> SyncResult<BookingRecord> {
        validate_checkout(&checkout).map_err(CoreError::from)?;

        let link = self.signal.state();
        let record = self.bookings.complete(booking_id, &checkout, Utc::now()).await?;
        self.after_completion(&record, link);
        Ok(record)
    }

    /// Completes a booking keeping its current amounts.
    pub async fn mark_completed(&self, booking_id: &str, out_time: NaiveTime) -> SyncResult<BookingRecord> {
        let link = self.signal.state();
        let record = self.bookings.mark_completed(booking_id, out_time, Utc::now()).await?;
        self.after_completion(&record, link);
        Ok(record)
    }

    fn after_completion(&self, record: &BookingRecord, link: ConnectivityState) {
        if record.sync_state != SyncState::PendingUpdate {
            return;
        }
        if link != ConnectivityState::Good {
            debug!(booking_id = %record.booking_id, link = link.as_str(), "Update left for the sweep");
            return;
        }

        let update = self.update.clone();
        let booking_id = record.booking_id.clone();
        self.spawn_detached(async move {
            match update.push_by_id(&booking_id).await {
                Ok(true) => info!(booking_id = %booking_id, "Immediate update push succeeded"),
                Ok(false) => debug!(booking_id = %booking_id, "Immediate update push had nothing to do"),
                Err(e) => warn!(booking_id = %booking_id, error = %e, "Immediate update push failed"),
            }
        });
    }

    async fn create_remote(&self, record: &BookingRecord) -> SyncResult<()> {
        self.remote
            .create_bookings(&[CreateBookingDto::from(record)])
            .await?;
        self.bookings.mark_created(std::slice::from_ref(record)).await?;
        Ok(())
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Records still waiting for the remote (`PendingCreate` + `PendingUpdate`).
    pub async fn pending_count(&self) -> SyncResult<i64> {
        Ok(self.bookings.count_pending().await?)
    }

    /// Newest bookings first. Diagnostic only: failures yield an empty list.
    pub async fn recent_bookings(&self, limit: u32) -> Vec<BookingRecord> {
        match self.bookings.list_recent(limit).await {
            Ok(records) => records,
            Err(e) => {
                warn!(error = %e, "Failed to list recent bookings");
                Vec::new()
            }
        }
    }

    pub async fn get_booking(&self, booking_id: &str) -> SyncResult<Option<BookingRecord>> {
        Ok(self.bookings.get(booking_id).await?)
    }

    // =========================================================================
    // Sweeps
    // =========================================================================

    pub async fn sync_creates(&self) -> SyncResult<CreateSweepReport> {
        self.create.run().await
    }

    pub async fn sync_updates(&self) -> SyncResult<UpdateSweepReport> {
        self.update.run().await
    }

    /// One create sweep followed by one update sweep.
    ///
    /// The update sweep runs even if the create sweep aborted on a remote
    /// failure. Only a storage error stops it.
    pub async fn sync_now(&self) -> SyncResult<SyncReport> {
        let create = self.create.run().await?;
        let update = self.update.run().await?;
        Ok(SyncReport { create, update })
    }

    // =========================================================================
    // Detached Work
    // =========================================================================

    fn spawn_detached<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        if self.closed.load(Ordering::Acquire) {
            debug!("Service is shutting down; detached task dropped");
            return;
        }

        let mut tasks = self.tasks.lock().unwrap_or_else(PoisonError::into_inner);
        while tasks.try_join_next().is_some() {}
        tasks.spawn(task);
    }

    /// Number of detached tasks not yet reaped.
    pub fn detached_tasks(&self) -> usize {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Stops accepting detached work and waits up to `timeout` for what is
    /// in flight, then aborts the rest.
    ///
    /// ## Returns
    /// How many tasks were aborted.
    pub async fn shutdown(&self, timeout: Duration) -> usize {
        self.closed.store(true, Ordering::Release);

        let mut tasks = {
            let mut guard = self.tasks.lock().unwrap_or_else(PoisonError::into_inner);
            std::mem::take(&mut *guard)
        };

        if tasks.is_empty() {
            return 0;
        }

        let drained = tokio::time::timeout(timeout, async {
            while tasks.join_next().await.is_some() {}
        })
        .await;

        if drained.is_ok() {
            debug!("Detached tasks finished");
            return 0;
        }

        let aborted = tasks.len();
        warn!(aborted, timeout_ms = timeout.as_millis() as u64, "Aborting detached tasks");
        tasks.abort_all();
        while tasks.join_next().await.is_some() {}
        aborted
    }
}

//! # Update Sweep
//!
//! Pushes `PendingUpdate` records one at a time.
//!
//! Unlike the create sweep, a failed item never stops the sweep: it is
//! counted, logged, left in `PendingUpdate` for the next sweep, and the
//! next item is tried after a short pause.

use std::sync::Arc;
use tracing::{debug, info, warn};

use railax_core::{BookingRecord, SyncState};
use railax_db::BookingRepository;

use crate::create_sync::SweepOptions;
use crate::error::{SyncError, SyncResult};
use crate::protocol::CheckoutRequest;
use crate::remote::BookingRemote;

/// `(success, fail)` summary of one update sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateSweepReport {
    pub success: usize,
    pub fail: usize,
}

impl UpdateSweepReport {
    pub fn attempted(&self) -> usize {
        self.success + self.fail
    }
}

/// Per-record update reconciliation.
#[derive(Clone)]
pub struct UpdateSweep {
    bookings: BookingRepository,
    remote: Arc<dyn BookingRemote>,
    options: SweepOptions,
}

impl UpdateSweep {
    pub fn new(bookings: BookingRepository, remote: Arc<dyn BookingRemote>, options: SweepOptions) -> Self {
        UpdateSweep {
            bookings,
            remote,
            options,
        }
    }

    /// Runs one sweep over everything currently `PendingUpdate`.
    ///
    /// ## Errors
    /// Only when the pending list cannot be read. Per-item failures,
    /// including a failed local acknowledgement, land in `fail`.
    pub async fn run(&self) -> SyncResult<UpdateSweepReport> {
        let pending = self.bookings.list_pending(SyncState::PendingUpdate).await?;
        let mut report = UpdateSweepReport::default();

        if pending.is_empty() {
            debug!("No bookings pending update");
            return Ok(report);
        }

        info!(pending = pending.len(), "Starting update sweep");

        for (i, record) in pending.iter().enumerate() {
            if i > 0 && !self.options.item_pause.is_zero() {
                tokio::time::sleep(self.options.item_pause).await;
            }

            match self.push(record).await {
                Ok(()) => report.success += 1,
                Err(e) => {
                    warn!(booking_id = %record.booking_id, error = %e, "Update push failed");
                    report.fail += 1;
                }
            }
        }

        info!(success = report.success, fail = report.fail, "Update sweep finished");
        Ok(report)
    }

    /// Pushes one record's checkout and marks it `UpdateSynced`.
    pub async fn push(&self, record: &BookingRecord) -> SyncResult<()> {
        let request = CheckoutRequest::from_record(record).ok_or_else(|| {
            SyncError::Internal(format!(
                "booking {} is pending update without an out_time",
                record.booking_id
            ))
        })?;

        self.remote.checkout(&request).await?;
        self.bookings.mark_update_synced(&record.booking_id).await?;

        debug!(booking_id = %record.booking_id, "Update synced");
        Ok(())
    }

    /// Reloads `booking_id` and pushes it if it is still `PendingUpdate`.
    ///
    /// ## Returns
    /// `false` when there was nothing to push.
    pub async fn push_by_id(&self, booking_id: &str) -> SyncResult<bool> {
        let record = self.bookings.get_required(booking_id).await?;
        if record.sync_state != SyncState::PendingUpdate {
            debug!(booking_id = %booking_id, state = %record.sync_state, "Nothing to push");
            return Ok(false);
        }
        self.push(&record).await?;
        Ok(true)
    }
}

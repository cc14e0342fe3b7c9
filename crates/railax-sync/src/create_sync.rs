//! # Create Sweep
//!
//! Drains `PendingCreate` records to the remote in fixed-size batches.
//!
//! ## Policy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  PendingCreate (creation order)                                         │
//! │  ┌────────── 50 ─────────┐┌────────── 50 ─────────┐┌─── 20 ───┐         │
//! │  │       batch 1         ││       batch 2         ││ batch 3  │         │
//! │  └───────────┬───────────┘└───────────┬───────────┘└──────────┘         │
//! │              ▼                        ▼                                 │
//! │       POST ok / 409             POST fails                              │
//! │       → 50 Created              → sweep aborts here                     │
//! │       pause 5 s                   batch 3 never sent                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Batches go out strictly in order and nothing is sent after the first
//! failed batch. A 409 from the remote counts as acceptance.

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use railax_core::{BookingRecord, SyncState};
use railax_db::BookingRepository;

use crate::error::SyncResult;
use crate::protocol::CreateBookingDto;
use crate::remote::{BookingRemote, CreateAck};

/// Batch size and pacing shared by both sweeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweepOptions {
    pub batch_size: usize,
    /// Pause after each successful create batch that has a successor.
    pub batch_pause: Duration,
    /// Pause between update pushes.
    pub item_pause: Duration,
}

impl Default for SweepOptions {
    fn default() -> Self {
        SweepOptions {
            batch_size: railax_core::CREATE_BATCH_SIZE,
            batch_pause: Duration::from_secs(5),
            item_pause: Duration::from_millis(500),
        }
    }
}

impl SweepOptions {
    /// Same batch size, no pauses.
    pub fn without_pauses(self) -> Self {
        SweepOptions {
            batch_pause: Duration::ZERO,
            item_pause: Duration::ZERO,
            ..self
        }
    }
}

/// What one create sweep did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateSweepReport {
    /// Records in `PendingCreate` when the sweep started.
    pub pending: usize,
    pub batches_total: usize,
    /// Batches the remote accepted.
    pub batches_sent: usize,
    /// Records moved to `Created`.
    pub created: usize,
    /// Records completed locally while their batch was in flight; now
    /// `PendingUpdate`.
    pub requeued: usize,
    /// 1-based index of the batch that aborted the sweep.
    pub failed_batch: Option<usize>,
    pub error: Option<String>,
}

impl CreateSweepReport {
    pub fn aborted(&self) -> bool {
        self.failed_batch.is_some()
    }
}

/// Bulk-create reconciliation.
#[derive(Clone)]
pub struct CreateSweep {
    bookings: BookingRepository,
    remote: Arc<dyn BookingRemote>,
    options: SweepOptions,
}

impl CreateSweep {
    pub fn new(bookings: BookingRepository, remote: Arc<dyn BookingRemote>, options: SweepOptions) -> Self {
        CreateSweep {
            bookings,
            remote,
            options,
        }
    }

    /// Runs one sweep over everything currently `PendingCreate`.
    ///
    /// ## Errors
    /// Only local storage failures. Remote failures end the sweep early and
    /// are reported in [`CreateSweepReport::failed_batch`].
    pub async fn run(&self) -> SyncResult<CreateSweepReport> {
        let pending = self.bookings.list_pending(SyncState::PendingCreate).await?;
        let batch_size = self.options.batch_size.max(1);

        let mut report = CreateSweepReport {
            pending: pending.len(),
            batches_total: pending.len().div_ceil(batch_size),
            ..Default::default()
        };

        if pending.is_empty() {
            debug!("No bookings pending create");
            return Ok(report);
        }

        info!(
            pending = report.pending,
            batches = report.batches_total,
            "Starting create sweep"
        );

        for (i, batch) in pending.chunks(batch_size).enumerate() {
            match self.send_batch(batch).await {
                Ok(ack) => {
                    let summary = self.bookings.mark_created(batch).await?;
                    report.batches_sent += 1;
                    report.created += summary.created;
                    report.requeued += summary.requeued;

                    info!(
                        batch = i + 1,
                        of = report.batches_total,
                        count = batch.len(),
                        already_existed = ack == CreateAck::AlreadyExists,
                        "Batch uploaded"
                    );

                    let has_next = i + 1 < report.batches_total;
                    if has_next && !self.options.batch_pause.is_zero() {
                        tokio::time::sleep(self.options.batch_pause).await;
                    }
                }
                Err(e) => {
                    warn!(
                        batch = i + 1,
                        of = report.batches_total,
                        error = %e,
                        "Batch failed; stopping create sweep"
                    );
                    report.failed_batch = Some(i + 1);
                    report.error = Some(e.to_string());
                    break;
                }
            }
        }

        info!(
            created = report.created,
            requeued = report.requeued,
            remaining = report.pending.saturating_sub(report.created + report.requeued),
            aborted = report.aborted(),
            "Create sweep finished"
        );

        Ok(report)
    }

    async fn send_batch(&self, batch: &[BookingRecord]) -> SyncResult<CreateAck> {
        let body: Vec<CreateBookingDto> = batch.iter().map(CreateBookingDto::from).collect();
        self.remote.create_bookings(&body).await
    }
}

//! Create and update sweep behavior against a scripted remote.

mod common;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use railax_core::{BookingStatus, SyncState};
use railax_db::BookingRepository;
use railax_sync::{
    BookingRemote, CheckoutRequest, CreateAck, CreateBookingDto, CreateSweep, HallTypesResponse,
    SweepOptions, SyncResult, UpdateSweep, UpdateSweepReport,
};

use common::*;
use tokio::time::Instant;

fn options() -> SweepOptions {
    SweepOptions::default().without_pauses()
}

// =============================================================================
// Create Sweep
// =============================================================================

#[tokio::test]
async fn test_failed_second_batch_stops_sweep() {
    let db = memory_db().await;
    seed_pending_creates(&db, 120).await;
    let remote = Arc::new(ScriptedRemote::new().failing_create_calls(&[2]));

    let sweep = CreateSweep::new(db.bookings(), remote.clone(), options());
    let report = sweep.run().await.unwrap();

    assert_eq!(report.pending, 120);
    assert_eq!(report.batches_total, 3);
    assert_eq!(report.batches_sent, 1);
    assert_eq!(report.created, 50);
    assert_eq!(report.failed_batch, Some(2));
    assert!(report.aborted());

    // Batch 3 was never attempted.
    assert_eq!(remote.create_call_sizes(), vec![50, 50]);

    let repo = db.bookings();
    assert_eq!(repo.count_by_state(SyncState::Created).await.unwrap(), 50);
    assert_eq!(repo.count_by_state(SyncState::PendingCreate).await.unwrap(), 70);
}

#[tokio::test]
async fn test_batches_follow_creation_order() {
    let db = memory_db().await;
    let seeded = seed_pending_creates(&db, 120).await;
    let remote = Arc::new(ScriptedRemote::new());

    let report = CreateSweep::new(db.bookings(), remote.clone(), options())
        .run()
        .await
        .unwrap();

    assert_eq!(report.created, 120);
    assert!(!report.aborted());
    assert_eq!(remote.create_call_sizes(), vec![50, 50, 20]);

    let sent: Vec<String> = remote.create_calls.lock().unwrap().concat();
    let expected: Vec<String> = seeded.iter().map(|r| r.booking_id.clone()).collect();
    assert_eq!(sent, expected);
}

#[tokio::test]
async fn test_pause_only_between_successful_batches() {
    let pause = Duration::from_millis(400);
    let paced = SweepOptions {
        batch_pause: pause,
        item_pause: Duration::ZERO,
        ..SweepOptions::default()
    };

    // All three batches accepted: two pauses, none after the last batch.
    let db = memory_db().await;
    seed_pending_creates(&db, 120).await;
    let remote = Arc::new(ScriptedRemote::new());

    CreateSweep::new(db.bookings(), remote.clone(), paced).run().await.unwrap();
    let finished = Instant::now();

    let times = remote.create_times.lock().unwrap().clone();
    assert_eq!(times.len(), 3);
    assert!(times[1] - times[0] >= pause);
    assert!(times[2] - times[1] >= pause);
    assert!(finished - times[2] < pause);

    // Batch 2 rejected: one pause before it, none after it.
    let db = memory_db().await;
    seed_pending_creates(&db, 120).await;
    let remote = Arc::new(ScriptedRemote::new().failing_create_calls(&[2]));

    CreateSweep::new(db.bookings(), remote.clone(), paced).run().await.unwrap();
    let finished = Instant::now();

    let times = remote.create_times.lock().unwrap().clone();
    assert_eq!(times.len(), 2);
    assert!(times[1] - times[0] >= pause);
    assert!(finished - times[1] < pause);
}

#[tokio::test]
async fn test_conflict_counts_as_created() {
    let db = memory_db().await;
    seed_pending_creates(&db, 3).await;
    let remote = Arc::new(ScriptedRemote::new().conflicting_create_calls(&[1]));

    let report = CreateSweep::new(db.bookings(), remote, options())
        .run()
        .await
        .unwrap();

    assert_eq!(report.created, 3);
    assert_eq!(db.bookings().count_by_state(SyncState::Created).await.unwrap(), 3);
}

#[tokio::test]
async fn test_retry_after_failure_picks_up_the_rest() {
    let db = memory_db().await;
    seed_pending_creates(&db, 120).await;

    let first = Arc::new(ScriptedRemote::new().failing_create_calls(&[2]));
    CreateSweep::new(db.bookings(), first, options()).run().await.unwrap();

    let second = Arc::new(ScriptedRemote::new());
    let report = CreateSweep::new(db.bookings(), second.clone(), options())
        .run()
        .await
        .unwrap();

    assert_eq!(report.pending, 70);
    assert_eq!(second.create_call_sizes(), vec![50, 20]);
    assert_eq!(db.bookings().count_pending().await.unwrap(), 0);
}

/// Completes the first booking of every batch while the batch is in flight.
struct CompletesDuringCreate {
    repo: BookingRepository,
}

#[async_trait]
impl BookingRemote for CompletesDuringCreate {
    async fn create_bookings(&self, batch: &[CreateBookingDto]) -> SyncResult<CreateAck> {
        self.repo
            .complete(&batch[0].booking_id, &checkout(), t0())
            .await
            .unwrap();
        Ok(CreateAck::Accepted)
    }

    async fn checkout(&self, _request: &CheckoutRequest) -> SyncResult<()> {
        Ok(())
    }

    async fn fetch_settings(&self, _admin_id: &str) -> SyncResult<HallTypesResponse> {
        unreachable!()
    }
}

#[tokio::test]
async fn test_completion_during_create_is_requeued_for_update() {
    let db = memory_db().await;
    seed_pending_creates(&db, 2).await;
    let remote = Arc::new(CompletesDuringCreate { repo: db.bookings() });

    let report = CreateSweep::new(db.bookings(), remote, options())
        .run()
        .await
        .unwrap();

    assert_eq!(report.created, 1);
    assert_eq!(report.requeued, 1);

    let repo = db.bookings();
    let first = repo.get_required("BK-000").await.unwrap();
    assert_eq!(first.status, BookingStatus::Completed);
    assert_eq!(first.sync_state, SyncState::PendingUpdate);
    assert_eq!(repo.get_required("BK-001").await.unwrap().sync_state, SyncState::Created);
}

#[tokio::test]
async fn test_completed_before_create_goes_straight_to_created() {
    let db = memory_db().await;
    seed_pending_creates(&db, 1).await;
    let repo = db.bookings();

    let done = repo.complete("BK-000", &checkout(), t0()).await.unwrap();
    assert_eq!(done.sync_state, SyncState::PendingCreate);

    let remote = Arc::new(ScriptedRemote::new());
    CreateSweep::new(repo.clone(), remote.clone(), options())
        .run()
        .await
        .unwrap();

    // The create carried the completed payload, so there is nothing to update.
    let stored = repo.get_required("BK-000").await.unwrap();
    assert_eq!(stored.sync_state, SyncState::Created);
    assert_eq!(stored.status, BookingStatus::Completed);
    assert!(remote.checkout_calls.lock().unwrap().is_empty());
}

// =============================================================================
// Update Sweep
// =============================================================================

#[tokio::test]
async fn test_update_sweep_continues_past_failures() {
    let db = memory_db().await;
    let ids = seed_pending_updates(&db, 5).await;
    let remote = Arc::new(ScriptedRemote::new().failing_checkout_calls(&[2, 4]));

    let report = UpdateSweep::new(db.bookings(), remote.clone(), options())
        .run()
        .await
        .unwrap();

    assert_eq!(report, UpdateSweepReport { success: 3, fail: 2 });
    assert_eq!(remote.checkout_calls.lock().unwrap().len(), 5);

    let repo = db.bookings();
    assert_eq!(repo.count_by_state(SyncState::UpdateSynced).await.unwrap(), 3);
    assert_eq!(repo.count_by_state(SyncState::PendingUpdate).await.unwrap(), 2);

    let failed: Vec<String> = {
        let calls = remote.checkout_calls.lock().unwrap();
        vec![calls[1].clone(), calls[3].clone()]
    };
    for id in &ids {
        let state = repo.get_required(id).await.unwrap().sync_state;
        if failed.contains(id) {
            assert_eq!(state, SyncState::PendingUpdate);
        } else {
            assert_eq!(state, SyncState::UpdateSynced);
        }
    }
}

#[tokio::test]
async fn test_update_synced_is_terminal() {
    let db = memory_db().await;
    let ids = seed_pending_updates(&db, 1).await;
    let remote = Arc::new(ScriptedRemote::new());
    let sweep = UpdateSweep::new(db.bookings(), remote.clone(), options());

    assert_eq!(sweep.run().await.unwrap().success, 1);
    assert_eq!(sweep.run().await.unwrap().attempted(), 0);

    let repo = db.bookings();
    let err = repo
        .mark_completed(&ids[0], checkout().out_time, t0())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        railax_db::DbError::Domain(railax_core::CoreError::AlreadyCompleted { .. })
    ));
    assert_eq!(
        repo.get_required(&ids[0]).await.unwrap().sync_state,
        SyncState::UpdateSynced
    );
}

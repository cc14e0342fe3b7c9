//! # Booking Repository
//!
//! The local record store: durable booking rows and their sync state.
//!
//! ## Write Paths
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Who writes a booking row                             │
//! │                                                                         │
//! │  save_booking ───► upsert()          replaces payload only while the   │
//! │                                      row is still pending_create        │
//! │                                                                         │
//! │  checkout     ───► complete()        payload + local-mutation rule     │
//! │                                      (0 stays 0, 1 becomes 2)          │
//! │                                                                         │
//! │  create sweep ───► mark_created()    0 → 1, in one transaction         │
//! │                                                                         │
//! │  update sweep ───► transition()      2 → 3                             │
//! │                                                                         │
//! │  Every path takes the record's lock from RecordLocks first and writes  │
//! │  with `WHERE sync_state = <expected>`, so the stored state is always   │
//! │  one of the four machine states.                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sqlx::{FromRow, SqlitePool};
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};
use crate::locks::RecordLocks;
use railax_core::{BookingRecord, BookingStatus, Checkout, CoreError, Money, SyncState};

/// Column list shared by every SELECT.
const BOOKING_COLUMNS: &str = r#"
    booking_id, worker_id, guest_name, phone_number, number_of_persons,
    booking_type, total_hours, booking_date, in_time, out_time,
    proof_type, proof_id, price_per_person, total_amount, paid_amount,
    balance_amount, payment_method, status, created_at, updated_at, sync_state
"#;

// =============================================================================
// Row Mapping
// =============================================================================

#[derive(Debug, FromRow)]
struct BookingRow {
    booking_id: String,
    worker_id: String,
    guest_name: String,
    phone_number: String,
    number_of_persons: i64,
    booking_type: String,
    total_hours: i64,
    booking_date: NaiveDate,
    in_time: NaiveTime,
    out_time: Option<NaiveTime>,
    proof_type: Option<String>,
    proof_id: Option<String>,
    price_per_person: i64,
    total_amount: i64,
    paid_amount: i64,
    balance_amount: i64,
    payment_method: String,
    status: BookingStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    sync_state: i64,
}

impl TryFrom<BookingRow> for BookingRecord {
    type Error = DbError;

    fn try_from(row: BookingRow) -> Result<Self, Self::Error> {
        let sync_state = decode_state(&row.booking_id, row.sync_state)?;

        Ok(BookingRecord {
            booking_id: row.booking_id,
            worker_id: row.worker_id,
            guest_name: row.guest_name,
            phone_number: row.phone_number,
            number_of_persons: row.number_of_persons,
            booking_type: row.booking_type,
            total_hours: row.total_hours,
            booking_date: row.booking_date,
            in_time: row.in_time,
            out_time: row.out_time,
            proof_type: row.proof_type,
            proof_id: row.proof_id,
            price_per_person: Money::from_paise(row.price_per_person),
            total_amount: Money::from_paise(row.total_amount),
            paid_amount: Money::from_paise(row.paid_amount),
            balance_amount: Money::from_paise(row.balance_amount),
            payment_method: row.payment_method,
            status: row.status,
            created_at: row.created_at,
            updated_at: row.updated_at,
            sync_state,
        })
    }
}

fn decode_state(booking_id: &str, code: i64) -> DbResult<SyncState> {
    SyncState::from_code(code).map_err(|_| DbError::InvalidState {
        booking_id: booking_id.to_string(),
        code,
    })
}

// =============================================================================
// Ack Summary
// =============================================================================

/// Outcome of acknowledging one bulk-create batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AckSummary {
    /// Records moved `PendingCreate → Created`.
    pub created: usize,
    /// Records completed locally while their create was in flight. They
    /// pass through `Created` straight on to `PendingUpdate` so the update
    /// sweep pushes the checkout the remote has not seen.
    pub requeued: usize,
    /// Records no longer in `PendingCreate` (or gone) when the ack landed.
    pub skipped: usize,
}

impl AckSummary {
    /// Records that left `PendingCreate`.
    pub fn advanced(&self) -> usize {
        self.created + self.requeued
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for booking records.
#[derive(Debug, Clone)]
pub struct BookingRepository {
    pool: SqlitePool,
    locks: RecordLocks,
}

impl BookingRepository {
    /// Creates a new BookingRepository.
    pub fn new(pool: SqlitePool, locks: RecordLocks) -> Self {
        BookingRepository { pool, locks }
    }

    // -------------------------------------------------------------------------
    // Reads
    // -------------------------------------------------------------------------

    /// Gets a booking by id.
    ///
    /// ## Returns
    /// * `Ok(Some(record))` - Booking found
    /// * `Ok(None)` - No booking with this id
    /// * `Err(DbError::InvalidState)` - Row carries an unknown sync-state code
    pub async fn get(&self, booking_id: &str) -> DbResult<Option<BookingRecord>> {
        let sql = format!("SELECT {} FROM bookings WHERE booking_id = ?1", BOOKING_COLUMNS);

        let row: Option<BookingRow> = sqlx::query_as(&sql)
            .bind(booking_id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(BookingRecord::try_from).transpose()
    }

    /// Gets a booking by id, failing with `NotFound` when absent.
    pub async fn get_required(&self, booking_id: &str) -> DbResult<BookingRecord> {
        self.get(booking_id)
            .await?
            .ok_or_else(|| DbError::not_found("Booking", booking_id))
    }

    /// Lists every record in `state`, oldest first.
    ///
    /// Insertion order breaks ties between identical `created_at` values, so
    /// batches are cut the same way on every sweep.
    pub async fn list_pending(&self, state: SyncState) -> DbResult<Vec<BookingRecord>> {
        let sql = format!(
            "SELECT {} FROM bookings WHERE sync_state = ?1 ORDER BY created_at ASC, rowid ASC",
            BOOKING_COLUMNS
        );

        let rows: Vec<BookingRow> = sqlx::query_as(&sql)
            .bind(state.code())
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(BookingRecord::try_from).collect()
    }

    /// Lists the newest bookings for diagnostics.
    ///
    /// Rows with an unreadable sync state are logged and skipped.
    pub async fn list_recent(&self, limit: u32) -> DbResult<Vec<BookingRecord>> {
        let sql = format!(
            "SELECT {} FROM bookings ORDER BY created_at DESC, rowid DESC LIMIT ?1",
            BOOKING_COLUMNS
        );

        let rows: Vec<BookingRow> = sqlx::query_as(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .into_iter()
            .filter_map(|row| match BookingRecord::try_from(row) {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!(error = %e, "Skipping unreadable booking row");
                    None
                }
            })
            .collect())
    }

    /// Counts records still owing the remote work (`PendingCreate` or
    /// `PendingUpdate`).
    pub async fn count_pending(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM bookings WHERE sync_state IN (?1, ?2)",
        )
        .bind(SyncState::PendingCreate.code())
        .bind(SyncState::PendingUpdate.code())
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    /// Counts records in one state.
    pub async fn count_by_state(&self, state: SyncState) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM bookings WHERE sync_state = ?1")
            .bind(state.code())
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Counts all bookings.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM bookings")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    async fn current_state(&self, booking_id: &str) -> DbResult<Option<SyncState>> {
        let code: Option<i64> =
            sqlx::query_scalar("SELECT sync_state FROM bookings WHERE booking_id = ?1")
                .bind(booking_id)
                .fetch_optional(&self.pool)
                .await?;

        code.map(|c| decode_state(booking_id, c)).transpose()
    }

    /// Explains why a conditional write touched no row.
    async fn missed_write(&self, booking_id: &str, expected: SyncState) -> DbError {
        match self.current_state(booking_id).await {
            Ok(Some(_)) => DbError::StateConflict {
                booking_id: booking_id.to_string(),
                expected,
            },
            Ok(None) => DbError::not_found("Booking", booking_id),
            Err(e) => e,
        }
    }

    // -------------------------------------------------------------------------
    // Writes
    // -------------------------------------------------------------------------

    /// Inserts a booking, or replaces one the remote has never seen.
    ///
    /// ## Rules
    /// - Same id twice leaves exactly one row holding the latest payload
    /// - `balance_amount` is rewritten as `total - paid`
    /// - A replace keeps the stored `created_at`, so batch order is stable
    /// - Only a `PendingCreate` row is replaced; the incoming `sync_state` is
    ///   applied only if it is one legal step from `PendingCreate`
    ///
    /// ## Errors
    /// * `Domain(MutationNotAllowed)` - the stored row is past
    ///   `PendingCreate`; it is left untouched
    /// * `InvalidState` - the stored sync-state code is unknown
    ///
    /// ## Returns
    /// The record exactly as stored.
    pub async fn upsert(&self, record: &BookingRecord) -> DbResult<BookingRecord> {
        let _guard = self.locks.lock(&record.booking_id).await;

        let mut stored = record.clone();
        if !stored.balance_holds() {
            warn!(
                booking_id = %stored.booking_id,
                balance = %stored.balance_amount,
                "Balance did not match total - paid; recomputing"
            );
            stored.balance_amount = stored.total_amount - stored.paid_amount;
        }

        let existing: Option<(i64, DateTime<Utc>)> =
            sqlx::query_as("SELECT sync_state, created_at FROM bookings WHERE booking_id = ?1")
                .bind(&stored.booking_id)
                .fetch_optional(&self.pool)
                .await?;

        if let Some((code, created_at)) = existing {
            let current = decode_state(&stored.booking_id, code)?;
            if current != SyncState::PendingCreate {
                warn!(
                    booking_id = %stored.booking_id,
                    current = %current,
                    "Refusing to replace a booking the remote has already seen"
                );
                return Err(CoreError::MutationNotAllowed {
                    booking_id: stored.booking_id,
                    state: current,
                }
                .into());
            }

            stored.created_at = created_at;
        }

        if !SyncState::PendingCreate.can_transition_to(stored.sync_state) {
            warn!(
                booking_id = %stored.booking_id,
                requested = %stored.sync_state,
                "Ignoring sync state not reachable from pending_create"
            );
            stored.sync_state = SyncState::PendingCreate;
        }

        let result = sqlx::query(
            r#"
            INSERT INTO bookings (
                booking_id, worker_id, guest_name, phone_number, number_of_persons,
                booking_type, total_hours, booking_date, in_time, out_time,
                proof_type, proof_id, price_per_person, total_amount, paid_amount,
                balance_amount, payment_method, status, created_at, updated_at, sync_state
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10,
                ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21
            )
            ON CONFLICT(booking_id) DO UPDATE SET
                worker_id = excluded.worker_id,
                guest_name = excluded.guest_name,
                phone_number = excluded.phone_number,
                number_of_persons = excluded.number_of_persons,
                booking_type = excluded.booking_type,
                total_hours = excluded.total_hours,
                booking_date = excluded.booking_date,
                in_time = excluded.in_time,
                out_time = excluded.out_time,
                proof_type = excluded.proof_type,
                proof_id = excluded.proof_id,
                price_per_person = excluded.price_per_person,
                total_amount = excluded.total_amount,
                paid_amount = excluded.paid_amount,
                balance_amount = excluded.balance_amount,
                payment_method = excluded.payment_method,
                status = excluded.status,
                updated_at = excluded.updated_at,
                sync_state = excluded.sync_state
            WHERE bookings.sync_state = ?22
            "#,
        )
        .bind(&stored.booking_id)
        .bind(&stored.worker_id)
        .bind(&stored.guest_name)
        .bind(&stored.phone_number)
        .bind(stored.number_of_persons)
        .bind(&stored.booking_type)
        .bind(stored.total_hours)
        .bind(stored.booking_date)
        .bind(stored.in_time)
        .bind(stored.out_time)
        .bind(&stored.proof_type)
        .bind(&stored.proof_id)
        .bind(stored.price_per_person.paise())
        .bind(stored.total_amount.paise())
        .bind(stored.paid_amount.paise())
        .bind(stored.balance_amount.paise())
        .bind(&stored.payment_method)
        .bind(stored.status)
        .bind(stored.created_at)
        .bind(stored.updated_at)
        .bind(stored.sync_state.code())
        .bind(SyncState::PendingCreate.code())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(self.missed_write(&stored.booking_id, SyncState::PendingCreate).await);
        }

        debug!(
            booking_id = %stored.booking_id,
            sync_state = %stored.sync_state,
            "Booking upserted"
        );

        Ok(stored)
    }

    /// Moves one record `from → to`, failing if it is no longer in `from`.
    ///
    /// ## Errors
    /// * `Domain(InvalidTransition)` - `from → to` is not a legal step
    /// * `StateConflict` - the record left `from` before this write
    /// * `NotFound` - no such booking
    pub async fn transition(&self, booking_id: &str, from: SyncState, to: SyncState) -> DbResult<()> {
        from.check_transition(booking_id, to)?;

        let _guard = self.locks.lock(booking_id).await;

        let result = sqlx::query(
            "UPDATE bookings SET sync_state = ?1 WHERE booking_id = ?2 AND sync_state = ?3",
        )
        .bind(to.code())
        .bind(booking_id)
        .bind(from.code())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(self.missed_write(booking_id, from).await);
        }

        debug!(booking_id = %booking_id, from = %from, to = %to, "Sync state advanced");
        Ok(())
    }

    /// Acknowledges a bulk create: every record still in `PendingCreate`
    /// leaves it, in one transaction.
    ///
    /// `sent` are the records as they were serialized for the request. A
    /// record completed locally since then is requeued for the update sweep.
    pub async fn mark_created(&self, sent: &[BookingRecord]) -> DbResult<AckSummary> {
        let _guards = self
            .locks
            .lock_many(sent.iter().map(|r| r.booking_id.as_str()))
            .await;

        let mut summary = AckSummary::default();
        let mut tx = self.pool.begin().await?;

        for record in sent {
            let row: Option<(i64, BookingStatus)> =
                sqlx::query_as("SELECT sync_state, status FROM bookings WHERE booking_id = ?1")
                    .bind(&record.booking_id)
                    .fetch_optional(&mut *tx)
                    .await?;

            let Some((code, status)) = row else {
                warn!(booking_id = %record.booking_id, "Acknowledged booking no longer exists");
                summary.skipped += 1;
                continue;
            };

            match decode_state(&record.booking_id, code) {
                Ok(SyncState::PendingCreate) => {}
                Ok(state) => {
                    debug!(booking_id = %record.booking_id, state = %state, "Already past pending_create");
                    summary.skipped += 1;
                    continue;
                }
                Err(e) => {
                    warn!(error = %e, "Cannot acknowledge booking");
                    summary.skipped += 1;
                    continue;
                }
            }

            SyncState::PendingCreate.check_transition(&record.booking_id, SyncState::Created)?;
            sqlx::query("UPDATE bookings SET sync_state = ?1 WHERE booking_id = ?2 AND sync_state = ?3")
                .bind(SyncState::Created.code())
                .bind(&record.booking_id)
                .bind(SyncState::PendingCreate.code())
                .execute(&mut *tx)
                .await?;

            let completed_in_flight =
                status == BookingStatus::Completed && record.status != BookingStatus::Completed;

            if !completed_in_flight {
                summary.created += 1;
                continue;
            }

            // The remote holds the pre-checkout payload: apply the local
            // mutation on top of the acknowledged create.
            SyncState::Created.check_transition(&record.booking_id, SyncState::PendingUpdate)?;
            sqlx::query("UPDATE bookings SET sync_state = ?1 WHERE booking_id = ?2 AND sync_state = ?3")
                .bind(SyncState::PendingUpdate.code())
                .bind(&record.booking_id)
                .bind(SyncState::Created.code())
                .execute(&mut *tx)
                .await?;

            info!(booking_id = %record.booking_id, "Completed during create; queued for update");
            summary.requeued += 1;
        }

        tx.commit().await?;

        debug!(
            created = summary.created,
            requeued = summary.requeued,
            skipped = summary.skipped,
            "Bulk create acknowledged"
        );

        Ok(summary)
    }

    /// Acknowledges a pushed update: `PendingUpdate → UpdateSynced`.
    pub async fn mark_update_synced(&self, booking_id: &str) -> DbResult<()> {
        self.transition(booking_id, SyncState::PendingUpdate, SyncState::UpdateSynced)
            .await
    }

    /// Completes a booking with final amounts (checkout).
    ///
    /// ## Errors
    /// * `NotFound` - no such booking
    /// * `InvalidState` - stored sync-state code is unknown
    /// * `Domain(AlreadyCompleted)` - second checkout
    /// * `Domain(MutationNotAllowed)` - update already queued or synced
    pub async fn complete(
        &self,
        booking_id: &str,
        checkout: &Checkout,
        now: DateTime<Utc>,
    ) -> DbResult<BookingRecord> {
        let _guard = self.locks.lock(booking_id).await;

        let mut record = self.get_required(booking_id).await?;
        let previous = record.apply_checkout(checkout, now)?;
        self.write_completion(&record, previous).await?;

        info!(
            booking_id = %booking_id,
            total = %record.total_amount,
            balance = %record.balance_amount,
            sync_state = %record.sync_state,
            "Booking completed"
        );

        Ok(record)
    }

    /// Marks a booking completed keeping its current amounts.
    pub async fn mark_completed(
        &self,
        booking_id: &str,
        out_time: NaiveTime,
        now: DateTime<Utc>,
    ) -> DbResult<BookingRecord> {
        let _guard = self.locks.lock(booking_id).await;

        let mut record = self.get_required(booking_id).await?;
        let previous = record.apply_completion(out_time, now)?;
        self.write_completion(&record, previous).await?;

        info!(booking_id = %booking_id, sync_state = %record.sync_state, "Booking marked completed");

        Ok(record)
    }

    /// Caller holds the record lock.
    async fn write_completion(&self, record: &BookingRecord, previous: SyncState) -> DbResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE bookings SET
                status = ?1,
                out_time = ?2,
                total_amount = ?3,
                paid_amount = ?4,
                balance_amount = ?5,
                payment_method = ?6,
                updated_at = ?7,
                sync_state = ?8
            WHERE booking_id = ?9 AND sync_state = ?10
            "#,
        )
        .bind(record.status)
        .bind(record.out_time)
        .bind(record.total_amount.paise())
        .bind(record.paid_amount.paise())
        .bind(record.balance_amount.paise())
        .bind(&record.payment_method)
        .bind(record.updated_at)
        .bind(record.sync_state.code())
        .bind(&record.booking_id)
        .bind(previous.code())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(self.missed_write(&record.booking_id, previous).await);
        }
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use chrono::Duration;
    use railax_core::{CoreError, NewBooking};

    async fn db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn booking(id: &str, minutes: i64) -> BookingRecord {
        let at = DateTime::parse_from_rfc3339("2025-02-01T06:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
            + Duration::minutes(minutes);

        BookingRecord::from_new(
            NewBooking {
                booking_id: Some(id.to_string()),
                worker_id: "W-1".to_string(),
                guest_name: format!("Guest {}", id),
                phone_number: "9000000000".to_string(),
                number_of_persons: 2,
                booking_type: "AC".to_string(),
                total_hours: 4,
                booking_date: at.date_naive(),
                in_time: at.time(),
                proof_type: None,
                proof_id: None,
                price_per_person: Money::from_rupees(120),
                total_amount: Money::from_rupees(240),
                paid_amount: Money::from_rupees(40),
                payment_method: None,
            },
            at,
        )
    }

    fn checkout() -> Checkout {
        Checkout {
            out_time: NaiveTime::from_hms_opt(18, 5, 30).unwrap(),
            payment_method: "UPI".to_string(),
            total_amount: Money::from_paise(26050),
            paid_amount: Money::from_paise(20000),
        }
    }

    #[tokio::test]
    async fn test_upsert_is_idempotent() {
        let db = db().await;
        let repo = db.bookings();

        let first = booking("BK-1", 0);
        repo.upsert(&first).await.unwrap();

        let mut second = first.clone();
        second.guest_name = "Renamed".to_string();
        repo.upsert(&second).await.unwrap();

        assert_eq!(repo.count().await.unwrap(), 1);
        let stored = repo.get_required("BK-1").await.unwrap();
        assert_eq!(stored.guest_name, "Renamed");
        assert_eq!(stored, second);
    }

    #[tokio::test]
    async fn test_upsert_recomputes_balance() {
        let db = db().await;
        let mut record = booking("BK-1", 0);
        record.balance_amount = Money::from_rupees(999);

        let stored = db.bookings().upsert(&record).await.unwrap();

        assert_eq!(stored.balance_amount, Money::from_rupees(200));
        assert!(db.bookings().get_required("BK-1").await.unwrap().balance_holds());
    }

    #[tokio::test]
    async fn test_upsert_keeps_created_at_and_caps_state() {
        let db = db().await;
        let repo = db.bookings();

        let first = repo.upsert(&booking("BK-1", 0)).await.unwrap();

        let mut later = booking("BK-1", 90);
        later.sync_state = SyncState::PendingUpdate;
        let stored = repo.upsert(&later).await.unwrap();

        assert_eq!(stored.created_at, first.created_at);
        assert_eq!(stored.sync_state, SyncState::PendingCreate);
        assert_eq!(repo.get_required("BK-1").await.unwrap(), stored);
    }

    #[tokio::test]
    async fn test_upsert_refuses_created_record() {
        let db = db().await;
        let repo = db.bookings();

        let record = repo.upsert(&booking("BK-1", 0)).await.unwrap();
        repo.transition("BK-1", SyncState::PendingCreate, SyncState::Created)
            .await
            .unwrap();

        let mut edited = record.clone();
        edited.guest_name = "Edited".to_string();
        let err = repo.upsert(&edited).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::MutationNotAllowed { state: SyncState::Created, .. })
        ));

        let stored = repo.get_required("BK-1").await.unwrap();
        assert_eq!(stored.guest_name, record.guest_name);
        assert_eq!(stored.sync_state, SyncState::Created);
    }

    #[tokio::test]
    async fn test_upsert_cannot_wipe_a_checkout() {
        let db = db().await;
        let repo = db.bookings();

        let record = repo.upsert(&booking("BK-1", 0)).await.unwrap();
        repo.transition("BK-1", SyncState::PendingCreate, SyncState::Created)
            .await
            .unwrap();
        let done = repo.complete("BK-1", &checkout(), Utc::now()).await.unwrap();
        assert_eq!(done.sync_state, SyncState::PendingUpdate);

        let err = repo.upsert(&record).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::MutationNotAllowed { state: SyncState::PendingUpdate, .. })
        ));

        let stored = repo.get_required("BK-1").await.unwrap();
        assert_eq!(stored, done);
        assert_eq!(stored.status, BookingStatus::Completed);
        assert_eq!(stored.out_time, NaiveTime::from_hms_opt(18, 5, 30));
    }

    #[tokio::test]
    async fn test_list_pending_in_creation_order() {
        let db = db().await;
        let repo = db.bookings();

        for (id, minute) in [("BK-C", 30), ("BK-A", 10), ("BK-B", 20)] {
            repo.upsert(&booking(id, minute)).await.unwrap();
        }
        repo.transition("BK-B", SyncState::PendingCreate, SyncState::Created)
            .await
            .unwrap();

        let pending = repo.list_pending(SyncState::PendingCreate).await.unwrap();
        let ids: Vec<_> = pending.iter().map(|r| r.booking_id.as_str()).collect();
        assert_eq!(ids, ["BK-A", "BK-C"]);

        let created = repo.list_pending(SyncState::Created).await.unwrap();
        assert_eq!(created.len(), 1);
    }

    #[tokio::test]
    async fn test_transition_rejects_illegal_and_stale_moves() {
        let db = db().await;
        let repo = db.bookings();
        repo.upsert(&booking("BK-1", 0)).await.unwrap();

        let err = repo
            .transition("BK-1", SyncState::PendingCreate, SyncState::PendingUpdate)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::InvalidTransition { .. })));

        let err = repo
            .transition("BK-1", SyncState::Created, SyncState::PendingUpdate)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::StateConflict { .. }));

        let err = repo
            .transition("BK-404", SyncState::PendingCreate, SyncState::Created)
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_complete_follows_local_mutation_rule() {
        let db = db().await;
        let repo = db.bookings();
        let now = Utc::now();

        repo.upsert(&booking("BK-0", 0)).await.unwrap();
        let done = repo.complete("BK-0", &checkout(), now).await.unwrap();
        assert_eq!(done.sync_state, SyncState::PendingCreate);
        assert_eq!(done.balance_amount, Money::from_paise(6050));

        repo.upsert(&booking("BK-1", 1)).await.unwrap();
        repo.transition("BK-1", SyncState::PendingCreate, SyncState::Created)
            .await
            .unwrap();
        let done = repo.complete("BK-1", &checkout(), now).await.unwrap();
        assert_eq!(done.sync_state, SyncState::PendingUpdate);

        let stored = repo.get_required("BK-1").await.unwrap();
        assert_eq!(stored.status, BookingStatus::Completed);
        assert_eq!(stored.out_time, NaiveTime::from_hms_opt(18, 5, 30));
        assert!(stored.balance_holds());

        let err = repo.complete("BK-1", &checkout(), now).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::AlreadyCompleted { .. })));
    }

    #[tokio::test]
    async fn test_unknown_state_code_is_invalid_state() {
        let db = db().await;
        let repo = db.bookings();
        repo.upsert(&booking("BK-1", 0)).await.unwrap();

        sqlx::query("UPDATE bookings SET sync_state = 9 WHERE booking_id = 'BK-1'")
            .execute(db.pool())
            .await
            .unwrap();

        let err = repo
            .mark_completed("BK-1", NaiveTime::from_hms_opt(12, 0, 0).unwrap(), Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::InvalidState { code: 9, .. }));

        // Diagnostics skip the row instead of failing.
        assert!(repo.list_recent(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_mark_created_requeues_completed_in_flight() {
        let db = db().await;
        let repo = db.bookings();

        sqlx::query("CREATE TABLE state_log (booking_id TEXT, old_state INTEGER, new_state INTEGER)")
            .execute(db.pool())
            .await
            .unwrap();
        sqlx::query(
            r#"
            CREATE TRIGGER log_state AFTER UPDATE OF sync_state ON bookings
            WHEN OLD.sync_state <> NEW.sync_state
            BEGIN
                INSERT INTO state_log VALUES (NEW.booking_id, OLD.sync_state, NEW.sync_state);
            END
            "#,
        )
        .execute(db.pool())
        .await
        .unwrap();

        let a = repo.upsert(&booking("BK-A", 0)).await.unwrap();
        let b = repo.upsert(&booking("BK-B", 1)).await.unwrap();

        // BK-B checks out while the batch is on the wire.
        repo.complete("BK-B", &checkout(), Utc::now()).await.unwrap();

        let summary = repo.mark_created(&[a, b]).await.unwrap();
        assert_eq!(summary, AckSummary { created: 1, requeued: 1, skipped: 0 });

        assert_eq!(
            repo.get_required("BK-A").await.unwrap().sync_state,
            SyncState::Created
        );
        assert_eq!(
            repo.get_required("BK-B").await.unwrap().sync_state,
            SyncState::PendingUpdate
        );

        let steps: Vec<(i64, i64)> = sqlx::query_as(
            "SELECT old_state, new_state FROM state_log WHERE booking_id = 'BK-B' ORDER BY rowid",
        )
        .fetch_all(db.pool())
        .await
        .unwrap();
        assert_eq!(steps, vec![(0, 1), (1, 2)]);
    }

    #[tokio::test]
    async fn test_count_pending_covers_both_pending_states() {
        let db = db().await;
        let repo = db.bookings();

        for i in 0..3 {
            repo.upsert(&booking(&format!("BK-{}", i), i)).await.unwrap();
        }
        repo.transition("BK-0", SyncState::PendingCreate, SyncState::Created)
            .await
            .unwrap();
        repo.complete("BK-0", &checkout(), Utc::now()).await.unwrap();
        repo.transition("BK-1", SyncState::PendingCreate, SyncState::Created)
            .await
            .unwrap();

        // BK-0 PendingUpdate, BK-1 Created, BK-2 PendingCreate
        assert_eq!(repo.count_pending().await.unwrap(), 2);
        assert_eq!(repo.count_by_state(SyncState::Created).await.unwrap(), 1);

        repo.mark_update_synced("BK-0").await.unwrap();
        assert_eq!(repo.count_pending().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_list_recent_newest_first() {
        let db = db().await;
        let repo = db.bookings();
        for i in 0..5 {
            repo.upsert(&booking(&format!("BK-{}", i), i)).await.unwrap();
        }

        let recent = repo.list_recent(2).await.unwrap();
        let ids: Vec<_> = recent.iter().map(|r| r.booking_id.as_str()).collect();
        assert_eq!(ids, ["BK-4", "BK-3"]);
    }
}

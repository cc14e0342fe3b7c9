//! Shared fixtures for the reconciliation tests.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use std::collections::HashSet;
use std::sync::Mutex;
use tokio::time::Instant;

use railax_core::{BookingRecord, Checkout, Money, NewBooking, SyncState};
use railax_db::{Database, DbConfig};
use railax_sync::{
    BookingRemote, CheckoutRequest, CreateAck, CreateBookingDto, HallTypesResponse, SyncError,
    SyncResult,
};

/// Remote double driven by a failure script.
///
/// Create and checkout calls are numbered from 1 in the order they arrive.
#[derive(Default)]
pub struct ScriptedRemote {
    pub fail_create_calls: HashSet<usize>,
    pub conflict_create_calls: HashSet<usize>,
    pub fail_checkout_calls: HashSet<usize>,
    pub settings: Mutex<Option<serde_json::Value>>,
    pub create_calls: Mutex<Vec<Vec<String>>>,
    /// When each create call arrived.
    pub create_times: Mutex<Vec<Instant>>,
    pub checkout_calls: Mutex<Vec<String>>,
}

impl ScriptedRemote {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_create_calls(mut self, calls: &[usize]) -> Self {
        self.fail_create_calls = calls.iter().copied().collect();
        self
    }

    pub fn conflicting_create_calls(mut self, calls: &[usize]) -> Self {
        self.conflict_create_calls = calls.iter().copied().collect();
        self
    }

    pub fn failing_checkout_calls(mut self, calls: &[usize]) -> Self {
        self.fail_checkout_calls = calls.iter().copied().collect();
        self
    }

    pub fn with_settings(self, body: serde_json::Value) -> Self {
        *self.settings.lock().unwrap() = Some(body);
        self
    }

    pub fn create_call_sizes(&self) -> Vec<usize> {
        self.create_calls.lock().unwrap().iter().map(Vec::len).collect()
    }
}

#[async_trait]
impl BookingRemote for ScriptedRemote {
    async fn create_bookings(&self, batch: &[CreateBookingDto]) -> SyncResult<CreateAck> {
        self.create_times.lock().unwrap().push(Instant::now());
        let call = {
            let mut calls = self.create_calls.lock().unwrap();
            calls.push(batch.iter().map(|b| b.booking_id.clone()).collect());
            calls.len()
        };

        if self.fail_create_calls.contains(&call) {
            return Err(SyncError::Rejected {
                status: 500,
                body: "internal error".to_string(),
            });
        }
        if self.conflict_create_calls.contains(&call) {
            return Ok(CreateAck::AlreadyExists);
        }
        Ok(CreateAck::Accepted)
    }

    async fn checkout(&self, request: &CheckoutRequest) -> SyncResult<()> {
        let call = {
            let mut calls = self.checkout_calls.lock().unwrap();
            calls.push(request.booking_id.clone());
            calls.len()
        };

        if self.fail_checkout_calls.contains(&call) {
            return Err(SyncError::Timeout(10));
        }
        Ok(())
    }

    async fn fetch_settings(&self, _admin_id: &str) -> SyncResult<HallTypesResponse> {
        match self.settings.lock().unwrap().clone() {
            Some(body) => serde_json::from_value(body).map_err(SyncError::from),
            None => Err(SyncError::Network("connection refused".to_string())),
        }
    }
}

/// Fixed instant all fixtures are built around.
pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 5, 1, 8, 0, 0).unwrap()
}

pub async fn memory_db() -> Database {
    Database::new(DbConfig::in_memory()).await.unwrap()
}

pub fn new_booking(id: &str) -> NewBooking {
    NewBooking {
        booking_id: Some(id.to_string()),
        worker_id: "W-1".to_string(),
        guest_name: format!("Guest {}", id),
        phone_number: "9876543210".to_string(),
        number_of_persons: 2,
        booking_type: "AC".to_string(),
        total_hours: 3,
        booking_date: NaiveDate::from_ymd_opt(2025, 5, 1).unwrap(),
        in_time: NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
        proof_type: None,
        proof_id: None,
        price_per_person: Money::from_paise(12550),
        total_amount: Money::from_paise(25100),
        paid_amount: Money::from_rupees(100),
        payment_method: None,
    }
}

pub fn checkout() -> Checkout {
    Checkout {
        out_time: NaiveTime::from_hms_opt(11, 0, 0).unwrap(),
        payment_method: "Cash".to_string(),
        total_amount: Money::from_paise(25100),
        paid_amount: Money::from_paise(25100),
    }
}

/// Inserts `count` PendingCreate bookings one second apart, ids `BK-000`...
pub async fn seed_pending_creates(db: &Database, count: usize) -> Vec<BookingRecord> {
    let repo = db.bookings();
    let mut out = Vec::with_capacity(count);
    for i in 0..count {
        let at = t0() + Duration::seconds(i as i64);
        let record = BookingRecord::from_new(new_booking(&format!("BK-{:03}", i)), at);
        out.push(repo.upsert(&record).await.unwrap());
    }
    out
}

/// Inserts `count` bookings and walks them to PendingUpdate.
pub async fn seed_pending_updates(db: &Database, count: usize) -> Vec<String> {
    let repo = db.bookings();
    let records = seed_pending_creates(db, count).await;
    repo.mark_created(&records).await.unwrap();

    let mut ids = Vec::with_capacity(count);
    for record in &records {
        let done = repo.complete(&record.booking_id, &checkout(), t0()).await.unwrap();
        assert_eq!(done.sync_state, SyncState::PendingUpdate);
        ids.push(record.booking_id.clone());
    }
    ids
}

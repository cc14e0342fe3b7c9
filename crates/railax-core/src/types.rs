//! # Domain Types
//!
//! Booking types used throughout the sync engine.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │   NewBooking    │   │  BookingRecord  │   │    Checkout     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  guest, party   │──►│  booking_id     │◄──│  out_time       │       │
//! │  │  date, in_time  │   │  amounts (Money)│   │  payment_method │       │
//! │  │  amounts        │   │  status         │   │  total, paid    │       │
//! │  └─────────────────┘   │  sync_state     │   └─────────────────┘       │
//! │                        └─────────────────┘                              │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐                              │
//! │  │  BookingStatus  │   │    SyncState    │                              │
//! │  │  ─────────────  │   │  ─────────────  │                              │
//! │  │  Active         │   │  see sync_state │                              │
//! │  │  Completed      │   │                 │                              │
//! │  └─────────────────┘   └─────────────────┘                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Invariants
//! - `balance_amount == total_amount - paid_amount` after every mutation
//!   that sets either amount
//! - `out_time` is `None` until the booking is `Completed`
//! - `booking_id` never changes once assigned

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::sync_state::SyncState;

/// Payment method recorded when the caller does not name one.
pub const DEFAULT_PAYMENT_METHOD: &str = "Cash";

/// Mints a new booking identifier (UUID v4).
pub fn new_booking_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

// =============================================================================
// Booking Status
// =============================================================================

/// Lifecycle status of a booking (separate from its sync state).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    /// Guest is checked in.
    Active,
    /// Guest checked out and the bill is settled.
    Completed,
}

impl BookingStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Active => "active",
            BookingStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = String;

    /// Case-insensitive; older rows were written as "Active"/"Completed".
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" | "" => Ok(BookingStatus::Active),
            "completed" => Ok(BookingStatus::Completed),
            other => Err(format!("unknown booking status '{}'", other)),
        }
    }
}

impl Default for BookingStatus {
    fn default() -> Self {
        BookingStatus::Active
    }
}

// =============================================================================
// New Booking (input)
// =============================================================================

/// A booking as captured at the counter, before it has a sync state.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewBooking {
    /// Caller-supplied identifier; a UUID v4 is minted when absent.
    pub booking_id: Option<String>,
    pub worker_id: String,
    pub guest_name: String,
    pub phone_number: String,
    pub number_of_persons: i64,
    /// Fee type name from the settings snapshot (e.g. "AC", "Non-AC").
    pub booking_type: String,
    pub total_hours: i64,
    #[ts(as = "String")]
    pub booking_date: NaiveDate,
    #[ts(as = "String")]
    pub in_time: NaiveTime,
    pub proof_type: Option<String>,
    pub proof_id: Option<String>,
    pub price_per_person: Money,
    pub total_amount: Money,
    pub paid_amount: Money,
    pub payment_method: Option<String>,
}

// =============================================================================
// Booking Record
// =============================================================================

/// The unit of synchronization: one guest stay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct BookingRecord {
    /// Primary key. Immutable once assigned.
    pub booking_id: String,

    /// Worker who took the booking.
    pub worker_id: String,

    pub guest_name: String,
    pub phone_number: String,
    pub number_of_persons: i64,
    pub booking_type: String,
    pub total_hours: i64,

    #[ts(as = "String")]
    pub booking_date: NaiveDate,

    #[ts(as = "String")]
    pub in_time: NaiveTime,

    /// Set only when the booking completes.
    #[ts(as = "Option<String>")]
    pub out_time: Option<NaiveTime>,

    /// ID proof kind (Aadhaar, PAN, ...) and its number.
    pub proof_type: Option<String>,
    pub proof_id: Option<String>,

    pub price_per_person: Money,
    pub total_amount: Money,
    pub paid_amount: Money,

    /// Always `total_amount - paid_amount`.
    pub balance_amount: Money,

    pub payment_method: String,
    pub status: BookingStatus,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,

    pub sync_state: SyncState,
}

/// Checkout details captured when a guest leaves.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Checkout {
    #[ts(as = "String")]
    pub out_time: NaiveTime,
    pub payment_method: String,
    pub total_amount: Money,
    pub paid_amount: Money,
}

impl BookingRecord {
    /// Builds a fresh `PendingCreate` record from counter input.
    ///
    /// Balance is derived here; any balance the caller computed is ignored.
    pub fn from_new(new: NewBooking, now: DateTime<Utc>) -> Self {
        let booking_id = new
            .booking_id
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(new_booking_id);
        let payment_method = new
            .payment_method
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_PAYMENT_METHOD.to_string());

        BookingRecord {
            booking_id,
            worker_id: new.worker_id,
            guest_name: new.guest_name,
            phone_number: new.phone_number,
            number_of_persons: new.number_of_persons,
            booking_type: new.booking_type,
            total_hours: new.total_hours,
            booking_date: new.booking_date,
            in_time: new.in_time,
            out_time: None,
            proof_type: new.proof_type,
            proof_id: new.proof_id,
            price_per_person: new.price_per_person,
            total_amount: new.total_amount,
            paid_amount: new.paid_amount,
            balance_amount: new.total_amount - new.paid_amount,
            payment_method,
            status: BookingStatus::Active,
            created_at: now,
            updated_at: now,
            sync_state: SyncState::PendingCreate,
        }
    }

    /// Returns true if the balance invariant holds.
    #[inline]
    pub fn balance_holds(&self) -> bool {
        self.balance_amount == self.total_amount - self.paid_amount
    }

    #[inline]
    pub fn is_completed(&self) -> bool {
        self.status == BookingStatus::Completed
    }

    /// Completes the booking with final amounts.
    ///
    /// Advances `sync_state` by the local-mutation rule and returns the
    /// state the record had before, so the store can write conditionally.
    pub fn apply_checkout(&mut self, checkout: &Checkout, now: DateTime<Utc>) -> CoreResult<SyncState> {
        let previous = self.begin_completion()?;

        self.total_amount = checkout.total_amount;
        self.paid_amount = checkout.paid_amount;
        self.balance_amount = checkout.total_amount - checkout.paid_amount;
        self.payment_method = checkout.payment_method.clone();
        self.finish_completion(checkout.out_time, now);

        Ok(previous)
    }

    /// Completes the booking keeping its current amounts.
    pub fn apply_completion(&mut self, out_time: NaiveTime, now: DateTime<Utc>) -> CoreResult<SyncState> {
        let previous = self.begin_completion()?;
        self.finish_completion(out_time, now);
        Ok(previous)
    }

    fn begin_completion(&self) -> CoreResult<SyncState> {
        if self.is_completed() {
            return Err(CoreError::AlreadyCompleted {
                booking_id: self.booking_id.clone(),
            });
        }
        if self.sync_state.after_local_mutation().is_none() {
            return Err(CoreError::MutationNotAllowed {
                booking_id: self.booking_id.clone(),
                state: self.sync_state,
            });
        }
        Ok(self.sync_state)
    }

    fn finish_completion(&mut self, out_time: NaiveTime, now: DateTime<Utc>) {
        self.out_time = Some(out_time);
        self.status = BookingStatus::Completed;
        self.updated_at = now;
        if let Some(next) = self.sync_state.after_local_mutation() {
            self.sync_state = next;
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

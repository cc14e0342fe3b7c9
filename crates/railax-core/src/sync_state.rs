//! # Sync State Machine
//!
//! Per-record synchronization lifecycle.
//!
//! ## State Diagram
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   local mutation                                                        │
//! │      ┌───┐                                                              │
//! │      │   ▼                                                              │
//! │  ┌───┴──────────┐ bulk create ok ┌──────────┐ local mutation            │
//! │  │PendingCreate │ ─────────────► │ Created  │ ──────────────┐           │
//! │  │     (0)      │  (or 409)      │   (1)    │               │           │
//! │  └──────────────┘                └──────────┘               ▼           │
//! │                                               ┌──────────────────┐      │
//! │                   ┌──────────────┐ push ok    │  PendingUpdate   │      │
//! │                   │ UpdateSynced │ ◄───────── │       (2)        │      │
//! │                   │     (3)      │            └──────────────────┘      │
//! │                   └──────────────┘                                      │
//! │                                                                         │
//! │  Nothing ever returns to PendingCreate. Nothing skips a state.          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The integer codes are the persisted representation and never change.

use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::error::CoreError;

/// Synchronization state of a booking record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum SyncState {
    /// Exists locally only; the remote has never accepted it.
    PendingCreate,
    /// The remote accepted the create; no local change since.
    Created,
    /// Mutated locally after `Created`; must be re-pushed.
    PendingUpdate,
    /// The post-creation mutation was accepted (terminal).
    UpdateSynced,
}

impl SyncState {
    /// Every state, in code order.
    pub const ALL: [SyncState; 4] = [
        SyncState::PendingCreate,
        SyncState::Created,
        SyncState::PendingUpdate,
        SyncState::UpdateSynced,
    ];

    /// Returns the persisted integer code.
    #[inline]
    pub const fn code(&self) -> i64 {
        match self {
            SyncState::PendingCreate => 0,
            SyncState::Created => 1,
            SyncState::PendingUpdate => 2,
            SyncState::UpdateSynced => 3,
        }
    }

    /// Decodes a persisted integer code.
    pub fn from_code(code: i64) -> Result<Self, CoreError> {
        match code {
            0 => Ok(SyncState::PendingCreate),
            1 => Ok(SyncState::Created),
            2 => Ok(SyncState::PendingUpdate),
            3 => Ok(SyncState::UpdateSynced),
            other => Err(CoreError::UnknownSyncState(other)),
        }
    }

    /// Returns true if `next` is reachable from `self` in one step.
    ///
    /// `PendingCreate -> PendingCreate` counts as a step: a payload change
    /// on a record the remote has never seen.
    pub fn can_transition_to(&self, next: SyncState) -> bool {
        matches!(
            (self, next),
            (SyncState::PendingCreate, SyncState::PendingCreate)
                | (SyncState::PendingCreate, SyncState::Created)
                | (SyncState::Created, SyncState::PendingUpdate)
                | (SyncState::PendingUpdate, SyncState::UpdateSynced)
        )
    }

    /// State after a local mutation, or `None` if this state refuses one.
    pub fn after_local_mutation(&self) -> Option<SyncState> {
        match self {
            SyncState::PendingCreate => Some(SyncState::PendingCreate),
            SyncState::Created => Some(SyncState::PendingUpdate),
            SyncState::PendingUpdate | SyncState::UpdateSynced => None,
        }
    }

    /// State after the remote acknowledged this record's pending work.
    pub fn after_remote_ack(&self) -> Option<SyncState> {
        match self {
            SyncState::PendingCreate => Some(SyncState::Created),
            SyncState::PendingUpdate => Some(SyncState::UpdateSynced),
            SyncState::Created | SyncState::UpdateSynced => None,
        }
    }

    /// Checks a transition, naming the record in the error.
    pub fn check_transition(&self, booking_id: &str, next: SyncState) -> Result<(), CoreError> {
        if self.can_transition_to(next) {
            Ok(())
        } else {
            Err(CoreError::InvalidTransition {
                booking_id: booking_id.to_string(),
                from: *self,
                to: next,
            })
        }
    }

    /// Returns true while the record still owes the remote some work.
    #[inline]
    pub const fn is_pending(&self) -> bool {
        matches!(self, SyncState::PendingCreate | SyncState::PendingUpdate)
    }

    /// Snake-case name used in logs and error messages.
    pub const fn as_str(&self) -> &'static str {
        match self {
            SyncState::PendingCreate => "pending_create",
            SyncState::Created => "created",
            SyncState::PendingUpdate => "pending_update",
            SyncState::UpdateSynced => "update_synced",
        }
    }
}

impl fmt::Display for SyncState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<i64> for SyncState {
    type Error = CoreError;

    fn try_from(code: i64) -> Result<Self, Self::Error> {
        SyncState::from_code(code)
    }
}

impl From<SyncState> for i64 {
    fn from(state: SyncState) -> i64 {
        state.code()
    }
}

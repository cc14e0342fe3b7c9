//! # Error Types
//!
//! Domain-specific error types for railax-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  railax-core errors (this file)                                        │
//! │  ├── CoreError        - Domain rule violations                         │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  railax-db errors (separate crate)                                     │
//! │  └── DbError          - Local store failures                           │
//! │                                                                         │
//! │  railax-sync errors (separate crate)                                   │
//! │  └── SyncError        - Classified failure surfaced to the UI          │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → SyncError → UI          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use crate::sync_state::SyncState;

// =============================================================================
// Core Error
// =============================================================================

/// Core domain errors.
///
/// These represent rule violations in the booking lifecycle or the sync
/// state machine. None of them is fatal to the process: the caller's
/// mutation attempt fails and the record stays as it was.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Booking is already completed; a second checkout is rejected.
    #[error("Booking {booking_id} is already completed")]
    AlreadyCompleted { booking_id: String },

    /// A sync state change that the state machine does not allow.
    ///
    /// ## When This Occurs
    /// - Completing a booking whose update is already queued or synced
    /// - Marking a `Created` record as `Created` again from a sweep
    /// - Any attempt to move back to `PendingCreate`
    #[error("Invalid sync transition for {booking_id}: {from} -> {to}")]
    InvalidTransition {
        booking_id: String,
        from: SyncState,
        to: SyncState,
    },

    /// A local mutation was attempted in a state that does not accept one.
    #[error("Booking {booking_id} cannot be mutated in sync state {state}")]
    MutationNotAllowed { booking_id: String, state: SyncState },

    /// Persisted sync-state code outside the known range.
    #[error("Unknown sync state code: {0}")]
    UnknownSyncState(i64),

    /// A monetary value could not be parsed without losing precision.
    #[error("Invalid money value '{value}': {reason}")]
    InvalidMoney { value: String, reason: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Used for early validation before a booking reaches the store.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    Negative { field: String },

    /// Invalid format (e.g., phone number with letters).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InvalidTransition {
            booking_id: "BK-1".to_string(),
            from: SyncState::Created,
            to: SyncState::PendingCreate,
        };
        assert_eq!(
            err.to_string(),
            "Invalid sync transition for BK-1: created -> pending_create"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "guest_name".to_string(),
        };
        assert_eq!(err.to_string(), "guest_name is required");

        let err = ValidationError::OutOfRange {
            field: "number_of_persons".to_string(),
            min: 1,
            max: 50,
        };
        assert_eq!(err.to_string(), "number_of_persons must be between 1 and 50");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Negative {
            field: "paid_amount".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}

//! # Validation Module
//!
//! Input validation for bookings before they reach the local store.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Counter UI                                                   │
//! │  └── Format hints, immediate feedback                                  │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: BookingService::save_booking                                 │
//! │  └── THIS MODULE: booking rules                                        │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: SQLite                                                       │
//! │  └── PRIMARY KEY, NOT NULL constraints                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust,no_run
//! use railax_core::validation::{validate_guest_name, validate_party_size};
//!
//! validate_guest_name("Asha Verma").unwrap();
//! validate_party_size(4).unwrap();
//! ```

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::{Checkout, NewBooking};
use crate::{MAX_PARTY_SIZE, MAX_TOTAL_HOURS};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

fn required(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(())
}

/// Validates a guest name.
///
/// ## Rules
/// - Must not be empty
/// - At most 100 characters
///
/// ## Example
/// ```rust
/// use railax_core::validation::validate_guest_name;
///
/// assert!(validate_guest_name("Asha Verma").is_ok());
/// assert!(validate_guest_name("  ").is_err());
/// ```
pub fn validate_guest_name(name: &str) -> ValidationResult<()> {
    required("guest_name", name, 100)
}

/// Validates a phone number.
///
/// ## Rules
/// - Digits, spaces, `+` and `-` only
/// - 7 to 15 digits
pub fn validate_phone_number(phone: &str) -> ValidationResult<()> {
    required("phone_number", phone, 20)?;

    if !phone
        .trim()
        .chars()
        .all(|c| c.is_ascii_digit() || c == '+' || c == '-' || c == ' ')
    {
        return Err(ValidationError::InvalidFormat {
            field: "phone_number".to_string(),
            reason: "must contain only digits, spaces, '+' and '-'".to_string(),
        });
    }

    let digits = phone.chars().filter(|c| c.is_ascii_digit()).count();
    if !(7..=15).contains(&digits) {
        return Err(ValidationError::InvalidFormat {
            field: "phone_number".to_string(),
            reason: "must have between 7 and 15 digits".to_string(),
        });
    }

    Ok(())
}

/// Validates an optional booking identifier supplied by the caller.
pub fn validate_booking_id(id: &str) -> ValidationResult<()> {
    required("booking_id", id, 64)
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates the number of persons on a booking.
///
/// ## Example
/// ```rust
/// use railax_core::validation::validate_party_size;
///
/// assert!(validate_party_size(1).is_ok());
/// assert!(validate_party_size(0).is_err());
/// ```
pub fn validate_party_size(persons: i64) -> ValidationResult<()> {
    if !(1..=MAX_PARTY_SIZE).contains(&persons) {
        return Err(ValidationError::OutOfRange {
            field: "number_of_persons".to_string(),
            min: 1,
            max: MAX_PARTY_SIZE,
        });
    }
    Ok(())
}

pub fn validate_total_hours(hours: i64) -> ValidationResult<()> {
    if !(1..=MAX_TOTAL_HOURS).contains(&hours) {
        return Err(ValidationError::OutOfRange {
            field: "total_hours".to_string(),
            min: 1,
            max: MAX_TOTAL_HOURS,
        });
    }
    Ok(())
}

/// Validates that an amount is not negative.
pub fn validate_amount(field: &str, amount: Money) -> ValidationResult<()> {
    if amount.is_negative() {
        return Err(ValidationError::Negative {
            field: field.to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Aggregate Validators
// =============================================================================

/// Validates everything the counter captures for a new booking.
pub fn validate_new_booking(booking: &NewBooking) -> ValidationResult<()> {
    if let Some(id) = &booking.booking_id {
        validate_booking_id(id)?;
    }
    required("worker_id", &booking.worker_id, 64)?;
    validate_guest_name(&booking.guest_name)?;
    validate_phone_number(&booking.phone_number)?;
    required("booking_type", &booking.booking_type, 50)?;
    validate_party_size(booking.number_of_persons)?;
    validate_total_hours(booking.total_hours)?;
    validate_amount("price_per_person", booking.price_per_person)?;
    validate_amount("total_amount", booking.total_amount)?;
    validate_amount("paid_amount", booking.paid_amount)?;
    Ok(())
}

/// Validates checkout input.
pub fn validate_checkout(checkout: &Checkout) -> ValidationResult<()> {
    required("payment_method", &checkout.payment_method, 30)?;
    validate_amount("total_amount", checkout.total_amount)?;
    validate_amount("paid_amount", checkout.paid_amount)?;
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

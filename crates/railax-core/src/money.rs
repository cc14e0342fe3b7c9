//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In floating point:                                                     │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  A booking balance computed as total - paid in f64 drifts by a paisa   │
//! │  every few thousand checkouts.                                          │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Paise                                            │
//! │    ₹150.50 is stored, compared and subtracted as 15050                  │
//! │    balance = total - paid is exact, always                              │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Wire Format
//! The remote API speaks decimal numbers (`150.5`). [`wire`] converts at the
//! JSON boundary by parsing the number's *text*, so a value with more than two
//! fractional digits is rejected instead of silently rounded.
//!
//! ## Usage
//! ```rust
//! use railax_core::money::Money;
//!
//! let rate = Money::from_paise(15050); // ₹150.50
//! let total = rate * 2;               // ₹301.00
//! let paid = Money::from_paise(10000);
//! assert_eq!((total - paid).paise(), 20100);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use std::str::FromStr;
use ts_rs::TS;

use crate::error::CoreError;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit (paise for INR).
///
/// ## Design Decisions
/// - **i64 (signed)**: a balance can go negative when a guest overpays
/// - **Single field tuple struct**: zero-cost abstraction over i64
/// - **Derives**: serde stores it as a plain integer; the remote wire format
///   goes through [`wire`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from paise (the smallest currency unit).
    #[inline]
    pub const fn from_paise(paise: i64) -> Self {
        Money(paise)
    }

    /// Creates a Money value from whole rupees.
    ///
    /// ## Example
    /// ```rust
    /// use railax_core::money::Money;
    ///
    /// assert_eq!(Money::from_rupees(150).paise(), 15000);
    /// ```
    #[inline]
    pub const fn from_rupees(rupees: i64) -> Self {
        Money(rupees * 100)
    }

    /// Returns the value in paise.
    #[inline]
    pub const fn paise(&self) -> i64 {
        self.0
    }

    /// Returns the whole-rupee portion.
    #[inline]
    pub const fn rupees(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the paise portion (always 0-99).
    #[inline]
    pub const fn paise_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Parses a decimal string (`"150"`, `"150.5"`, `"-20.75"`) into Money.
    ///
    /// ## Rules
    /// - At most two fractional digits; `"1.005"` is an error, never rounded
    /// - No exponent notation, no thousands separators
    ///
    /// ## Example
    /// ```rust
    /// use railax_core::money::Money;
    ///
    /// assert_eq!(Money::parse_decimal("150.5").unwrap().paise(), 15050);
    /// assert!(Money::parse_decimal("1.005").is_err());
    /// ```
    pub fn parse_decimal(text: &str) -> Result<Money, CoreError> {
        parse_hundredths(text).map(Money)
    }

    /// Formats as a plain decimal string with two fractional digits.
    pub fn to_decimal_string(&self) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        format!("{}{}.{:02}", sign, self.rupees().abs(), self.paise_part())
    }
}

/// Parses a decimal with at most two fractional digits into hundredths.
///
/// Shared by [`Money`] (paise) and percentage fields (basis points).
pub fn parse_hundredths(text: &str) -> Result<i64, CoreError> {
    let invalid = |reason: &str| CoreError::InvalidMoney {
        value: text.to_string(),
        reason: reason.to_string(),
    };

    let trimmed = text.trim();
    let (negative, digits) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed),
    };

    let (whole, fraction) = match digits.split_once('.') {
        Some((w, f)) => (w, f),
        None => (digits, ""),
    };

    if whole.is_empty() && fraction.is_empty() {
        return Err(invalid("empty"));
    }
    if !whole.chars().all(|c| c.is_ascii_digit()) || !fraction.chars().all(|c| c.is_ascii_digit())
    {
        return Err(invalid("not a plain decimal number"));
    }
    if fraction.len() > 2 {
        return Err(invalid("more than two fractional digits"));
    }

    let whole_value: i64 = if whole.is_empty() {
        0
    } else {
        whole.parse().map_err(|_| invalid("out of range"))?
    };
    let fraction_value: i64 = match fraction.len() {
        0 => 0,
        1 => fraction.parse::<i64>().map_err(|_| invalid("bad fraction"))? * 10,
        _ => fraction.parse().map_err(|_| invalid("bad fraction"))?,
    };

    let magnitude = whole_value
        .checked_mul(100)
        .and_then(|v| v.checked_add(fraction_value))
        .ok_or_else(|| invalid("out of range"))?;

    Ok(if negative { -magnitude } else { magnitude })
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display shows money with the rupee sign, for logs.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}₹{}.{:02}", sign, self.rupees().abs(), self.paise_part())
    }
}

impl FromStr for Money {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Money::parse_decimal(s)
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

/// Multiplication by a head count (price per person × persons).
impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

// =============================================================================
// Wire Format
// =============================================================================

/// Serde adapter for the remote API's decimal amounts.
///
/// ```rust,ignore
/// #[derive(Serialize, Deserialize)]
/// struct Fee {
///     #[serde(with = "railax_core::money::wire")]
///     amount: Money,
/// }
/// ```
///
/// Serialization writes a JSON number. Deserialization accepts a JSON number
/// or a numeric string and parses its text with [`parse_hundredths`].
pub mod wire {
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    use super::{parse_hundredths, Money};

    pub fn serialize<S: Serializer>(money: &Money, serializer: S) -> Result<S::Ok, S::Error> {
        // Two-digit fixed point is exactly representable in the shortest
        // f64 repr, so the remote sees the same digits we stored.
        serializer.serialize_f64(money.paise() as f64 / 100.0)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Money, D::Error> {
        hundredths(deserializer).map(Money::from_paise)
    }

    /// Decodes a decimal JSON value into hundredths.
    pub fn hundredths<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(serde_json::Number),
            Text(String),
        }

        let text = match Raw::deserialize(deserializer)? {
            Raw::Number(n) => n.to_string(),
            Raw::Text(s) => s,
        };
        parse_hundredths(&text).map_err(D::Error::custom)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

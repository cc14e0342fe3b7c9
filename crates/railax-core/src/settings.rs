//! # Settings Snapshot
//!
//! Remote hall configuration as cached on the counter machine.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  SettingsSnapshot (exactly one retained)                                │
//! │    admin_id                                                             │
//! │    fee_types: [ (AC, ₹150.00), (Non-AC, ₹100.00), ... ]   at most 4     │
//! │    advance_payment_enabled, default_advance (bps)                       │
//! │    hall_name                                                            │
//! │    last_synced ─────────────► expires at last_synced + 8h               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Expiry is evaluated against a caller-supplied `now`; nothing here reads
//! the clock.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;

/// Hours after `last_synced` at which a snapshot is expired.
pub const SETTINGS_TTL_HOURS: i64 = 8;

/// Fee types the snapshot can hold.
pub const MAX_FEE_TYPES: usize = 4;

// =============================================================================
// Percentage
// =============================================================================

/// Percentage in basis points (2550 = 25.50%).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Percentage(u32);

impl Percentage {
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        Percentage(bps)
    }

    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Applies the percentage to an amount, rounding half away from zero.
    ///
    /// ```rust
    /// use railax_core::settings::Percentage;
    /// use railax_core::Money;
    ///
    /// let advance = Percentage::from_bps(2500).of(Money::from_rupees(300));
    /// assert_eq!(advance.paise(), 7500);
    /// ```
    pub fn of(&self, amount: Money) -> Money {
        let scaled = amount.paise() as i128 * self.0 as i128;
        let half = if scaled < 0 { -5000 } else { 5000 };
        Money::from_paise(((scaled + half) / 10_000) as i64)
    }
}

// =============================================================================
// Snapshot
// =============================================================================

/// One named booking type and its per-person fee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct FeeType {
    pub name: String,
    pub amount: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SettingsSnapshot {
    pub admin_id: String,
    pub fee_types: Vec<FeeType>,
    pub advance_payment_enabled: bool,
    pub default_advance: Percentage,
    pub hall_name: Option<String>,
    #[ts(as = "String")]
    pub last_synced: DateTime<Utc>,
}

impl SettingsSnapshot {
    /// Expiry horizon.
    pub fn ttl() -> Duration {
        Duration::hours(SETTINGS_TTL_HOURS)
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.last_synced + Self::ttl()
    }

    /// Expired once `now - last_synced >= 8h`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now - self.last_synced >= Self::ttl()
    }

    /// Drops fee types past [`MAX_FEE_TYPES`] and unnamed entries.
    /// Returns how many were dropped.
    pub fn normalize_fee_types(&mut self) -> usize {
        let before = self.fee_types.len();
        self.fee_types.retain(|fee| !fee.name.trim().is_empty());
        self.fee_types.truncate(MAX_FEE_TYPES);
        before - self.fee_types.len()
    }

    /// Looks up a fee type by name, ignoring case.
    pub fn fee_for(&self, name: &str) -> Option<Money> {
        self.fee_types
            .iter()
            .find(|fee| fee.name.eq_ignore_ascii_case(name.trim()))
            .map(|fee| fee.amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn snapshot(at: DateTime<Utc>) -> SettingsSnapshot {
        SettingsSnapshot {
            admin_id: "ADM-1".to_string(),
            fee_types: vec![
                FeeType { name: "AC".to_string(), amount: Money::from_rupees(150) },
                FeeType { name: "Non-AC".to_string(), amount: Money::from_rupees(100) },
            ],
            advance_payment_enabled: true,
            default_advance: Percentage::from_bps(2500),
            hall_name: Some("Platform 1 Lounge".to_string()),
            last_synced: at,
        }
    }

    #[test]
    fn test_expiry_boundary() {
        let t = Utc.with_ymd_and_hms(2025, 1, 1, 8, 0, 0).unwrap();
        let snap = snapshot(t);

        assert!(!snap.is_expired_at(t + Duration::minutes(7 * 60 + 59)));
        assert!(snap.is_expired_at(t + Duration::hours(8)));
        assert!(snap.is_expired_at(t + Duration::minutes(8 * 60 + 1)));
        assert_eq!(snap.expires_at(), t + Duration::hours(8));
    }

    #[test]
    fn test_fee_lookup_ignores_case() {
        let snap = snapshot(Utc::now());
        assert_eq!(snap.fee_for("ac"), Some(Money::from_rupees(150)));
        assert_eq!(snap.fee_for("NON-AC"), Some(Money::from_rupees(100)));
        assert_eq!(snap.fee_for("Sleeper"), None);
    }

    #[test]
    fn test_normalize_keeps_four() {
        let mut snap = snapshot(Utc::now());
        for name in ["A", "", "B", "C"] {
            snap.fee_types.push(FeeType { name: name.to_string(), amount: Money::zero() });
        }

        assert_eq!(snap.normalize_fee_types(), 2);
        let names: Vec<_> = snap.fee_types.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["AC", "Non-AC", "A", "B"]);
    }

    #[test]
    fn test_percentage_of_amount() {
        assert_eq!(Percentage::from_bps(3333).of(Money::from_paise(100)).paise(), 33);
        assert_eq!(Percentage::from_bps(5000).of(Money::from_paise(101)).paise(), 51);
        assert!(Percentage::default().of(Money::from_rupees(10)).is_zero());
    }
}

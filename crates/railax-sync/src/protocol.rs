//! # Remote Wire Format
//!
//! JSON bodies exchanged with the booking API.
//!
//! ## Endpoints
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Booking API Messages                               │
//! │                                                                         │
//! │  BULK CREATE                                                            │
//! │  ───────────                                                            │
//! │  POST /Booking/create           ───► [CreateBookingDto, ...]            │
//! │                                 ◄─── 2xx | 409 (already exists)         │
//! │                                                                         │
//! │  CHECKOUT (one record per call)                                         │
//! │  ──────────────────────────────                                         │
//! │  PUT  /Booking/checkout         ───► CheckoutRequest                    │
//! │                                 ◄─── 2xx                                │
//! │                                                                         │
//! │  SETTINGS                                                               │
//! │  ────────                                                               │
//! │  GET  /Settings/hall-types/{id} ◄─── HallTypesResponse                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Amounts go out as JSON numbers with at most two fractional digits and are
//! read back exactly; nothing here routes money through binary floating point
//! on the way in.
//!
//! Responses are decoded strictly. A payload missing a required field is a
//! malformed response, never a snapshot full of defaults.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use railax_core::money::wire as money_wire;
use railax_core::{
    BookingRecord, BookingStatus, FeeType, Money, Percentage, SettingsSnapshot,
};

/// Wall-clock time format used by the API.
pub const TIME_FORMAT: &str = "%H:%M:%S";

mod hms {
    use super::TIME_FORMAT;
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&time.format(TIME_FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let text = String::deserialize(deserializer)?;
        NaiveTime::parse_from_str(&text, TIME_FORMAT).map_err(serde::de::Error::custom)
    }

    pub mod option {
        use super::TIME_FORMAT;
        use chrono::NaiveTime;
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(
            time: &Option<NaiveTime>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match time {
                Some(t) => serializer.collect_str(&t.format(TIME_FORMAT)),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<NaiveTime>, D::Error> {
            Option::<String>::deserialize(deserializer)?
                .map(|text| NaiveTime::parse_from_str(&text, TIME_FORMAT))
                .transpose()
                .map_err(serde::de::Error::custom)
        }
    }
}

// =============================================================================
// Bulk Create
// =============================================================================

/// One element of a `POST /Booking/create` body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateBookingDto {
    pub booking_id: String,
    pub worker_id: String,
    pub guest_name: String,
    pub phone_number: String,
    pub number_of_persons: i64,
    pub booking_type: String,
    pub total_hours: i64,
    pub booking_date: NaiveDate,
    #[serde(with = "hms")]
    pub in_time: NaiveTime,
    #[serde(with = "hms::option", default)]
    pub out_time: Option<NaiveTime>,
    pub proof_type: Option<String>,
    pub proof_id: Option<String>,
    #[serde(with = "money_wire")]
    pub price_per_person: Money,
    #[serde(with = "money_wire")]
    pub total_amount: Money,
    #[serde(with = "money_wire")]
    pub paid_amount: Money,
    #[serde(with = "money_wire")]
    pub balance_amount: Money,
    pub payment_method: String,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&BookingRecord> for CreateBookingDto {
    fn from(record: &BookingRecord) -> Self {
        CreateBookingDto {
            booking_id: record.booking_id.clone(),
            worker_id: record.worker_id.clone(),
            guest_name: record.guest_name.clone(),
            phone_number: record.phone_number.clone(),
            number_of_persons: record.number_of_persons,
            booking_type: record.booking_type.clone(),
            total_hours: record.total_hours,
            booking_date: record.booking_date,
            in_time: record.in_time,
            out_time: record.out_time,
            proof_type: record.proof_type.clone(),
            proof_id: record.proof_id.clone(),
            price_per_person: record.price_per_person,
            total_amount: record.total_amount,
            paid_amount: record.paid_amount,
            balance_amount: record.total_amount - record.paid_amount,
            payment_method: record.payment_method.clone(),
            status: record.status,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

// =============================================================================
// Checkout
// =============================================================================

/// `PUT /Booking/checkout` body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckoutRequest {
    pub booking_id: String,
    #[serde(with = "hms")]
    pub out_time: NaiveTime,
    pub status: BookingStatus,
    pub payment_method: String,
}

impl CheckoutRequest {
    /// Builds the push for a completed record.
    ///
    /// Returns `None` when the record has no `out_time`, which only a
    /// record that was never completed can lack.
    pub fn from_record(record: &BookingRecord) -> Option<Self> {
        Some(CheckoutRequest {
            booking_id: record.booking_id.clone(),
            out_time: record.out_time?,
            status: record.status,
            payment_method: record.payment_method.clone(),
        })
    }
}

// =============================================================================
// Settings
// =============================================================================

/// One fee entry as the API sends it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HallType {
    #[serde(rename = "type", alias = "Type")]
    pub name: String,
    #[serde(alias = "Amount", deserialize_with = "money_wire::deserialize")]
    pub amount: Money,
}

/// `GET /Settings/hall-types/{adminId}` response.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HallTypesResponse {
    #[serde(alias = "Types")]
    pub types: Vec<HallType>,
    #[serde(alias = "AdvancePaymentEnabled", default)]
    pub advance_payment_enabled: bool,
    /// Percentage with up to two decimals; held as basis points.
    #[serde(
        alias = "DefaultAdvancePercentage",
        deserialize_with = "money_wire::hundredths",
        default
    )]
    pub default_advance_percentage: i64,
    #[serde(alias = "HallName", default)]
    pub hall_name: Option<String>,
}

impl HallTypesResponse {
    /// Converts the response into the snapshot that gets cached.
    ///
    /// A negative percentage is clamped to zero.
    pub fn into_snapshot(self, admin_id: &str, fetched_at: DateTime<Utc>) -> SettingsSnapshot {
        let bps = self.default_advance_percentage.clamp(0, u32::MAX as i64) as u32;

        SettingsSnapshot {
            admin_id: admin_id.to_string(),
            fee_types: self
                .types
                .into_iter()
                .map(|t| FeeType {
                    name: t.name,
                    amount: t.amount,
                })
                .collect(),
            advance_payment_enabled: self.advance_payment_enabled,
            default_advance: Percentage::from_bps(bps),
            hall_name: self.hall_name.filter(|name| !name.trim().is_empty()),
            last_synced: fetched_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use railax_core::{NewBooking, SyncState};
    use serde_json::json;

    fn record() -> BookingRecord {
        let now = Utc.with_ymd_and_hms(2025, 3, 14, 9, 30, 0).unwrap();
        let mut record = BookingRecord::from_new(
            NewBooking {
                booking_id: Some("BK-1".to_string()),
                worker_id: "W-7".to_string(),
                guest_name: "Asha".to_string(),
                phone_number: "9876543210".to_string(),
                number_of_persons: 2,
                booking_type: "AC".to_string(),
                total_hours: 6,
                booking_date: NaiveDate::from_ymd_opt(2025, 3, 14).unwrap(),
                in_time: NaiveTime::from_hms_opt(9, 5, 0).unwrap(),
                proof_type: None,
                proof_id: None,
                price_per_person: Money::from_paise(15025),
                total_amount: Money::from_paise(30050),
                paid_amount: Money::from_rupees(100),
                payment_method: None,
            },
            now,
        );
        record.sync_state = SyncState::PendingCreate;
        record
    }

    #[test]
    fn test_create_dto_wire_shape() {
        let value = serde_json::to_value(vec![CreateBookingDto::from(&record())]).unwrap();
        let first = &value[0];

        assert_eq!(first["booking_id"], "BK-1");
        assert_eq!(first["in_time"], "09:05:00");
        assert_eq!(first["out_time"], serde_json::Value::Null);
        assert_eq!(first["booking_date"], "2025-03-14");
        assert_eq!(first["total_amount"], json!(300.5));
        assert_eq!(first["balance_amount"], json!(200.5));
        assert_eq!(first["payment_method"], "Cash");
        assert_eq!(first["status"], "active");
        assert!(first.get("sync_state").is_none());
    }

    #[test]
    fn test_checkout_request_requires_out_time() {
        let mut rec = record();
        assert!(CheckoutRequest::from_record(&rec).is_none());

        rec.out_time = NaiveTime::from_hms_opt(18, 0, 7);
        rec.status = BookingStatus::Completed;
        let body = serde_json::to_value(CheckoutRequest::from_record(&rec).unwrap()).unwrap();
        assert_eq!(
            body,
            json!({
                "booking_id": "BK-1",
                "out_time": "18:00:07",
                "status": "completed",
                "payment_method": "Cash"
            })
        );
    }

    #[test]
    fn test_hall_types_decode_exact_amounts() {
        let response: HallTypesResponse = serde_json::from_value(json!({
            "types": [
                { "Type": "AC", "Amount": 150.10 },
                { "type": "Non-AC", "amount": "90" }
            ],
            "advance_payment_enabled": true,
            "default_advance_percentage": 25.5,
            "hall_name": "Central Lounge"
        }))
        .unwrap();

        let at = Utc.with_ymd_and_hms(2025, 3, 14, 9, 0, 0).unwrap();
        let snapshot = response.into_snapshot("ADM-1", at);

        assert_eq!(snapshot.fee_types.len(), 2);
        assert_eq!(snapshot.fee_types[0].amount, Money::from_paise(15010));
        assert_eq!(snapshot.fee_types[1].amount, Money::from_rupees(90));
        assert_eq!(snapshot.default_advance.bps(), 2550);
        assert_eq!(snapshot.hall_name.as_deref(), Some("Central Lounge"));
        assert_eq!(snapshot.last_synced, at);
    }

    #[test]
    fn test_hall_types_missing_types_is_malformed() {
        let result: Result<HallTypesResponse, _> =
            serde_json::from_value(json!({ "advance_payment_enabled": true }));
        assert!(result.is_err());

        let result: Result<HallTypesResponse, _> =
            serde_json::from_value(json!({ "types": [{ "type": "AC", "amount": 1.005 }] }));
        assert!(result.is_err());
    }
}

//! # Repository Module
//!
//! Database repository implementations for the local record store.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Layout                                    │
//! │                                                                         │
//! │  BookingService / sweeps                                               │
//! │       │                                                                 │
//! │       │  db.bookings().list_pending(SyncState::PendingCreate)          │
//! │       │  ↓                                                              │
//! │       ▼                                                                 │
//! │  BookingRepository                                                     │
//! │  ├── upsert(&self, record)                                             │
//! │  ├── get(&self, id)                                                    │
//! │  ├── list_pending(&self, state)                                        │
//! │  └── transition(&self, id, from, to)                                   │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`booking::BookingRepository`] - Booking records and their sync state
//! - [`settings::SettingsRepository`] - The cached settings snapshot

pub mod booking;
pub mod settings;

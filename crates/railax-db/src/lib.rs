//! # railax-db: Local Record Store
//!
//! SQLite persistence for bookings and the cached settings snapshot.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Railax Data Flow                                 │
//! │                                                                         │
//! │  BookingService / create sweep / update sweep                          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    railax-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │               │    │  (embedded)  │  │   │
//! │  │   │               │    │ BookingRepo   │    │ 001_init.sql │  │   │
//! │  │   │ SqlitePool    │◄───│ SettingsRepo  │    │              │  │   │
//! │  │   │ RecordLocks   │    │               │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database                             │   │
//! │  │            <platform data dir>/railax/railax.db                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`locks`] - Per-booking write locks
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Booking and settings repositories
//!
//! ## Usage
//!
//! ```rust,ignore
//! use railax_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("path/to/railax.db")).await?;
//! let stored = db.bookings().upsert(&record).await?;
//! let pending = db.bookings().count_pending().await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod locks;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use locks::RecordLocks;
pub use pool::{Database, DbConfig, DbLocation};

// Repository re-exports for convenience
pub use repository::booking::{AckSummary, BookingRepository};
pub use repository::settings::SettingsRepository;

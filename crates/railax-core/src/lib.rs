//! # railax-core: Pure Domain Logic for the Booking Sync Engine
//!
//! Everything the sync engine decides without touching a disk, a socket or
//! a clock lives here.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Railax Booking Sync                                 │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 Counter UI (external collaborator)              │   │
//! │  │     save booking ──► checkout ──► pending count ──► settings    │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │         railax-sync (BookingService, sweeps, classifier)        │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ railax-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌────────────┐  ┌──────────┐  │   │
//! │  │   │   types   │  │ sync_state│  │connectivity│  │ settings │  │   │
//! │  │   │  Booking  │  │ 0→1→2→3   │  │  tracker   │  │  expiry  │  │   │
//! │  │   └───────────┘  └───────────┘  └────────────┘  └──────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • NO CLOCK READS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  railax-db (local record store)                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Booking record, new-booking input, checkout
//! - [`sync_state`] - Per-record synchronization state machine
//! - [`connectivity`] - Failure counter and tri-state classification
//! - [`settings`] - Cached hall settings and their 8-hour expiry
//! - [`money`] - Integer paise with exact decimal parsing
//! - [`error`] - Domain error types
//! - [`validation`] - Booking input rules
//!
//! ## Example Usage
//!
//! ```rust
//! use railax_core::SyncState;
//!
//! let state = SyncState::Created;
//! assert_eq!(state.after_local_mutation(), Some(SyncState::PendingUpdate));
//! assert!(!state.can_transition_to(SyncState::PendingCreate));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod connectivity;
pub mod error;
pub mod money;
pub mod settings;
pub mod sync_state;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use connectivity::{ConnectivitySnapshot, ConnectivityState, ConnectivityTracker, ProbeOutcome};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use settings::{FeeType, Percentage, SettingsSnapshot};
pub use sync_state::SyncState;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Records per bulk-create request.
pub const CREATE_BATCH_SIZE: usize = 50;

/// Largest party a single booking may hold.
pub const MAX_PARTY_SIZE: i64 = 50;

/// Longest stay a single booking may cover.
///
/// ## Business Reason
/// Waiting halls bill by the hour; anything past two days is a typo.
pub const MAX_TOTAL_HOURS: i64 = 48;

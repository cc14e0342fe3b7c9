//! # railax-sync: Reconciliation Engine for Railax Booking Sync
//!
//! Keeps the local record store and the remote booking API converging while
//! the network comes and goes.
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Sync Engine Architecture                         │
//! │                                                                         │
//! │   Counter UI                                                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌──────────────────┐  reads   ┌───────────────────────────────────┐   │
//! │  │  BookingService  │◄─────────│  ConnectivityMonitor              │   │
//! │  │  save / complete │          │  5 s tick, 3 s probe              │   │
//! │  │  push / sync_now │          │  Good | Unstable | Disconnected   │   │
//! │  └───────┬──────────┘          └───────────────┬───────────────────┘   │
//! │          │                                     │ reads                  │
//! │          │                     ┌───────────────▼───────────────────┐   │
//! │          │                     │  SyncAgent (sweep loop)           │   │
//! │          │                     └───────────────┬───────────────────┘   │
//! │          ▼                                     ▼                        │
//! │  ┌──────────────────┐  ┌──────────────────┐  ┌──────────────────────┐  │
//! │  │  CreateSweep     │  │  UpdateSweep     │  │  SettingsCache       │  │
//! │  │  50 per batch    │  │  one at a time   │  │  one snapshot, 8 h   │  │
//! │  │  stop on failure │  │  continue        │  │  purged on read      │  │
//! │  └───────┬──────────┘  └───────┬──────────┘  └──────────┬───────────┘  │
//! │          └─────────────────────┼────────────────────────┘              │
//! │                                ▼                                        │
//! │                   BookingRemote (HttpRemote / reqwest)                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//! - [`agent`] - `SyncAgent` scheduler and its handle
//! - [`config`] - TOML + environment configuration
//! - [`connectivity`] - Reachability probe and classifier task
//! - [`create_sync`] - Bulk create sweep
//! - [`update_sync`] - Per-record update sweep
//! - [`settings_cache`] - TTL-bounded settings snapshot
//! - [`service`] - Foreground booking operations
//! - [`remote`] - Booking API client
//! - [`protocol`] - Wire DTOs
//! - [`error`] - Sync error types
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use railax_sync::{HttpRemote, NetProbe, SyncAgent, SyncConfig};
//!
//! let config = SyncConfig::load(None)?;
//! let remote = Arc::new(HttpRemote::from_config(&config)?);
//! let probe = Arc::new(NetProbe::from_config(&config));
//!
//! let agent = SyncAgent::new(&config, &database, remote, probe);
//! let service = agent.service();
//! let handle = agent.spawn();
//!
//! let outcome = service.save_booking(new_booking).await?;
//! println!("synced online: {}", outcome.is_synced());
//!
//! handle.shutdown(config.shutdown_timeout()).await;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod agent;
pub mod config;
pub mod connectivity;
pub mod create_sync;
pub mod error;
pub mod protocol;
pub mod remote;
pub mod service;
pub mod settings_cache;
pub mod update_sync;

// =============================================================================
// Re-exports
// =============================================================================

pub use agent::{AgentStatus, SyncAgent, SyncAgentHandle};
pub use config::SyncConfig;
pub use connectivity::{ConnectivityMonitor, ConnectivitySignal, NetProbe, ReachabilityProbe};
pub use create_sync::{CreateSweep, CreateSweepReport, SweepOptions};
pub use error::{ErrorCategory, SyncError, SyncResult};
pub use protocol::{CheckoutRequest, CreateBookingDto, HallTypesResponse};
pub use remote::{BookingRemote, CreateAck, HttpRemote};
pub use service::{BookingService, SaveOutcome, SyncReport};
pub use settings_cache::SettingsCache;
pub use update_sync::{UpdateSweep, UpdateSweepReport};

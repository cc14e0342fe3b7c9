//! # Connectivity Classification
//!
//! Turns a stream of probe outcomes into a tri-state link-quality signal.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │  tick outcome          consecutive_failures      state           │
//! │  ──────────────────    ────────────────────      ─────────────   │
//! │  probe ok              0                         Good            │
//! │  probe failed          +1 → 1..=2                Unstable        │
//! │  probe failed          +1 → 3..                  Disconnected    │
//! │  no interface          forced to 3               Disconnected    │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The tracker is plain data. The sync crate owns the timer that feeds it
//! and is the only writer; everyone else sees [`ConnectivitySnapshot`]s.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

/// Consecutive failures at which the link is considered down.
pub const DISCONNECT_THRESHOLD: u32 = 3;

/// Estimated link quality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ConnectivityState {
    Good,
    Unstable,
    Disconnected,
}

impl ConnectivityState {
    /// Classifies a consecutive-failure count.
    pub const fn from_failures(failures: u32) -> Self {
        match failures {
            0 => ConnectivityState::Good,
            f if f < DISCONNECT_THRESHOLD => ConnectivityState::Unstable,
            _ => ConnectivityState::Disconnected,
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            ConnectivityState::Good => "good",
            ConnectivityState::Unstable => "unstable",
            ConnectivityState::Disconnected => "disconnected",
        }
    }
}

impl fmt::Display for ConnectivityState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one classifier tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// The platform reports no usable network interface.
    NoInterface,
    /// The reachability probe answered in time.
    Reachable,
    /// The probe failed or timed out.
    Unreachable,
}

/// Read-only view of the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ConnectivitySnapshot {
    pub state: ConnectivityState,
    pub consecutive_failures: u32,
    /// `None` until the first tick completes.
    #[ts(as = "Option<String>")]
    pub last_checked: Option<DateTime<Utc>>,
}

impl Default for ConnectivitySnapshot {
    /// Before any probe has run the link is assumed good, so the first
    /// foreground save still attempts the remote.
    fn default() -> Self {
        ConnectivitySnapshot {
            state: ConnectivityState::Good,
            consecutive_failures: 0,
            last_checked: None,
        }
    }
}

/// Rolling failure counter behind the classifier.
#[derive(Debug, Clone, Default)]
pub struct ConnectivityTracker {
    snapshot: ConnectivitySnapshot,
}

impl ConnectivityTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one tick outcome into the counter and reclassifies.
    pub fn record(&mut self, outcome: ProbeOutcome, at: DateTime<Utc>) -> ConnectivitySnapshot {
        let failures = match outcome {
            ProbeOutcome::NoInterface => DISCONNECT_THRESHOLD,
            ProbeOutcome::Reachable => 0,
            ProbeOutcome::Unreachable => self.snapshot.consecutive_failures.saturating_add(1),
        };

        self.snapshot = ConnectivitySnapshot {
            state: ConnectivityState::from_failures(failures),
            consecutive_failures: failures,
            last_checked: Some(at),
        };
        self.snapshot
    }

    #[inline]
    pub fn snapshot(&self) -> ConnectivitySnapshot {
        self.snapshot
    }

    #[inline]
    pub fn state(&self) -> ConnectivityState {
        self.snapshot.state
    }
}

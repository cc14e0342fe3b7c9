//! # Connectivity Monitor
//!
//! Drives the classifier from `railax-core` on a fixed tick and publishes
//! each result to every reader.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  every probe_interval (5 s)                                             │
//! │                                                                         │
//! │  interface_up()? ── no ──► NoInterface  (failures forced to 3)          │
//! │        │                                                                │
//! │       yes                                                               │
//! │        ▼                                                                │
//! │  probe() within 3 s? ── yes ──► Reachable   (failures = 0)              │
//! │        │                                                                │
//! │        no ───────────────────► Unreachable (failures += 1)             │
//! │                                                                         │
//! │  ConnectivityTracker ──► watch::Sender ──► ConnectivitySignal (readers) │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The monitor is the only writer of the failure counter. Everyone else
//! holds a [`ConnectivitySignal`], which can only read.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpStream, UdpSocket};
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use railax_core::{ConnectivitySnapshot, ConnectivityState, ConnectivityTracker, ProbeOutcome};

// =============================================================================
// Probe Seam
// =============================================================================

/// Platform reachability checks.
#[async_trait]
pub trait ReachabilityProbe: Send + Sync {
    /// Whether any usable network interface exists.
    async fn interface_up(&self) -> bool;

    /// One reachability attempt against the well-known address.
    async fn probe(&self) -> bool;
}

/// Socket-based probe.
///
/// The interface check is a UDP `connect`, which only performs a route
/// lookup and sends nothing. The probe is a TCP connect bounded by the
/// probe timeout.
#[derive(Debug, Clone)]
pub struct NetProbe {
    addr: String,
    timeout: Duration,
}

impl NetProbe {
    pub fn new(addr: impl Into<String>, timeout: Duration) -> Self {
        NetProbe {
            addr: addr.into(),
            timeout,
        }
    }

    pub fn from_config(config: &crate::SyncConfig) -> Self {
        Self::new(config.connectivity.probe_addr.clone(), config.probe_timeout())
    }
}

#[async_trait]
impl ReachabilityProbe for NetProbe {
    async fn interface_up(&self) -> bool {
        let socket = match UdpSocket::bind("0.0.0.0:0").await {
            Ok(socket) => socket,
            Err(e) => {
                debug!(error = %e, "Cannot bind UDP socket");
                return false;
            }
        };
        socket.connect(&self.addr).await.is_ok()
    }

    async fn probe(&self) -> bool {
        match tokio::time::timeout(self.timeout, TcpStream::connect(&self.addr)).await {
            Ok(Ok(_)) => true,
            Ok(Err(e)) => {
                debug!(addr = %self.addr, error = %e, "Probe failed");
                false
            }
            Err(_) => {
                debug!(addr = %self.addr, timeout_ms = self.timeout.as_millis() as u64, "Probe timed out");
                false
            }
        }
    }
}

// =============================================================================
// Signal (read side)
// =============================================================================

/// Read-only handle on the latest classification.
#[derive(Debug, Clone)]
pub struct ConnectivitySignal {
    rx: watch::Receiver<ConnectivitySnapshot>,
}

impl ConnectivitySignal {
    /// A signal that never changes. The value survives the dropped sender.
    pub fn fixed(state: ConnectivityState) -> Self {
        let failures = match state {
            ConnectivityState::Good => 0,
            ConnectivityState::Unstable => 1,
            ConnectivityState::Disconnected => railax_core::connectivity::DISCONNECT_THRESHOLD,
        };
        let (_tx, rx) = watch::channel(ConnectivitySnapshot {
            state,
            consecutive_failures: failures,
            last_checked: None,
        });
        ConnectivitySignal { rx }
    }

    pub fn snapshot(&self) -> ConnectivitySnapshot {
        *self.rx.borrow()
    }

    pub fn state(&self) -> ConnectivityState {
        self.rx.borrow().state
    }

    /// Waits for the next published classification.
    ///
    /// Returns `None` once the monitor has gone away.
    pub async fn changed(&mut self) -> Option<ConnectivitySnapshot> {
        self.rx.changed().await.ok()?;
        Some(*self.rx.borrow_and_update())
    }
}

// =============================================================================
// Monitor (write side)
// =============================================================================

/// Owns the failure counter and advances it once per tick.
pub struct ConnectivityMonitor {
    probe: Arc<dyn ReachabilityProbe>,
    tracker: ConnectivityTracker,
    tx: watch::Sender<ConnectivitySnapshot>,
}

impl ConnectivityMonitor {
    pub fn new(probe: Arc<dyn ReachabilityProbe>) -> Self {
        let tracker = ConnectivityTracker::new();
        let (tx, _rx) = watch::channel(tracker.snapshot());
        ConnectivityMonitor { probe, tracker, tx }
    }

    pub fn signal(&self) -> ConnectivitySignal {
        ConnectivitySignal {
            rx: self.tx.subscribe(),
        }
    }

    pub fn snapshot(&self) -> ConnectivitySnapshot {
        self.tracker.snapshot()
    }

    /// Runs one classifier tick and publishes the result.
    pub async fn tick(&mut self) -> ConnectivitySnapshot {
        let outcome = if !self.probe.interface_up().await {
            ProbeOutcome::NoInterface
        } else if self.probe.probe().await {
            ProbeOutcome::Reachable
        } else {
            ProbeOutcome::Unreachable
        };

        let previous = self.tracker.state();
        let snapshot = self.tracker.record(outcome, Utc::now());

        if snapshot.state != previous {
            match snapshot.state {
                ConnectivityState::Good => info!("Connectivity restored"),
                ConnectivityState::Unstable => warn!(
                    failures = snapshot.consecutive_failures,
                    "Connectivity unstable"
                ),
                ConnectivityState::Disconnected => warn!(
                    failures = snapshot.consecutive_failures,
                    no_interface = outcome == ProbeOutcome::NoInterface,
                    "Connectivity lost"
                ),
            }
        } else {
            debug!(
                state = snapshot.state.as_str(),
                failures = snapshot.consecutive_failures,
                "Connectivity tick"
            );
        }

        self.tx.send_replace(snapshot);
        snapshot
    }

    /// Ticks every `interval` until `shutdown` flips to true or its sender
    /// is dropped. The first tick runs immediately.
    pub async fn run(mut self, interval: Duration, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(interval_secs = interval.as_secs(), "Connectivity monitor started");

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.tick().await;
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!("Connectivity monitor stopped");
    }
}

//! # Sync Agent
//!
//! Background scheduler. Runs the connectivity monitor and a sweep loop,
//! and takes commands from a [`SyncAgentHandle`].
//!
//! ## Agent Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        SyncAgent Architecture                           │
//! │                                                                         │
//! │  ┌────────────────────────┐        ┌────────────────────────────────┐  │
//! │  │  ConnectivityMonitor   │ watch  │          Sweep loop            │  │
//! │  │  (probe every 5 s)     │───────►│                                │  │
//! │  └────────────────────────┘        │  every sweep_interval:         │  │
//! │                                    │    Disconnected? skip          │  │
//! │  ┌────────────────────────┐ mpsc   │    else create sweep           │  │
//! │  │  SyncAgentHandle       │───────►│         then update sweep      │  │
//! │  │  sync_now / shutdown   │        │                                │  │
//! │  │  status (shared state) │◄───────│  writes AgentStatus            │  │
//! │  └────────────────────────┘        └────────────────────────────────┘  │
//! │                                                                         │
//! │  The monitor is the only writer of the failure counter; the loop and   │
//! │  the foreground service only read it.                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use railax_core::{ConnectivitySnapshot, ConnectivityState};
use railax_db::Database;

use crate::config::SyncConfig;
use crate::connectivity::{ConnectivityMonitor, ConnectivitySignal, ReachabilityProbe};
use crate::create_sync::CreateSweepReport;
use crate::error::{SyncError, SyncResult};
use crate::remote::BookingRemote;
use crate::service::{BookingService, SyncReport};
use crate::update_sync::UpdateSweepReport;

// =============================================================================
// Agent Status
// =============================================================================

/// Current agent status for external queries.
#[derive(Debug, Clone, Default)]
pub struct AgentStatus {
    pub connectivity: ConnectivitySnapshot,

    /// Reports from the most recent sweep.
    pub last_create: Option<CreateSweepReport>,
    pub last_update: Option<UpdateSweepReport>,

    pub last_sweep_at: Option<DateTime<Utc>>,

    /// Storage error from the most recent sweep, if it failed.
    pub last_error: Option<String>,

    /// `PendingCreate` + `PendingUpdate` after the most recent sweep.
    pub pending_count: i64,

    /// Scheduled sweeps skipped because the link was down.
    pub skipped_sweeps: u64,
}

// =============================================================================
// Commands
// =============================================================================

enum AgentCommand {
    SyncNow(oneshot::Sender<SyncResult<SyncReport>>),
    Shutdown,
}

// =============================================================================
// Sync Agent
// =============================================================================

pub struct SyncAgent {
    service: BookingService,
    monitor: ConnectivityMonitor,
    signal: ConnectivitySignal,
    probe_interval: Duration,
    sweep_interval: Duration,
    sweeps_enabled: bool,
}

impl SyncAgent {
    /// Wires the monitor, the service and the sweep settings together.
    pub fn new(
        config: &SyncConfig,
        db: &Database,
        remote: Arc<dyn BookingRemote>,
        probe: Arc<dyn ReachabilityProbe>,
    ) -> Self {
        let monitor = ConnectivityMonitor::new(probe);
        let signal = monitor.signal();
        let service = BookingService::new(db, remote, signal.clone(), config.sweep_options());

        SyncAgent {
            service,
            monitor,
            signal,
            probe_interval: config.probe_interval(),
            sweep_interval: config.sweep_interval(),
            sweeps_enabled: config.sync.enabled,
        }
    }

    /// The foreground service sharing this agent's connectivity signal.
    pub fn service(&self) -> BookingService {
        self.service.clone()
    }

    /// Starts the monitor and the sweep loop.
    pub fn spawn(self) -> SyncAgentHandle {
        let (cmd_tx, cmd_rx) = mpsc::channel(8);
        let (stop_tx, stop_rx) = watch::channel(false);
        let status = Arc::new(RwLock::new(AgentStatus::default()));

        info!(
            probe_interval_secs = self.probe_interval.as_secs(),
            sweep_interval_secs = self.sweep_interval.as_secs(),
            sweeps_enabled = self.sweeps_enabled,
            "Starting sync agent"
        );

        let monitor = tokio::spawn(self.monitor.run(self.probe_interval, stop_rx.clone()));

        let sweep_loop = tokio::spawn(Self::sweep_loop(
            self.service.clone(),
            self.signal.clone(),
            status.clone(),
            self.sweep_interval,
            self.sweeps_enabled,
            cmd_rx,
            stop_rx,
        ));

        SyncAgentHandle {
            cmd_tx,
            stop_tx,
            status,
            signal: self.signal,
            service: self.service,
            tasks: vec![sweep_loop, monitor],
        }
    }

    async fn sweep_loop(
        service: BookingService,
        signal: ConnectivitySignal,
        status: Arc<RwLock<AgentStatus>>,
        interval: Duration,
        enabled: bool,
        mut cmd_rx: mpsc::Receiver<AgentCommand>,
        mut stop_rx: watch::Receiver<bool>,
    ) {
        let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick(), if enabled => {
                    if signal.state() == ConnectivityState::Disconnected {
                        debug!("Disconnected; skipping scheduled sweep");
                        status.write().await.skipped_sweeps += 1;
                        continue;
                    }
                    Self::sweep(&service, &status).await;
                }

                cmd = cmd_rx.recv() => match cmd {
                    Some(AgentCommand::SyncNow(reply)) => {
                        let result = Self::sweep(&service, &status).await;
                        let _ = reply.send(result);
                    }
                    Some(AgentCommand::Shutdown) | None => {
                        info!("Sweep loop received shutdown");
                        break;
                    }
                },

                changed = stop_rx.changed() => {
                    if changed.is_err() || *stop_rx.borrow() {
                        break;
                    }
                }
            }
        }

        info!("Sweep loop stopped");
    }

    async fn sweep(service: &BookingService, status: &RwLock<AgentStatus>) -> SyncResult<SyncReport> {
        let result = service.sync_now().await;
        let pending = service.pending_count().await;

        let mut s = status.write().await;
        s.last_sweep_at = Some(Utc::now());
        if let Ok(count) = pending {
            s.pending_count = count;
        }

        match &result {
            Ok(report) => {
                s.last_create = Some(report.create.clone());
                s.last_update = Some(report.update);
                s.last_error = None;
            }
            Err(e) => {
                error!(error = %e, "Sweep failed");
                s.last_error = Some(e.to_string());
            }
        }

        result
    }
}

// =============================================================================
// Agent Handle (for external control)
// =============================================================================

/// Handle for controlling a running [`SyncAgent`].
pub struct SyncAgentHandle {
    cmd_tx: mpsc::Sender<AgentCommand>,
    stop_tx: watch::Sender<bool>,
    status: Arc<RwLock<AgentStatus>>,
    signal: ConnectivitySignal,
    service: BookingService,
    tasks: Vec<JoinHandle<()>>,
}

impl SyncAgentHandle {
    /// Runs a create sweep and an update sweep now, regardless of the
    /// classifier, and returns their reports.
    pub async fn sync_now(&self) -> SyncResult<SyncReport> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.cmd_tx
            .send(AgentCommand::SyncNow(reply_tx))
            .await
            .map_err(|_| SyncError::ShuttingDown)?;
        reply_rx.await.map_err(|_| SyncError::ShuttingDown)?
    }

    pub async fn status(&self) -> AgentStatus {
        let mut status = self.status.read().await.clone();
        status.connectivity = self.signal.snapshot();
        status
    }

    pub fn service(&self) -> BookingService {
        self.service.clone()
    }

    /// Stops the loop and the monitor, then drains detached service work.
    /// Each stage waits at most `timeout` before aborting.
    pub async fn shutdown(self, timeout: Duration) {
        info!("Shutting down sync agent");

        let _ = self.cmd_tx.try_send(AgentCommand::Shutdown);
        let _ = self.stop_tx.send(true);

        for task in self.tasks {
            let abort = task.abort_handle();
            match tokio::time::timeout(timeout, task).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) if e.is_cancelled() => {}
                Ok(Err(e)) => error!(error = %e, "Agent task panicked"),
                Err(_) => {
                    warn!(timeout_ms = timeout.as_millis() as u64, "Agent task did not stop; aborting");
                    abort.abort();
                }
            }
        }

        self.service.shutdown(timeout).await;

        info!("Sync agent stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use railax_db::DbConfig;

    use crate::protocol::{CheckoutRequest, CreateBookingDto, HallTypesResponse};
    use crate::remote::CreateAck;

    struct AcceptAll;

    #[async_trait]
    impl BookingRemote for AcceptAll {
        async fn create_bookings(&self, _batch: &[CreateBookingDto]) -> SyncResult<CreateAck> {
            Ok(CreateAck::Accepted)
        }
        async fn checkout(&self, _request: &CheckoutRequest) -> SyncResult<()> {
            Ok(())
        }
        async fn fetch_settings(&self, _admin_id: &str) -> SyncResult<HallTypesResponse> {
            Err(SyncError::Offline("test".into()))
        }
    }

    struct NoInterface;

    #[async_trait]
    impl ReachabilityProbe for NoInterface {
        async fn interface_up(&self) -> bool {
            false
        }
        async fn probe(&self) -> bool {
            false
        }
    }

    fn config() -> SyncConfig {
        let mut config = SyncConfig::default();
        config.connectivity.probe_interval_secs = 1;
        config.connectivity.probe_timeout_secs = 1;
        config.sync.sweep_interval_secs = 3600;
        config.sync.batch_pause_ms = 0;
        config.sync.item_pause_ms = 0;
        config
    }

    #[tokio::test]
    async fn test_sync_now_runs_even_when_disconnected() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let agent = SyncAgent::new(&config(), &db, Arc::new(AcceptAll), Arc::new(NoInterface));
        let handle = agent.spawn();

        let report = handle.sync_now().await.unwrap();
        assert_eq!(report.create.pending, 0);
        assert_eq!(report.update.attempted(), 0);

        let status = handle.status().await;
        assert!(status.last_sweep_at.is_some());
        assert_eq!(status.pending_count, 0);

        handle.shutdown(Duration::from_secs(2)).await;
    }

    #[tokio::test]
    async fn test_scheduled_sweeps_skip_while_disconnected() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut config = config();
        config.sync.sweep_interval_secs = 10;

        // Skipped sweeps never reach the database, so a paused clock is safe.
        tokio::time::pause();
        let handle = SyncAgent::new(&config, &db, Arc::new(AcceptAll), Arc::new(NoInterface)).spawn();

        tokio::time::sleep(Duration::from_secs(35)).await;

        let status = handle.status().await;
        assert_eq!(status.connectivity.state, ConnectivityState::Disconnected);
        assert_eq!(status.skipped_sweeps, 3);
        assert!(status.last_sweep_at.is_none());
        assert!(status.last_create.is_none());

        handle.shutdown(Duration::from_secs(2)).await;
    }

    #[tokio::test]
    async fn test_commands_after_shutdown_fail() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let agent = SyncAgent::new(&config(), &db, Arc::new(AcceptAll), Arc::new(NoInterface));
        let handle = agent.spawn();

        let _ = handle.cmd_tx.send(AgentCommand::Shutdown).await;
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert!(matches!(handle.sync_now().await, Err(SyncError::ShuttingDown)));
        handle.shutdown(Duration::from_secs(2)).await;
    }
}

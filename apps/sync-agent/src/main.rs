//! # Railax Sync Agent
//!
//! Headless daemon that keeps the local booking store converging with the
//! remote booking API.
//!
//! ## Usage
//! ```bash
//! # Run until Ctrl+C / SIGTERM with the default config location
//! sync-agent
//!
//! # Explicit config file
//! sync-agent --config ./sync.toml
//!
//! # One create + update sweep, then exit
//! sync-agent --once
//!
//! # Write the effective configuration and exit
//! sync-agent --config ./sync.toml --write-config
//! ```
//!
//! ## Environment Variables
//! - `RUST_LOG`: log filter (default `info,railax=debug,sqlx=warn`)
//! - `RAILAX_DB_PATH`, `RAILAX_REMOTE_URL`, `RAILAX_SYNC_ENABLED`,
//!   `RAILAX_SWEEP_INTERVAL_SECS`, `RAILAX_PROBE_ADDR`: config overrides

use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use railax_core::ConnectivityState;
use railax_db::{Database, DbConfig};
use railax_sync::{HttpRemote, NetProbe, SyncAgent, SyncConfig};

struct Args {
    config: Option<PathBuf>,
    once: bool,
    write_config: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let Some(args) = parse_args() else {
        return Ok(());
    };

    let config = SyncConfig::load(args.config.clone())?;

    if args.write_config {
        config.save(args.config)?;
        return Ok(());
    }

    info!(
        db = %config.database.path.display(),
        remote = %config.remote.base_url,
        "Starting Railax sync agent v{}",
        env!("CARGO_PKG_VERSION")
    );

    if let Some(parent) = config.database.path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let db = Database::new(DbConfig::new(config.database.path.clone())).await?;

    let remote = Arc::new(HttpRemote::from_config(&config)?);
    let probe = Arc::new(NetProbe::from_config(&config));

    let handle = SyncAgent::new(&config, &db, remote, probe).spawn();

    if args.once {
        match handle.sync_now().await {
            Ok(report) => info!(
                created = report.create.created,
                still_pending_create = report
                    .create
                    .pending
                    .saturating_sub(report.create.created + report.create.requeued),
                update_success = report.update.success,
                update_fail = report.update.fail,
                "Sweep complete"
            ),
            Err(e) => error!(error = %e, "Sweep failed"),
        }

        let status = handle.status().await;
        if status.connectivity.state == ConnectivityState::Disconnected {
            warn!("Link classified as disconnected; records stay queued locally");
        }
    } else {
        shutdown_signal().await;
    }

    handle.shutdown(config.shutdown_timeout()).await;
    db.close().await;

    info!("Sync agent exited");
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,railax=debug,sqlx=warn"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Returns `None` when the process should exit without running (`--help`).
fn parse_args() -> Option<Args> {
    let args: Vec<String> = env::args().collect();

    let mut parsed = Args {
        config: None,
        once: false,
        write_config: false,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" | "-c" => {
                if i + 1 < args.len() {
                    parsed.config = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--once" => parsed.once = true,
            "--write-config" => parsed.write_config = true,
            "--help" | "-h" => {
                println!("Railax Sync Agent");
                println!();
                println!("Usage: sync-agent [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --config <PATH>   Config file (default: platform config dir/sync.toml)");
                println!("      --once            Run one create + update sweep, then exit");
                println!("      --write-config    Write the effective config to the config path and exit");
                println!("  -h, --help            Show this help message");
                return None;
            }
            other => warn!(arg = %other, "Ignoring unknown argument"),
        }
        i += 1;
    }

    Some(parsed)
}

/// Waits for Ctrl+C or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}

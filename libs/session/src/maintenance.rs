//! Background maintenance: duplicate expiry and orphaned pending cleanup.
//!
//! One low-frequency task. Each sweep takes per-record locks only, so
//! request handling never waits on a whole pass.

use crate::correlator::AckCorrelator;
use crate::duplicate::DuplicateStore;
use crate::error::SessionResult;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

/// Records removed by one sweep
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub duplicates_removed: usize,
    pub orphans_removed: usize,
}

/// Run one sweep of both stores
pub async fn run_sweep(duplicates: &DuplicateStore, correlator: &AckCorrelator) -> SessionResult<SweepReport> {
    let duplicates_removed = duplicates.sweep_expired().await?;
    let orphans_removed = correlator.sweep_orphans().await?;
    Ok(SweepReport {
        duplicates_removed,
        orphans_removed,
    })
}

/// Handle to the running sweeper
#[derive(Debug)]
pub struct MaintenanceHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl MaintenanceHandle {
    /// Signal the sweeper and wait for it to stop
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.task.await {
            error!(error = %e, "Maintenance task ended abnormally");
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

/// Spawn the sweeper; the first sweep runs one `interval` after start
pub fn spawn_maintenance(
    duplicates: Arc<DuplicateStore>,
    correlator: AckCorrelator,
    interval: Duration,
) -> MaintenanceHandle {
    let (shutdown, mut shutdown_rx) = watch::channel(false);

    let task = tokio::spawn(async move {
        let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(interval_secs = interval.as_secs(), "Maintenance sweeper started");

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match run_sweep(&duplicates, &correlator).await {
                        Ok(report) => debug!(
                            duplicates_removed = report.duplicates_removed,
                            orphans_removed = report.orphans_removed,
                            "Maintenance sweep complete"
                        ),
                        Err(e) => error!(error = %e, "Maintenance sweep failed"),
                    }
                }
                changed = shutdown_rx.changed() => {
                    if changed.is_err() || *shutdown_rx.borrow() {
                        break;
                    }
                }
            }
        }

        info!("Maintenance sweeper stopped");
    });

    MaintenanceHandle { shutdown, task }
}

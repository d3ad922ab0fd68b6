//! Background rotation loop.
//!
//! Rotation also happens lazily on every meter call, but a bot with no
//! traffic would otherwise keep yesterday's counters until its next event.
//! The scheduler ticks on a fixed interval so windows roll over regardless.

use crate::meter::usage::UsageMeter;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Default interval between rotation checks.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(60);

/// Handle to a running rotation loop.
#[derive(Debug)]
pub struct RotationScheduler {
    handle: JoinHandle<()>,
    shutdown_tx: watch::Sender<bool>,
}

impl RotationScheduler {
    /// Spawn the loop on the current Tokio runtime.
    ///
    /// The first check runs immediately, so a process restarted after a
    /// missed boundary rotates without waiting a full interval.
    pub fn spawn(meter: Arc<UsageMeter>, interval: Duration) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(rotation_loop(meter, interval, shutdown_rx));
        Self {
            handle,
            shutdown_tx,
        }
    }

    /// Whether the loop has exited.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Signal the loop to stop and wait for it.
    ///
    /// A rotation already in progress completes first; the loop only
    /// observes the signal between ticks.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
        if let Err(e) = self.handle.await {
            tracing::warn!(error = %e, "rotation scheduler task failed");
        }
    }
}

async fn rotation_loop(
    meter: Arc<UsageMeter>,
    interval: Duration,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    tracing::debug!(interval_secs = interval.as_secs(), "rotation scheduler started");

    loop {
        if *shutdown_rx.borrow() {
            break;
        }

        match meter.rotate().await {
            Ok(rotation) if rotation.any() => {
                tracing::debug!(
                    daily = rotation.daily,
                    monthly = rotation.monthly,
                    "scheduled rotation applied"
                );
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(error = %e, "scheduled rotation failed, retrying next tick");
            }
        }

        tokio::select! {
            biased;
            changed = shutdown_rx.changed() => {
                // A dropped sender means nobody can stop us later either.
                if changed.is_err() || *shutdown_rx.borrow() {
                    break;
                }
            }
            _ = tokio::time::sleep(interval) => {}
        }
    }

    tracing::debug!("rotation scheduler stopped");
}

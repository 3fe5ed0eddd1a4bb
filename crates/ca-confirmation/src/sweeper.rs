//! # Confirmation Sweeper
//!
//! Background task that periodically evicts and disposes of certificates
//! whose confirmation never arrived.
//!
//! The sweeper:
//! 1. Ticks on a fixed interval, skipping missed ticks
//! 2. Runs each sweep as its own task so a slow store never delays the timer
//! 3. Skips a tick while the previous sweep is still running
//! 4. On shutdown stops ticking and waits for the in-flight sweep to finish

use crate::domain::{ConfirmationError, SweepOutcome};
use crate::ports::inbound::ConfirmationApi;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::{JoinError, JoinHandle, JoinSet};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

/// Interval used when a zero interval is requested.
pub const MIN_SWEEP_INTERVAL: Duration = Duration::from_millis(100);

/// Handle to a running sweeper task.
///
/// Dropping the handle without calling `shutdown` also stops the loop,
/// but does not wait for it.
pub struct ConfirmationSweeper {
    shutdown_tx: watch::Sender<bool>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl ConfirmationSweeper {
    /// Spawns the sweep loop on the current tokio runtime.
    ///
    /// Intervals shorter than `MIN_SWEEP_INTERVAL` are raised to it.
    pub fn spawn(api: Arc<dyn ConfirmationApi>, interval: Duration) -> Self {
        if interval < MIN_SWEEP_INTERVAL {
            warn!(
                requested_ms = interval.as_millis() as u64,
                min_ms = MIN_SWEEP_INTERVAL.as_millis() as u64,
                "Sweep interval too short, clamping"
            );
        }
        let interval = interval.max(MIN_SWEEP_INTERVAL);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(run_sweep_loop(api, interval, shutdown_rx));

        Self {
            shutdown_tx,
            handle: Mutex::new(Some(handle)),
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle
            .lock()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Stops scheduling sweeps and waits for in-flight ones to complete.
    pub async fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);

        let handle = self.handle.lock().take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                error!(error = %e, "Confirmation sweeper task failed");
            }
        }
    }
}

async fn run_sweep_loop(
    api: Arc<dyn ConfirmationApi>,
    interval: Duration,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut in_flight: JoinSet<Result<SweepOutcome, ConfirmationError>> = JoinSet::new();

    info!(
        interval_ms = interval.as_millis() as u64,
        "Confirmation sweeper started"
    );

    loop {
        tokio::select! {
            biased;

            _ = shutdown_rx.changed() => {
                info!(in_flight = in_flight.len(), "Confirmation sweeper shutting down");
                break;
            }
            Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                report(joined);
            }
            _ = ticker.tick() => {
                if !in_flight.is_empty() {
                    debug!("Previous sweep still running, skipping tick");
                    continue;
                }
                let api = Arc::clone(&api);
                in_flight.spawn(async move { api.sweep().await });
            }
        }
    }

    while let Some(joined) = in_flight.join_next().await {
        report(joined);
    }
    info!("Confirmation sweeper stopped");
}

fn report(joined: Result<Result<SweepOutcome, ConfirmationError>, JoinError>) {
    match joined {
        Ok(Ok(outcome)) if outcome.is_empty() => {}
        Ok(Ok(outcome)) => {
            debug!(
                evicted = outcome.evicted_count(),
                disposed = outcome.disposed,
                failed = outcome.failed,
                slow = outcome.slow_dispositions,
                "Sweep finished"
            );
        }
        Ok(Err(e)) => warn!(error = %e, "Sweep failed"),
        Err(e) => error!(error = %e, "Sweep task panicked"),
    }
}

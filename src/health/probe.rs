//! Periodic health probe task.
//!
//! # Responsibilities
//! - Run a check on a fixed period
//! - Stop when cancelled or when the owner is gone

use std::future::Future;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

/// Shortest period accepted; `interval_at` panics on zero.
const MIN_INTERVAL: Duration = Duration::from_secs(1);

/// Handle to a running probe task.
#[derive(Debug)]
pub struct ProbeTask {
    stop: broadcast::Sender<()>,
    task: JoinHandle<()>,
}

impl ProbeTask {
    /// Spawn a probe that calls `check` every `interval`.
    ///
    /// The first check runs one full interval after spawning. Intervals
    /// shorter than one second are raised to it. The loop ends when `check`
    /// resolves to `false` or the task is cancelled.
    pub fn spawn<F, Fut>(interval: Duration, check: F) -> Self
    where
        F: Fn() -> Fut + Send + 'static,
        Fut: Future<Output = bool> + Send + 'static,
    {
        let interval = interval.max(MIN_INTERVAL);
        let (stop, mut stopped) = broadcast::channel(1);

        let task = tokio::spawn(async move {
            tracing::debug!(interval_secs = interval.as_secs(), "Health probe starting");

            let mut ticker = time::interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if !check().await {
                            tracing::debug!("Health probe owner dropped, exiting loop");
                            break;
                        }
                    }
                    _ = stopped.recv() => {
                        tracing::debug!("Health probe received shutdown signal, exiting loop");
                        break;
                    }
                }
            }
        });

        Self { stop, task }
    }

    /// Whether the task is still running.
    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    /// Stop the task and wait for it to exit.
    pub async fn cancel(self) {
        let _ = self.stop.send(());
        if let Err(e) = self.task.await {
            tracing::warn!(error = %e, "Health probe task ended abnormally");
        }
    }
}

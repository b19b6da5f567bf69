use super::engine::ReservationEngine;
use crate::error::ReservationError;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Periodically expires lapsed holds through [`ReservationEngine::sweep`].
///
/// Sweeps run one after another on a single task, so a slow sweep delays the
/// next tick instead of overlapping with it. Failures are logged and retried
/// on the next tick.
pub struct ExpirySweeper {
    engine: Arc<ReservationEngine>,
    interval: Duration,
}

/// Handle to a sweeper running on its own task.
pub struct SweeperHandle {
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<usize>,
}

impl ExpirySweeper {
    pub fn new(engine: Arc<ReservationEngine>, interval: Duration) -> Self {
        Self { engine, interval }
    }

    /// Builds a sweeper using the engine's configured interval.
    pub fn from_engine(engine: Arc<ReservationEngine>) -> Self {
        let interval = engine.config().sweep_interval;
        Self::new(engine, interval)
    }

    /// Sweeps on every tick until `shutdown` resolves.
    ///
    /// Returns the total number of reservations expired while running.
    pub async fn run<F>(self, shutdown: F) -> usize
    where
        F: Future<Output = ()>,
    {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tokio::pin!(shutdown);

        let mut total = 0;
        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                _ = ticker.tick() => total += self.tick().await,
            }
        }

        tracing::info!("Expiry sweeper stopped after expiring {} reservation(s)", total);
        total
    }

    /// Starts the sweeper on a background task.
    ///
    /// Dropping the returned handle also stops the sweeper.
    pub fn spawn(self) -> SweeperHandle {
        let (shutdown, stop) = oneshot::channel();
        let task = tokio::spawn(self.run(async move {
            let _ = stop.await;
        }));
        SweeperHandle { shutdown, task }
    }

    async fn tick(&self) -> usize {
        match self.engine.sweep().await {
            Ok(0) => 0,
            Ok(count) => {
                tracing::info!("Expired {} reservation(s)", count);
                count
            }
            Err(ReservationError::PartialSweep { processed, source }) => {
                tracing::warn!(
                    "Sweep stopped after expiring {} reservation(s): {}",
                    processed,
                    source
                );
                processed
            }
            Err(e) => {
                tracing::error!("Sweep failed: {}", e);
                0
            }
        }
    }
}

impl SweeperHandle {
    /// Stops the sweeper and waits for the in-flight sweep to finish.
    ///
    /// Returns the total number of reservations it expired.
    pub async fn shutdown(self) -> usize {
        let _ = self.shutdown.send(());
        self.task.await.unwrap_or_else(|e| {
            tracing::error!("Sweeper task failed: {}", e);
            0
        })
    }
}

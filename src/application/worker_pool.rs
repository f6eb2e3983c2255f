use crate::config::PoolConfig;
use crate::domain::ports::QueueHandler;
use crate::infrastructure::queue::WorkQueue;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::{JoinError, JoinHandle, JoinSet};
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::{debug, error, info};

/// Drains a [`WorkQueue`] in batches on a fixed interval.
///
/// Each tick takes at most `fan_out` entries and hands every entry to its own
/// task, so entries of one batch are processed concurrently. Nothing is drained
/// between ticks.
pub struct WorkerPool<T> {
    queue: Arc<WorkQueue<T>>,
    handler: Arc<dyn QueueHandler<T>>,
    fan_out: usize,
    tick_interval: Duration,
}

impl<T: Send + 'static> WorkerPool<T> {
    pub fn new(
        queue: Arc<WorkQueue<T>>,
        handler: Arc<dyn QueueHandler<T>>,
        config: &PoolConfig,
    ) -> Self {
        Self {
            queue,
            handler,
            fan_out: config.fan_out,
            tick_interval: config.tick_interval,
        }
    }

    pub fn name(&self) -> &'static str {
        self.queue.name()
    }

    /// Spawns one task per dequeued entry into `tasks` and returns how many
    /// were spawned. Never waits for entries to arrive.
    pub async fn dispatch(&self, tasks: &mut JoinSet<()>) -> usize {
        if self.queue.is_empty() {
            return 0;
        }
        let batch = self.queue.dequeue_batch(self.fan_out).await;
        let spawned = batch.len();
        for item in batch {
            let handler = self.handler.clone();
            tasks.spawn(async move { handler.handle(item).await });
        }
        debug!(pool = self.name(), spawned, remaining = self.queue.len(), "tick dispatched");
        spawned
    }

    /// Runs a single tick and waits for every task it spawned.
    pub async fn tick(&self) -> usize {
        let mut tasks = JoinSet::new();
        let spawned = self.dispatch(&mut tasks).await;
        while let Some(result) = tasks.join_next().await {
            self.report(result);
        }
        spawned
    }

    /// Ticks until `shutdown` flips to `true`, then waits for in-flight tasks.
    pub async fn run(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = interval_at(Instant::now() + self.tick_interval, self.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut tasks = JoinSet::new();
        info!(
            pool = self.name(),
            fan_out = self.fan_out,
            interval_ms = self.tick_interval.as_millis() as u64,
            "worker pool started"
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    while let Some(result) = tasks.try_join_next() {
                        self.report(result);
                    }
                    self.dispatch(&mut tasks).await;
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        let in_flight = tasks.len();
        info!(pool = self.name(), in_flight, "worker pool stopping");
        while let Some(result) = tasks.join_next().await {
            self.report(result);
        }
    }

    pub fn spawn(self: Arc<Self>, shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }

    fn report(&self, result: Result<(), JoinError>) {
        if let Err(e) = result {
            error!(pool = self.name(), error = %e, "worker task failed");
        }
    }
}

//! Scheduler driving periodic collection cycles.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};
use tokio::sync::Notify;
use tokio::task::JoinHandle;

use crate::pipeline::CollectionPipeline;

/// Runs the collection pipeline once at startup, then at a fixed interval
/// until stopped.
///
/// The running flag is the single piece of shared scheduler state; `start`
/// and `stop` transition it with one atomic compare-exchange each, so racing
/// callers resolve to exactly one active timer loop. Cycle errors and panics
/// are confined to the cycle boundary; only `stop` ends the loop.
pub struct Scheduler {
    pipeline: Arc<CollectionPipeline>,
    interval: Duration,
    running: Arc<AtomicBool>,
    shutdown: Arc<Notify>,
    handle: std::sync::Mutex<Option<JoinHandle<()>>>,
}

impl Scheduler {
    pub fn new(pipeline: Arc<CollectionPipeline>, interval: Duration) -> Self {
        Self {
            pipeline,
            interval,
            running: Arc::new(AtomicBool::new(false)),
            shutdown: Arc::new(Notify::new()),
            handle: std::sync::Mutex::new(None),
        }
    }

    /// Whether the periodic loop is active.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Start the periodic loop: one immediate cycle, then one per interval.
    /// Calling `start` while already running is a no-op.
    pub fn start(&self) {
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!("Scheduler already running, ignoring start");
            return;
        }

        info!(
            "Starting collection scheduler (interval {:?})",
            self.interval
        );

        let pipeline = Arc::clone(&self.pipeline);
        let running = Arc::clone(&self.running);
        let shutdown = Arc::clone(&self.shutdown);
        let interval = self.interval;

        let handle = tokio::spawn(async move {
            // Fixed-period ticks: a slow cycle must not push the next cycle's
            // start time back. The first tick completes immediately.
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = shutdown.notified() => break,
                    _ = ticker.tick() => {}
                }
                if !running.load(Ordering::SeqCst) {
                    break;
                }

                // Run the cycle on its own task so a panic inside an
                // enumerator cannot take the timer loop down with it. The
                // flag is re-checked inside the task: a stop that lands
                // between the tick and the spawn must not start a cycle.
                let cycle = {
                    let pipeline = Arc::clone(&pipeline);
                    let running = Arc::clone(&running);
                    tokio::spawn(async move {
                        if running.load(Ordering::SeqCst) {
                            pipeline.run_cycle().await;
                        }
                    })
                };
                if let Err(e) = cycle.await {
                    warn!("Collection cycle aborted: {}", e);
                }

                // A stop issued during the cycle has no waiter to notify;
                // catch it here instead of waiting out the next tick
                if !running.load(Ordering::SeqCst) {
                    break;
                }
            }
            debug!("Scheduler loop exited");
        });

        if let Ok(mut slot) = self.handle.lock() {
            *slot = Some(handle);
        }
    }

    /// Stop the periodic loop. No new cycle starts after this returns; a
    /// cycle already in progress finishes up to its own deadline.
    pub fn stop(&self) {
        if self
            .running
            .compare_exchange(true, false, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!("Scheduler already stopped, ignoring stop");
            return;
        }

        self.shutdown.notify_waiters();
        info!("Collection scheduler stopped");
    }

    /// Wait for the timer loop task to finish. Intended for shutdown paths
    /// after `stop`.
    pub async fn join(&self) {
        let handle = match self.handle.lock() {
            Ok(mut slot) => slot.take(),
            Err(_) => None,
        };
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                warn!("Scheduler task ended abnormally: {}", e);
            }
        }
    }
}

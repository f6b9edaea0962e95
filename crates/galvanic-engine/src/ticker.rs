//! The flow ticker: a tokio task that feeds `FlowTick` events to the loop.
//!
//! The ticker never touches the simulation. It only sends ticks stamped
//! with the epoch it was started under; the simulation ignores ticks whose
//! epoch is no longer current. [`FlowTicker::sync`] keeps the task in step
//! with the simulation's timer state after every event.

use std::time::Duration;

use galvanic_core::{FlowTimer, SimEvent};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

/// Owner of the running tick task, if any.
#[derive(Debug)]
pub struct FlowTicker {
    interval: Duration,
    tx: mpsc::Sender<SimEvent>,
    running: Option<(u64, JoinHandle<()>)>,
    spawned: u64,
    aborted: u64,
}

impl FlowTicker {
    /// Create a stopped ticker that will send on `tx` every `interval`.
    pub const fn new(interval: Duration, tx: mpsc::Sender<SimEvent>) -> Self {
        Self {
            interval,
            tx,
            running: None,
            spawned: 0,
            aborted: 0,
        }
    }

    /// Start, stop, or replace the task so it matches `timer`.
    pub fn sync(&mut self, timer: FlowTimer) {
        let wanted = match timer {
            FlowTimer::Stopped => None,
            FlowTimer::Running { epoch } => Some(epoch),
        };
        let current = self.running.as_ref().map(|(epoch, _)| *epoch);
        if wanted == current {
            return;
        }
        self.stop();
        if let Some(epoch) = wanted {
            self.start(epoch);
        }
    }

    /// Epoch of the running task, if any.
    pub fn epoch(&self) -> Option<u64> {
        self.running.as_ref().map(|(epoch, _)| *epoch)
    }

    /// Number of tasks spawned so far.
    pub const fn spawned(&self) -> u64 {
        self.spawned
    }

    /// Number of tasks aborted so far.
    pub const fn aborted(&self) -> u64 {
        self.aborted
    }

    /// Abort the running task, if any.
    pub fn stop(&mut self) {
        if let Some((epoch, handle)) = self.running.take() {
            handle.abort();
            self.aborted = self.aborted.saturating_add(1);
            debug!(epoch, "flow ticker aborted");
        }
    }

    fn start(&mut self, epoch: u64) {
        let tx = self.tx.clone();
        let period = self.interval;
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            // The first tick of a tokio interval completes immediately.
            interval.tick().await;
            loop {
                interval.tick().await;
                if tx.send(SimEvent::FlowTick { epoch }).await.is_err() {
                    break;
                }
            }
        });
        self.spawned = self.spawned.saturating_add(1);
        self.running = Some((epoch, handle));
        debug!(epoch, interval_ms = period.as_millis(), "flow ticker spawned");
    }
}

impl Drop for FlowTicker {
    fn drop(&mut self) {
        self.stop();
    }
}

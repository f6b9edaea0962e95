//! The current-flow indicator.
//!
//! While the circuit is complete a dot travels around both wires, advanced
//! by periodic ticks. The timer that produces those ticks lives outside the
//! core; this module owns its lifecycle so a stale or leaked timer is
//! detectable. Every start bumps the epoch, and a tick stamped with an old
//! epoch is ignored.

use tracing::debug;

/// Lifecycle of the external tick timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlowTimer {
    /// No timer should be running.
    #[default]
    Stopped,
    /// A timer is running; its ticks carry this epoch.
    Running {
        /// Generation of the running timer.
        epoch: u64,
    },
}

/// Position of the flow indicator and the state of its timer.
#[derive(Debug, Clone, PartialEq)]
pub struct FlowIndicator {
    /// Scalar position in `[0, 1)` around the circuit.
    value: f64,
    /// Advance per tick.
    step: f64,
    timer: FlowTimer,
    /// Last epoch handed out.
    epoch: u64,
    starts: u64,
    stops: u64,
}

impl FlowIndicator {
    /// Create a stopped indicator at position 0.
    pub const fn new(step: f64) -> Self {
        Self {
            value: 0.0,
            step,
            timer: FlowTimer::Stopped,
            epoch: 0,
            starts: 0,
            stops: 0,
        }
    }

    /// Current scalar position.
    pub const fn value(&self) -> f64 {
        self.value
    }

    /// Current timer state.
    pub const fn timer(&self) -> FlowTimer {
        self.timer
    }

    /// Epoch of the running timer, if any.
    pub const fn epoch(&self) -> Option<u64> {
        match self.timer {
            FlowTimer::Stopped => None,
            FlowTimer::Running { epoch } => Some(epoch),
        }
    }

    /// Whether the timer is running.
    pub const fn is_running(&self) -> bool {
        matches!(self.timer, FlowTimer::Running { .. })
    }

    /// Number of times the timer was started.
    pub const fn starts(&self) -> u64 {
        self.starts
    }

    /// Number of times the timer was stopped.
    pub const fn stops(&self) -> u64 {
        self.stops
    }

    /// Start the timer under a fresh epoch.
    ///
    /// Returns `false` if it was already running.
    pub fn start(&mut self) -> bool {
        if self.is_running() {
            return false;
        }
        self.epoch = self.epoch.saturating_add(1);
        self.starts = self.starts.saturating_add(1);
        self.timer = FlowTimer::Running { epoch: self.epoch };
        debug!(epoch = self.epoch, "flow timer started");
        true
    }

    /// Stop the timer.
    ///
    /// Returns `false` if it was already stopped.
    pub fn stop(&mut self) -> bool {
        if !self.is_running() {
            return false;
        }
        self.stops = self.stops.saturating_add(1);
        self.timer = FlowTimer::Stopped;
        debug!(epoch = self.epoch, "flow timer stopped");
        true
    }

    /// Advance by one step if `epoch` belongs to the running timer.
    ///
    /// Returns whether the tick was applied.
    pub fn advance(&mut self, epoch: u64) -> bool {
        if self.epoch() != Some(epoch) {
            debug!(epoch, current = ?self.epoch(), "stale flow tick ignored");
            return false;
        }
        self.value = (self.value + self.step).rem_euclid(1.0);
        true
    }

    /// Stop the timer and return the indicator to position 0.
    ///
    /// Start/stop counts and the epoch survive so that timers from before
    /// the reset stay stale.
    pub fn reset(&mut self) {
        let _ = self.stop();
        self.value = 0.0;
    }
}

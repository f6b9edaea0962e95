//! Feedback sink that turns simulation feedback into structured log lines.
//!
//! Stands in for the presentation layer: where a browser would play a cue
//! or show a message, the engine logs the feedback with its cue and keeps
//! a few counters for the end-of-run summary.

use galvanic_core::FeedbackSink;
use galvanic_types::{Feedback, Rejection};
use tracing::{debug, info, warn};

/// Counters collected while the lesson runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeedbackTally {
    /// Ions spawned.
    pub spawned: u32,
    /// Electrons handed off across the battery.
    pub handed_off: u32,
    /// Plating batches.
    pub plated_batches: u32,
    /// Rejections of any kind.
    pub rejected: u32,
    /// Ions returned after leaving the electrolyte.
    pub out_of_bounds: u32,
    /// Whether the goal signal fired.
    pub goal_complete: bool,
}

/// A [`FeedbackSink`] that logs every feedback value.
#[derive(Debug, Default)]
pub struct LogSink {
    tally: FeedbackTally,
}

impl LogSink {
    /// Create a sink with zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Counters so far.
    pub const fn tally(&self) -> FeedbackTally {
        self.tally
    }

    /// Zero the counters, e.g. after a restart.
    pub fn reset(&mut self) {
        self.tally = FeedbackTally::default();
    }
}

impl FeedbackSink for LogSink {
    fn notify(&mut self, feedback: &Feedback) {
        let cue = feedback.cue();
        let t = &mut self.tally;
        match feedback {
            Feedback::IonSpawned { anode_mass, .. } => {
                t.spawned = t.spawned.saturating_add(1);
                debug!(?cue, %anode_mass, "feedback: ion spawned");
            }
            Feedback::ElectronHandedOff { .. } => {
                t.handed_off = t.handed_off.saturating_add(1);
                debug!(?cue, "feedback: electron handed off");
            }
            Feedback::Plated {
                pairs,
                cathode_mass,
                plated_count,
            } => {
                t.plated_batches = t.plated_batches.saturating_add(1);
                info!(?cue, pairs, %cathode_mass, plated_count, "feedback: plated");
            }
            Feedback::GoalComplete { plated_count } => {
                t.goal_complete = true;
                info!(?cue, plated_count, "feedback: plating goal complete");
            }
            Feedback::Rejected { reason } => {
                t.rejected = t.rejected.saturating_add(1);
                if matches!(reason, Rejection::OutOfBounds { .. }) {
                    t.out_of_bounds = t.out_of_bounds.saturating_add(1);
                }
                warn!(?cue, %reason, "feedback: rejected");
            }
            other => debug!(?cue, feedback = ?other, "feedback"),
        }
    }
}

//! Feedback sinks.
//!
//! The simulation reports every noticeable transition through a
//! [`FeedbackSink`]. The presentation layer implements it to play cues and
//! show messages; tests use [`RecordingSink`].

use galvanic_types::Feedback;

/// Receives feedback from the simulation, in order, synchronously.
pub trait FeedbackSink {
    /// Called once per feedback value.
    fn notify(&mut self, feedback: &Feedback);
}

/// A sink that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpSink;

impl FeedbackSink for NoOpSink {
    fn notify(&mut self, _feedback: &Feedback) {}
}

/// A sink that keeps every feedback value it receives.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    /// Feedback in the order it was received.
    pub received: Vec<Feedback>,
}

impl RecordingSink {
    /// Create an empty recording sink.
    pub const fn new() -> Self {
        Self {
            received: Vec::new(),
        }
    }

    /// Take everything received so far, leaving the sink empty.
    pub fn drain(&mut self) -> Vec<Feedback> {
        std::mem::take(&mut self.received)
    }
}

impl FeedbackSink for RecordingSink {
    fn notify(&mut self, feedback: &Feedback) {
        self.received.push(feedback.clone());
    }
}

impl<F: FnMut(&Feedback)> FeedbackSink for F {
    fn notify(&mut self, feedback: &Feedback) {
        self(feedback);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_sink_keeps_order() {
        let mut sink = RecordingSink::new();
        sink.notify(&Feedback::Restarted);
        sink.notify(&Feedback::CircuitChanged { complete: true });
        assert_eq!(
            sink.drain(),
            vec![
                Feedback::Restarted,
                Feedback::CircuitChanged { complete: true }
            ]
        );
        assert!(sink.received.is_empty());
    }

    #[test]
    fn closures_are_sinks() {
        let mut count = 0_u32;
        {
            let mut sink = |_: &Feedback| count = count.saturating_add(1);
            sink.notify(&Feedback::Restarted);
            sink.notify(&Feedback::Restarted);
        }
        assert_eq!(count, 2);
    }
}

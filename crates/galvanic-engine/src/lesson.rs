//! The lesson loop: one task owning the simulation.
//!
//! Autopilot actions and flow ticks arrive on different schedules. The loop
//! multiplexes them with `tokio::select!` and applies each event to the
//! simulation in the order it was received. After every event the flow
//! ticker is brought in line with the simulation's timer, so a broken
//! circuit or a restart aborts the tick task straight away.

use std::time::Duration;

use galvanic_core::{SimEvent, Simulation, SimulationError};
use galvanic_types::{Rejection, ReservoirSnapshot};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::autopilot::Autopilot;
use crate::error::EngineError;
use crate::log_sink::{FeedbackTally, LogSink};
use crate::ticker::FlowTicker;

/// Capacity of the event channel.
const CHANNEL_CAPACITY: usize = 64;

/// Why the run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LessonEnd {
    /// Every requested lesson reached its plating goal.
    GoalComplete,
    /// The anode ran out before the goal was reached.
    AnodeDepleted,
    /// The autopilot hit its step limit.
    StepLimit,
}

/// Summary of a finished run.
#[derive(Debug, Clone)]
pub struct LessonResult {
    /// Why the run ended.
    pub end: LessonEnd,
    /// Lessons completed.
    pub lessons_completed: u32,
    /// Reservoir at the end of the last lesson.
    pub reservoir: ReservoirSnapshot,
    /// Feedback counters of the last lesson.
    pub tally: FeedbackTally,
    /// Autopilot actions taken over the whole run.
    pub autopilot_steps: u64,
    /// Events applied, including flow ticks.
    pub events_applied: u64,
    /// Flow ticks that moved the indicator.
    pub flow_ticks: u64,
    /// Flow timer starts over the whole run.
    pub timer_starts: u64,
    /// Flow timer stops over the whole run.
    pub timer_stops: u64,
    /// Tick tasks spawned over the whole run.
    pub tasks_spawned: u64,
    /// Tick tasks aborted over the whole run.
    pub tasks_aborted: u64,
}

/// Drive `sim` with `pilot` until the configured lessons are done.
///
/// # Errors
///
/// Returns [`EngineError::Simulation`] if the simulation reports anything
/// other than a rejection.
pub async fn run_lessons(
    sim: &mut Simulation,
    pilot: &mut Autopilot,
) -> Result<LessonResult, EngineError> {
    let (tx, mut rx) = mpsc::channel(CHANNEL_CAPACITY);
    let tick_interval = Duration::from_millis(sim.config().flow.tick_interval_ms);
    let mut ticker = FlowTicker::new(tick_interval, tx);
    let mut sink = LogSink::new();

    let mut steps = tokio::time::interval(Duration::from_millis(pilot.config().step_interval_ms));
    steps.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    let lessons = pilot.config().lessons;
    let mut lessons_completed = 0_u32;
    let mut events_applied = 0_u64;
    let mut flow_ticks = 0_u64;

    info!(lessons, "lesson loop started");

    let end = loop {
        let event = tokio::select! {
            Some(event) = rx.recv() => event,
            _ = steps.tick() => {
                if let Some(event) = pilot.next_event(sim) {
                    event
                } else if sim.reservoir().complete {
                    lessons_completed = lessons_completed.saturating_add(1);
                    log_lesson(lessons_completed, sim, &sink);
                    if lessons_completed >= lessons {
                        break LessonEnd::GoalComplete;
                    }
                    pilot.rewire();
                    sink.reset();
                    SimEvent::Restart
                } else {
                    break LessonEnd::StepLimit;
                }
            }
        };

        let is_tick = matches!(event, SimEvent::FlowTick { .. });
        match sim.apply(event, &mut sink) {
            Ok(transition) => {
                if is_tick && transition.change != galvanic_core::Change::Ignored {
                    flow_ticks = flow_ticks.saturating_add(1);
                }
            }
            Err(SimulationError::Rejected(Rejection::AnodeDepleted { anode_mass })) => {
                warn!(%anode_mass, "anode depleted before the goal");
                break LessonEnd::AnodeDepleted;
            }
            Err(SimulationError::Rejected(reason)) => {
                debug!(%reason, "autopilot action rejected");
            }
            Err(err) => {
                ticker.stop();
                return Err(err.into());
            }
        }
        events_applied = events_applied.saturating_add(1);
        ticker.sync(sim.flow().timer());
    };

    debug!(epoch = ?ticker.epoch(), "stopping flow ticker");
    ticker.stop();
    let flow = sim.flow();
    Ok(LessonResult {
        end,
        lessons_completed,
        reservoir: sim.reservoir(),
        tally: sink.tally(),
        autopilot_steps: pilot.steps(),
        events_applied,
        flow_ticks,
        timer_starts: flow.starts(),
        timer_stops: flow.stops(),
        tasks_spawned: ticker.spawned(),
        tasks_aborted: ticker.aborted(),
    })
}

fn log_lesson(lesson: u32, sim: &Simulation, sink: &LogSink) {
    let reservoir = sim.reservoir();
    let tally = sink.tally();
    info!(
        lesson,
        anode_mass = %reservoir.anode_mass,
        cathode_mass = %reservoir.cathode_mass,
        plated_count = reservoir.plated_count,
        spawned = tally.spawned,
        rejected = tally.rejected,
        out_of_bounds = tally.out_of_bounds,
        journal_entries = sim.journal().len(),
        "lesson complete"
    );
}

/// Log the end-of-run summary.
pub fn log_result(result: &LessonResult) {
    info!(
        end = ?result.end,
        lessons_completed = result.lessons_completed,
        anode_mass = %result.reservoir.anode_mass,
        cathode_mass = %result.reservoir.cathode_mass,
        plated_count = result.reservoir.plated_count,
        spawned = result.tally.spawned,
        handed_off = result.tally.handed_off,
        plated_batches = result.tally.plated_batches,
        rejected = result.tally.rejected,
        autopilot_steps = result.autopilot_steps,
        events_applied = result.events_applied,
        flow_ticks = result.flow_ticks,
        timer_starts = result.timer_starts,
        timer_stops = result.timer_stops,
        "run finished"
    );
    if result.tasks_spawned != result.tasks_aborted {
        warn!(
            spawned = result.tasks_spawned,
            aborted = result.tasks_aborted,
            "flow ticker tasks leaked"
        );
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use galvanic_core::PlatingConfig;

    use super::*;
    use crate::autopilot::AutopilotConfig;

    fn setup(config: AutopilotConfig) -> (Simulation, Autopilot) {
        let plating = PlatingConfig::default();
        let sim = Simulation::with_sequential_ids(plating.clone()).unwrap();
        let pilot = Autopilot::new(config, &plating).unwrap();
        (sim, pilot)
    }

    #[tokio::test(start_paused = true)]
    async fn runs_to_the_goal_with_flow_ticks() {
        let (mut sim, mut pilot) = setup(AutopilotConfig::default());
        let result = run_lessons(&mut sim, &mut pilot).await.unwrap();

        assert_eq!(result.end, LessonEnd::GoalComplete);
        assert_eq!(result.lessons_completed, 1);
        assert!(result.reservoir.complete);
        assert!(result.tally.goal_complete);
        assert!(result.flow_ticks > 0);
        assert_eq!(result.tasks_spawned, result.tasks_aborted);
    }

    #[tokio::test(start_paused = true)]
    async fn repeated_lessons_restart_cleanly() {
        let (mut sim, mut pilot) = setup(AutopilotConfig {
            lessons: 3,
            ..AutopilotConfig::default()
        });
        let result = run_lessons(&mut sim, &mut pilot).await.unwrap();

        assert_eq!(result.end, LessonEnd::GoalComplete);
        assert_eq!(result.lessons_completed, 3);
        // One timer start per lesson; the last stop comes from shutdown.
        assert_eq!(result.timer_starts, 3);
        assert_eq!(result.timer_stops, 2);
        assert_eq!(result.tasks_spawned, 3);
        assert_eq!(result.tasks_spawned, result.tasks_aborted);
    }

    #[tokio::test(start_paused = true)]
    async fn step_limit_ends_the_run() {
        let (mut sim, mut pilot) = setup(AutopilotConfig {
            max_steps: 10,
            ..AutopilotConfig::default()
        });
        let result = run_lessons(&mut sim, &mut pilot).await.unwrap();
        assert_eq!(result.end, LessonEnd::StepLimit);
        assert_eq!(result.lessons_completed, 0);
    }
}

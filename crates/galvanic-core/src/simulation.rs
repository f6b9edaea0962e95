//! The simulation reducer.
//!
//! A [`Simulation`] owns the registry, the ledger, the wire paths, the
//! circuit latches and the flow indicator. Every external input is one
//! [`SimEvent`] passed to [`Simulation::apply`], which runs in this order:
//!
//! 1. **Handle** the event: validate, then mutate the registry and ledger.
//! 2. **Reject** if the event was refused, notifying the sink exactly once.
//! 3. **Settle**: pair waiting ions with waiting electrons and plate them.
//! 4. **Verify** the conservation law, logging any anomaly.
//!
//! A refused event changes nothing, except that an ion dropped outside the
//! electrolyte is returned to its origin and an ion dropped on an empty
//! cathode stays where it was dropped.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use galvanic_ledger::conservation::ConservationResult;
use galvanic_ledger::{LedgerError, ReservoirLedger};
use galvanic_types::{
    Feedback, MassEntry, Particle, ParticleId, ParticleStatus, Point, Rejection,
    ReservoirSnapshot, Segment, SimulationSnapshot,
};

use crate::config::PlatingConfig;
use crate::drag;
use crate::feedback::FeedbackSink;
use crate::flow::FlowIndicator;
use crate::geometry::{Path, WirePaths};
use crate::pairing::{self, Pairing};
use crate::registry::{IdSource, ParticleRegistry, SequentialIds};

/// Errors returned by [`Simulation::apply`].
#[derive(Debug, thiserror::Error)]
pub enum SimulationError {
    /// The event was refused. Already reported through the feedback sink.
    #[error(transparent)]
    Rejected(#[from] Rejection),

    /// The ledger refused an update. The simulation state is unchanged.
    #[error("ledger error: {source}")]
    Ledger {
        /// The underlying ledger error.
        #[from]
        source: LedgerError,
    },
}

impl SimulationError {
    /// The rejection, if this error is one.
    pub const fn rejection(&self) -> Option<&Rejection> {
        match self {
            Self::Rejected(rejection) => Some(rejection),
            Self::Ledger { .. } => None,
        }
    }
}

/// An external input to the simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SimEvent {
    /// Dissolve one ion from the anode and release its electron.
    Spawn,
    /// A particle is being dragged to `point`.
    DragUpdate {
        /// The dragged particle.
        id: ParticleId,
        /// Pointer position in the logical frame.
        point: Point,
    },
    /// A drag ended at `point`.
    DragEnd {
        /// The dragged particle.
        id: ParticleId,
        /// Pointer position in the logical frame.
        point: Point,
    },
    /// A wire was connected or disconnected.
    SetWire {
        /// Which wire.
        segment: Segment,
        /// Whether it is now connected.
        connected: bool,
    },
    /// The presentation layer laid out new wire paths.
    UpdatePaths(WirePaths),
    /// One tick of the flow timer with the given epoch.
    FlowTick {
        /// Epoch of the timer that produced the tick.
        epoch: u64,
    },
    /// Return to the initial state.
    Restart,
}

/// What an applied event changed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "change", rename_all = "snake_case")]
pub enum Change {
    /// A new ion and its electron were created.
    Spawned {
        /// The new ion.
        ion: ParticleId,
        /// The new anode-wire electron.
        electron: ParticleId,
    },
    /// An ion moved freely inside the electrolyte.
    Moved {
        /// The ion.
        id: ParticleId,
    },
    /// An electron advanced along its wire.
    Advanced {
        /// The electron.
        id: ParticleId,
        /// Its new progress.
        progress: f64,
    },
    /// An electron crossed from the anode wire to the cathode wire.
    HandedOff {
        /// The removed anode-wire electron.
        from: ParticleId,
        /// The new cathode-wire electron.
        to: ParticleId,
    },
    /// A particle reached the cathode and is waiting to pair.
    Arrived {
        /// The waiting particle.
        id: ParticleId,
    },
    /// The circuit became complete or broken.
    CircuitChanged {
        /// Whether both wires are now connected.
        complete: bool,
    },
    /// The wire paths were replaced.
    PathsUpdated,
    /// The flow indicator moved.
    FlowAdvanced {
        /// New scalar position.
        value: f64,
    },
    /// Everything was reset.
    Restarted,
    /// The event had no effect.
    Ignored,
}

/// The result of one applied event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    /// What the event itself changed.
    pub change: Change,
    /// Pairs plated while settling after the event.
    pub paired: Vec<Pairing>,
}

impl Transition {
    const fn ignored() -> Self {
        Self::of(Change::Ignored)
    }

    const fn of(change: Change) -> Self {
        Self {
            change,
            paired: Vec::new(),
        }
    }
}

/// The plating simulation state machine.
pub struct Simulation {
    config: PlatingConfig,
    registry: ParticleRegistry,
    ledger: ReservoirLedger,
    flow: FlowIndicator,
    paths: Option<WirePaths>,
    anode_connected: bool,
    cathode_connected: bool,
    ids: Box<dyn IdSource>,
}

impl std::fmt::Debug for Simulation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulation")
            .field("registry", &self.registry)
            .field("ledger", &self.ledger)
            .field("flow", &self.flow)
            .field("paths", &self.paths)
            .field("anode_connected", &self.anode_connected)
            .field("cathode_connected", &self.cathode_connected)
            .finish_non_exhaustive()
    }
}

impl Simulation {
    /// Create a simulation in its initial state.
    ///
    /// # Errors
    ///
    /// Returns [`SimulationError::Ledger`] if the reservoir configuration
    /// is invalid.
    pub fn new(config: PlatingConfig, ids: Box<dyn IdSource>) -> Result<Self, SimulationError> {
        let ledger = ReservoirLedger::new(config.reservoir.to_params())?;
        let flow = FlowIndicator::new(config.flow.step);
        info!(
            world = %config.world.name,
            anode_mass = %ledger.anode_mass(),
            cathode_mass = %ledger.cathode_mass(),
            goal = config.reservoir.plating_goal,
            "simulation created"
        );
        Ok(Self {
            config,
            registry: ParticleRegistry::new(),
            ledger,
            flow,
            paths: None,
            anode_connected: false,
            cathode_connected: false,
            ids,
        })
    }

    /// Create a simulation with deterministic sequential ids.
    ///
    /// # Errors
    ///
    /// See [`Simulation::new`].
    pub fn with_sequential_ids(config: PlatingConfig) -> Result<Self, SimulationError> {
        Self::new(config, Box::new(SequentialIds::new()))
    }

    // -----------------------------------------------------------------------
    // Events
    // -----------------------------------------------------------------------

    /// Apply one event.
    ///
    /// # Errors
    ///
    /// Returns [`SimulationError::Rejected`] when the event is refused (the
    /// sink has already been told), or [`SimulationError::Ledger`] if the
    /// ledger refuses an update.
    pub fn apply(
        &mut self,
        event: SimEvent,
        sink: &mut dyn FeedbackSink,
    ) -> Result<Transition, SimulationError> {
        let outcome = match event {
            SimEvent::Spawn => self.spawn_ion(sink),
            SimEvent::DragUpdate { id, point } => Ok(self.drag_update(id, point)),
            SimEvent::DragEnd { id, point } => self.drag_end(id, point, sink),
            SimEvent::SetWire { segment, connected } => {
                Ok(self.set_wire(segment, connected, sink))
            }
            SimEvent::UpdatePaths(paths) => Ok(self.update_paths(paths)),
            SimEvent::FlowTick { epoch } => Ok(self.flow_tick(epoch)),
            SimEvent::Restart => Ok(self.restart(sink)),
        };

        if let Err(SimulationError::Rejected(reason)) = &outcome {
            debug!(%reason, "event rejected");
            sink.notify(&Feedback::Rejected {
                reason: reason.clone(),
            });
        }

        let paired = self.settle(sink)?;
        self.check_conservation();

        outcome.map(|mut transition| {
            transition.paired = paired;
            transition
        })
    }

    /// Dissolve one ion and release its electron onto the anode wire.
    fn spawn_ion(&mut self, sink: &mut dyn FeedbackSink) -> Result<Transition, SimulationError> {
        if !self.circuit_complete() {
            return Err(Rejection::CircuitNotComplete.into());
        }
        if self.ledger.is_depleted() {
            return Err(Rejection::AnodeDepleted {
                anode_mass: self.ledger.anode_mass(),
            }
            .into());
        }
        let active = count(self.registry.active_count());
        let cap = self.config.particles.max_active;
        if active.saturating_add(2) > cap {
            return Err(Rejection::CapacityExceeded { active, cap }.into());
        }

        let entry = self.ledger.record_dissolve()?;

        let origin = self.config.particles.ion_origin;
        let electron_start = self.paths.as_ref().map_or(origin, |p| p.anode.start());
        let ion = self.ids.next_id();
        let electron = self.ids.next_id();
        self.registry.insert_ion(ion, origin);
        self.registry
            .insert_electron(electron, Segment::AnodeWire, electron_start);

        info!(%ion, %electron, anode_mass = %entry.anode_after, "ion spawned");
        sink.notify(&Feedback::IonSpawned {
            ion,
            electron,
            anode_mass: entry.anode_after,
        });
        Ok(Transition::of(Change::Spawned { ion, electron }))
    }

    /// Route a drag update to the ion or electron handler.
    fn drag_update(&mut self, id: ParticleId, point: Point) -> Transition {
        if !point.is_finite() {
            debug!(%id, "non-finite drag point ignored");
            return Transition::ignored();
        }
        match self.registry.get(id) {
            Some(Particle::Ion(ion)) if ion.status.is_active() => self.move_ion(id, point),
            Some(Particle::Electron(electron)) if electron.status.is_active() => {
                self.advance_electron(id, point)
            }
            Some(other) => {
                debug!(%id, kind = ?other.kind(), "drag update on waiting particle ignored");
                Transition::ignored()
            }
            None => {
                debug!(%id, "drag update on unknown particle ignored");
                Transition::ignored()
            }
        }
    }

    /// Route a drag end to the ion or electron handler.
    fn drag_end(
        &mut self,
        id: ParticleId,
        point: Point,
        sink: &mut dyn FeedbackSink,
    ) -> Result<Transition, SimulationError> {
        match self.registry.get(id) {
            Some(Particle::Ion(ion)) if ion.status.is_active() => self.drop_ion(id, point, sink),
            Some(Particle::Electron(electron)) if electron.status.is_active() => {
                Ok(self.complete_electron_drag(id, sink))
            }
            Some(other) => {
                debug!(%id, kind = ?other.kind(), "drag end on waiting particle ignored");
                Ok(Transition::ignored())
            }
            None => {
                debug!(%id, "drag end on unknown particle ignored");
                Ok(Transition::ignored())
            }
        }
    }

    /// Free movement of an ion while it is dragged.
    fn move_ion(&mut self, id: ParticleId, point: Point) -> Transition {
        match self.registry.ion_mut(id) {
            Some(ion) => {
                ion.position = point;
                Transition::of(Change::Moved { id })
            }
            None => Transition::ignored(),
        }
    }

    /// Move an electron forward along its wire toward the pointer.
    fn advance_electron(&mut self, id: ParticleId, point: Point) -> Transition {
        let samples = self.config.particles.nearest_samples;
        let Some(paths) = self.paths.as_ref() else {
            debug!(%id, "electron drag ignored, wire paths unknown");
            return Transition::ignored();
        };
        let Some(electron) = self.registry.electron_mut(id) else {
            return Transition::ignored();
        };

        let resolved = drag::resolve(
            path_for(paths, electron.segment),
            point,
            electron.progress,
            samples,
        );
        electron.progress = resolved.progress;
        electron.position = resolved.position;
        Transition::of(Change::Advanced {
            id,
            progress: resolved.progress,
        })
    }

    /// Finish an electron drag: hand off at the battery or arrive at the
    /// cathode, if the electron got far enough.
    fn complete_electron_drag(&mut self, id: ParticleId, sink: &mut dyn FeedbackSink) -> Transition {
        let threshold = self.config.particles.handoff_threshold;
        let Some(electron) = self.registry.electron(id) else {
            return Transition::ignored();
        };
        if !electron.status.is_active() || !drag::reached_end(electron.progress, threshold) {
            debug!(%id, progress = electron.progress, "electron released before the end");
            return Transition::ignored();
        }

        let segment = electron.segment;
        match segment {
            Segment::AnodeWire => self.hand_off(id, sink),
            Segment::CathodeWire => self.arrive_electron(id, sink),
        }
    }

    /// Replace an anode-wire electron with a fresh cathode-wire electron.
    fn hand_off(&mut self, from: ParticleId, sink: &mut dyn FeedbackSink) -> Transition {
        let Some(start) = self.paths.as_ref().map(|p| p.cathode.start()) else {
            debug!(%from, "hand-off skipped, wire paths unknown");
            return Transition::ignored();
        };
        if self.registry.remove(from).is_none() {
            return Transition::ignored();
        }
        let to = self.ids.next_id();
        self.registry
            .insert_electron(to, Segment::CathodeWire, start);

        info!(%from, %to, "electron handed off to the cathode wire");
        sink.notify(&Feedback::ElectronHandedOff { from, to });
        Transition::of(Change::HandedOff { from, to })
    }

    /// Park a cathode-wire electron at the cathode.
    fn arrive_electron(&mut self, id: ParticleId, sink: &mut dyn FeedbackSink) -> Transition {
        let end = self.paths.as_ref().map(|p| p.cathode.end());
        let since = self.registry.next_arrival();
        let Some(electron) = self.registry.electron_mut(id) else {
            return Transition::ignored();
        };
        electron.status = ParticleStatus::Waiting { since };
        electron.progress = 1.0;
        if let Some(end) = end {
            electron.position = end;
        }

        info!(%id, since, "electron waiting at the cathode");
        sink.notify(&Feedback::ElectronArrived { id });
        Transition::of(Change::Arrived { id })
    }

    /// Drop an ion at `point`.
    fn drop_ion(
        &mut self,
        id: ParticleId,
        point: Point,
        sink: &mut dyn FeedbackSink,
    ) -> Result<Transition, SimulationError> {
        let particles = &self.config.particles;
        let inside = particles.electrolyte.contains(point);
        let on_cathode = inside && particles.cathode_target.contains(point);
        let origin = particles.ion_origin;
        let electron_waiting = self.registry.has_waiting_electron();
        let since = if on_cathode && electron_waiting {
            Some(self.registry.next_arrival())
        } else {
            None
        };

        let Some(ion) = self.registry.ion_mut(id) else {
            return Ok(Transition::ignored());
        };

        if !inside {
            ion.position = origin;
            ion.resets = ion.resets.saturating_add(1);
            info!(%id, resets = ion.resets, "ion left the solution, returned to origin");
            return Err(Rejection::OutOfBounds { id }.into());
        }

        ion.position = point;
        if !on_cathode {
            return Ok(Transition::of(Change::Moved { id }));
        }

        match since {
            Some(since) => {
                ion.status = ParticleStatus::Waiting { since };
                info!(%id, since, "ion waiting at the cathode");
                sink.notify(&Feedback::IonArrived { id });
                Ok(Transition::of(Change::Arrived { id }))
            }
            None => Err(Rejection::NoWaitingElectron { id }.into()),
        }
    }

    /// Latch a wire connection and start or stop the flow timer.
    fn set_wire(
        &mut self,
        segment: Segment,
        connected: bool,
        sink: &mut dyn FeedbackSink,
    ) -> Transition {
        let was_complete = self.circuit_complete();
        match segment {
            Segment::AnodeWire => self.anode_connected = connected,
            Segment::CathodeWire => self.cathode_connected = connected,
        }
        let complete = self.circuit_complete();
        if complete == was_complete {
            debug!(?segment, connected, "wire latch set, circuit unchanged");
            return Transition::ignored();
        }

        if complete {
            self.flow.start();
        } else {
            self.flow.stop();
        }
        info!(complete, "circuit changed");
        sink.notify(&Feedback::CircuitChanged { complete });
        Transition::of(Change::CircuitChanged { complete })
    }

    /// Replace both wire paths and re-place every electron on them.
    fn update_paths(&mut self, paths: WirePaths) -> Transition {
        let mut moved = 0_u32;
        for particle in self.registry.particles_mut() {
            if let Particle::Electron(electron) = particle {
                electron.position =
                    path_for(&paths, electron.segment).point_at_progress(electron.progress);
                moved = moved.saturating_add(1);
            }
        }
        debug!(
            anode_spans = paths.anode.span_count(),
            cathode_spans = paths.cathode.span_count(),
            electrons = moved,
            "wire paths updated"
        );
        self.paths = Some(paths);
        Transition::of(Change::PathsUpdated)
    }

    /// Advance the flow indicator.
    fn flow_tick(&mut self, epoch: u64) -> Transition {
        if !self.circuit_complete() || !self.flow.advance(epoch) {
            return Transition::ignored();
        }
        Transition::of(Change::FlowAdvanced {
            value: self.flow.value(),
        })
    }

    /// Clear particles, ledger, flow and both latches.
    fn restart(&mut self, sink: &mut dyn FeedbackSink) -> Transition {
        self.registry.clear();
        self.ledger.reset();
        self.flow.reset();
        self.anode_connected = false;
        self.cathode_connected = false;
        info!("simulation restarted");
        sink.notify(&Feedback::Restarted);
        Transition::of(Change::Restarted)
    }

    /// Pair and plate everything that can be paired.
    ///
    /// The ledger is written before any particle is removed, so a ledger
    /// failure leaves both untouched.
    fn settle(&mut self, sink: &mut dyn FeedbackSink) -> Result<Vec<Pairing>, SimulationError> {
        let pairs = pairing::plan(&self.registry);
        if pairs.is_empty() {
            return Ok(pairs);
        }

        let receipt = self.ledger.record_plating(count(pairs.len()))?;
        self.registry.remove_all(&pairing::consumed_ids(&pairs));

        info!(
            pairs = receipt.pairs,
            cathode_mass = %receipt.cathode_mass,
            plated_count = receipt.plated_count,
            "silver plated"
        );
        sink.notify(&Feedback::Plated {
            pairs: receipt.pairs,
            cathode_mass: receipt.cathode_mass,
            plated_count: receipt.plated_count,
        });
        if receipt.goal_reached {
            sink.notify(&Feedback::GoalComplete {
                plated_count: receipt.plated_count,
            });
        }
        Ok(pairs)
    }

    fn check_conservation(&self) {
        if let ConservationResult::Anomaly(anomaly) = self.conservation() {
            warn!(
                journal_len = anomaly.journal_len,
                expected = %anomaly.expected,
                actual = %anomaly.actual,
                "{}",
                anomaly.message
            );
        }
    }

    // -----------------------------------------------------------------------
    // Convenience wrappers
    // -----------------------------------------------------------------------

    /// Apply [`SimEvent::Spawn`].
    ///
    /// # Errors
    ///
    /// See [`Simulation::apply`].
    pub fn spawn(&mut self, sink: &mut dyn FeedbackSink) -> Result<Transition, SimulationError> {
        self.apply(SimEvent::Spawn, sink)
    }

    /// Apply [`SimEvent::DragUpdate`].
    ///
    /// # Errors
    ///
    /// See [`Simulation::apply`].
    pub fn drag_to(
        &mut self,
        id: ParticleId,
        point: Point,
        sink: &mut dyn FeedbackSink,
    ) -> Result<Transition, SimulationError> {
        self.apply(SimEvent::DragUpdate { id, point }, sink)
    }

    /// Apply [`SimEvent::DragEnd`].
    ///
    /// # Errors
    ///
    /// See [`Simulation::apply`].
    pub fn release(
        &mut self,
        id: ParticleId,
        point: Point,
        sink: &mut dyn FeedbackSink,
    ) -> Result<Transition, SimulationError> {
        self.apply(SimEvent::DragEnd { id, point }, sink)
    }

    /// Apply [`SimEvent::SetWire`].
    ///
    /// # Errors
    ///
    /// See [`Simulation::apply`].
    pub fn connect(
        &mut self,
        segment: Segment,
        connected: bool,
        sink: &mut dyn FeedbackSink,
    ) -> Result<Transition, SimulationError> {
        self.apply(SimEvent::SetWire { segment, connected }, sink)
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// The configuration the simulation was created with.
    pub const fn config(&self) -> &PlatingConfig {
        &self.config
    }

    /// Live particles in insertion order.
    pub fn particles(&self) -> &[Particle] {
        self.registry.particles()
    }

    /// Look up a particle by id.
    pub fn get(&self, id: ParticleId) -> Option<&Particle> {
        self.registry.get(id)
    }

    /// Number of particles in `Active` status.
    pub fn active_count(&self) -> usize {
        self.registry.active_count()
    }

    /// Number of ions in solution.
    pub fn ions_in_solution(&self) -> usize {
        self.registry.ions_in_solution()
    }

    /// Reservoir masses and plating progress.
    pub const fn reservoir(&self) -> ReservoirSnapshot {
        self.ledger.snapshot()
    }

    /// The mass journal of the current run.
    pub fn journal(&self) -> &[MassEntry] {
        self.ledger.journal()
    }

    /// Whether both wires are connected.
    pub const fn circuit_complete(&self) -> bool {
        self.anode_connected && self.cathode_connected
    }

    /// The flow indicator, including its timer state.
    pub const fn flow(&self) -> &FlowIndicator {
        &self.flow
    }

    /// The current wire paths, if the presentation layer has sent them.
    pub const fn paths(&self) -> Option<&WirePaths> {
        self.paths.as_ref()
    }

    /// Where the flow indicator is drawn, when the circuit is complete and
    /// the wire paths are known.
    pub fn flow_position(&self) -> Option<Point> {
        if !self.circuit_complete() {
            return None;
        }
        self.paths
            .as_ref()
            .map(|paths| paths.position_along(self.flow.value()))
    }

    /// Check the conservation law against the live registry.
    pub fn conservation(&self) -> ConservationResult {
        self.ledger
            .verify_conservation(count(self.registry.ions_in_solution()))
    }

    /// Everything the presentation layer renders.
    pub fn snapshot(&self) -> SimulationSnapshot {
        SimulationSnapshot {
            particles: self.registry.particles().to_vec(),
            reservoir: self.reservoir(),
            circuit_complete: self.circuit_complete(),
            flow_position: self.flow_position(),
        }
    }
}

/// The path a segment's electrons travel along.
const fn path_for(paths: &WirePaths, segment: Segment) -> &Path {
    match segment {
        Segment::AnodeWire => &paths.anode,
        Segment::CathodeWire => &paths.cathode,
    }
}

/// Convert a particle count to `u32`, saturating.
fn count(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;
    use crate::feedback::{NoOpSink, RecordingSink};

    fn paths() -> WirePaths {
        WirePaths {
            anode: Path::new(vec![Point::new(100.0, 300.0), Point::new(100.0, 60.0)]).unwrap(),
            cathode: Path::new(vec![Point::new(480.0, 60.0), Point::new(700.0, 60.0)]).unwrap(),
        }
    }

    fn ready() -> Simulation {
        let mut sim = Simulation::with_sequential_ids(PlatingConfig::default()).unwrap();
        let sink = &mut NoOpSink;
        sim.apply(SimEvent::UpdatePaths(paths()), sink).unwrap();
        sim.connect(Segment::AnodeWire, true, sink).unwrap();
        sim.connect(Segment::CathodeWire, true, sink).unwrap();
        sim
    }

    fn id(n: u64) -> ParticleId {
        ParticleId::from_sequence(n)
    }

    #[test]
    fn spawn_needs_a_complete_circuit() {
        let mut sim = Simulation::with_sequential_ids(PlatingConfig::default()).unwrap();
        let mut sink = RecordingSink::new();
        let err = sim.spawn(&mut sink).unwrap_err();
        assert_eq!(err.rejection(), Some(&Rejection::CircuitNotComplete));
        assert_eq!(
            sink.received,
            vec![Feedback::Rejected {
                reason: Rejection::CircuitNotComplete
            }]
        );
        assert!(sim.particles().is_empty());
        assert_eq!(sim.reservoir().anode_mass, dec!(50));
    }

    #[test]
    fn spawn_places_electron_at_anode_start() {
        let mut sim = ready();
        let transition = sim.spawn(&mut NoOpSink).unwrap();
        assert_eq!(
            transition.change,
            Change::Spawned {
                ion: id(1),
                electron: id(2)
            }
        );
        let electron = sim.get(id(2)).and_then(Particle::as_electron).unwrap();
        assert_eq!(electron.segment, Segment::AnodeWire);
        assert_eq!(electron.position, Point::new(100.0, 300.0));
        assert_eq!(sim.reservoir().anode_mass, dec!(45));
    }

    #[test]
    fn spawn_without_paths_uses_ion_origin() {
        let mut sim = Simulation::with_sequential_ids(PlatingConfig::default()).unwrap();
        let sink = &mut NoOpSink;
        sim.connect(Segment::AnodeWire, true, sink).unwrap();
        sim.connect(Segment::CathodeWire, true, sink).unwrap();
        sim.spawn(sink).unwrap();
        let origin = sim.config().particles.ion_origin;
        assert_eq!(sim.get(id(2)).unwrap().position(), origin);
    }

    #[test]
    fn drag_on_ion_moves_it_freely() {
        let mut sim = ready();
        sim.spawn(&mut NoOpSink).unwrap();
        let t = sim
            .drag_to(id(1), Point::new(400.0, 400.0), &mut NoOpSink)
            .unwrap();
        assert_eq!(t.change, Change::Moved { id: id(1) });
        assert_eq!(sim.get(id(1)).unwrap().position(), Point::new(400.0, 400.0));
    }

    #[test]
    fn electron_released_early_stays_put() {
        let mut sim = ready();
        sim.spawn(&mut NoOpSink).unwrap();
        sim.drag_to(id(2), Point::new(100.0, 180.0), &mut NoOpSink)
            .unwrap();
        let t = sim
            .release(id(2), Point::new(100.0, 180.0), &mut NoOpSink)
            .unwrap();
        assert_eq!(t.change, Change::Ignored);
        let electron = sim.get(id(2)).and_then(Particle::as_electron).unwrap();
        assert!((electron.progress - 0.5).abs() < 1e-9);
    }

    #[test]
    fn hand_off_without_paths_is_a_no_op() {
        let mut sim = ready();
        sim.spawn(&mut NoOpSink).unwrap();
        sim.drag_to(id(2), Point::new(100.0, 60.0), &mut NoOpSink)
            .unwrap();
        sim.paths = None;
        let t = sim
            .release(id(2), Point::new(100.0, 60.0), &mut NoOpSink)
            .unwrap();
        assert_eq!(t.change, Change::Ignored);
        assert!(sim.get(id(2)).is_some());
    }

    #[test]
    fn out_of_bounds_drop_resets_the_ion() {
        let mut sim = ready();
        sim.spawn(&mut NoOpSink).unwrap();
        let mut sink = RecordingSink::new();
        let err = sim
            .release(id(1), Point::new(5.0, 5.0), &mut sink)
            .unwrap_err();
        assert_eq!(err.rejection(), Some(&Rejection::OutOfBounds { id: id(1) }));
        let ion = sim.get(id(1)).and_then(Particle::as_ion).unwrap();
        assert_eq!(ion.position, sim.config().particles.ion_origin);
        assert_eq!(ion.resets, 1);
        assert!(ion.status.is_active());
        assert_eq!(sink.received.len(), 1);
    }

    #[test]
    fn cathode_drop_without_electron_stays_at_drop_point() {
        let mut sim = ready();
        sim.spawn(&mut NoOpSink).unwrap();
        let target = sim.config().particles.cathode_target.center();
        let err = sim.release(id(1), target, &mut NoOpSink).unwrap_err();
        assert_eq!(
            err.rejection(),
            Some(&Rejection::NoWaitingElectron { id: id(1) })
        );
        let ion = sim.get(id(1)).and_then(Particle::as_ion).unwrap();
        assert_eq!(ion.position, target);
        assert!(ion.status.is_active());
    }

    #[test]
    fn update_paths_rederives_electron_positions() {
        let mut sim = ready();
        sim.spawn(&mut NoOpSink).unwrap();
        sim.drag_to(id(2), Point::new(100.0, 180.0), &mut NoOpSink)
            .unwrap();
        let moved = WirePaths {
            anode: Path::new(vec![Point::new(0.0, 0.0), Point::new(0.0, 100.0)]).unwrap(),
            cathode: paths().cathode,
        };
        sim.apply(SimEvent::UpdatePaths(moved), &mut NoOpSink)
            .unwrap();
        let electron = sim.get(id(2)).and_then(Particle::as_electron).unwrap();
        assert!((electron.position.y - 50.0).abs() < 1e-9);
    }

    #[test]
    fn flow_ticks_only_with_the_current_epoch() {
        let mut sim = ready();
        let epoch = sim.flow().epoch().unwrap();
        let t = sim
            .apply(SimEvent::FlowTick { epoch }, &mut NoOpSink)
            .unwrap();
        assert!(matches!(t.change, Change::FlowAdvanced { .. }));
        let stale = sim
            .apply(
                SimEvent::FlowTick {
                    epoch: epoch.saturating_add(1),
                },
                &mut NoOpSink,
            )
            .unwrap();
        assert_eq!(stale.change, Change::Ignored);
        assert!(sim.flow_position().is_some());
    }

    #[test]
    fn breaking_the_circuit_stops_the_flow() {
        let mut sim = ready();
        let mut sink = RecordingSink::new();
        sim.connect(Segment::CathodeWire, false, &mut sink).unwrap();
        assert!(!sim.circuit_complete());
        assert!(!sim.flow().is_running());
        assert!(sim.flow_position().is_none());
        assert_eq!(
            sink.received,
            vec![Feedback::CircuitChanged { complete: false }]
        );
    }

    #[test]
    fn restart_resets_everything_but_paths() {
        let mut sim = ready();
        sim.spawn(&mut NoOpSink).unwrap();
        let t = sim.apply(SimEvent::Restart, &mut NoOpSink).unwrap();
        assert_eq!(t.change, Change::Restarted);
        assert!(sim.particles().is_empty());
        assert_eq!(sim.reservoir().anode_mass, dec!(50));
        assert!(sim.journal().is_empty());
        assert!(!sim.circuit_complete());
        assert!(!sim.flow().is_running());
        assert!(sim.paths().is_some());
    }
}

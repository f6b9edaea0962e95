//! End-to-end plating scenarios driven through `Simulation::apply`.
//!
//! Every step goes through the public event API with a recording sink and
//! checks the conservation law and the pairing invariant afterwards.

#![allow(clippy::unwrap_used)]

use galvanic_core::{
    Change, PlatingConfig, RecordingSink, SimEvent, Simulation, SimulationError, Transition,
    WirePaths, route_wire,
};
use galvanic_ledger::ConservationResult;
use galvanic_types::{
    Feedback, Particle, ParticleId, ParticleKind, ParticleStatus, Point, Rejection, Segment,
    SimulationSnapshot,
};
use rust_decimal_macros::dec;

const ANODE_START: Point = Point::new(100.0, 300.0);
const BATTERY_MINUS: Point = Point::new(480.0, 60.0);
const BATTERY_PLUS: Point = Point::new(560.0, 60.0);
const CATHODE_END: Point = Point::new(700.0, 300.0);

/// A simulation plus the sink it reports to.
struct Bench {
    sim: Simulation,
    sink: RecordingSink,
}

impl Bench {
    fn new(config: PlatingConfig) -> Self {
        let mut bench = Self {
            sim: Simulation::with_sequential_ids(config).unwrap(),
            sink: RecordingSink::new(),
        };
        bench.lay_out();
        bench
    }

    fn lay_out(&mut self) {
        let paths = WirePaths {
            anode: route_wire(ANODE_START, BATTERY_MINUS).unwrap(),
            cathode: route_wire(CATHODE_END, BATTERY_PLUS)
                .map(|p| {
                    let mut points = p.waypoints().to_vec();
                    points.reverse();
                    galvanic_core::Path::new(points).unwrap()
                })
                .unwrap(),
        };
        self.apply(SimEvent::UpdatePaths(paths)).unwrap();
    }

    fn connect(&mut self) {
        self.apply(SimEvent::SetWire {
            segment: Segment::AnodeWire,
            connected: true,
        })
        .unwrap();
        self.apply(SimEvent::SetWire {
            segment: Segment::CathodeWire,
            connected: true,
        })
        .unwrap();
    }

    fn apply(&mut self, event: SimEvent) -> Result<Transition, SimulationError> {
        let result = self.sim.apply(event, &mut self.sink);
        self.assert_invariants();
        result
    }

    fn assert_invariants(&self) {
        assert_eq!(self.sim.conservation(), ConservationResult::Balanced);
        let waiting = |kind: fn(&Particle) -> bool| {
            self.sim
                .particles()
                .iter()
                .filter(|p| kind(p) && !p.status().is_active())
                .count()
        };
        let ions = waiting(|p| matches!(p, Particle::Ion(_)));
        let electrons = waiting(|p| matches!(p, Particle::Electron(_)));
        assert!(ions == 0 || electrons == 0, "unpaired waiting particles left");
    }

    fn spawn(&mut self) -> (ParticleId, ParticleId) {
        match self.apply(SimEvent::Spawn).unwrap().change {
            Change::Spawned { ion, electron } => (ion, electron),
            other => panic!("expected a spawn, got {other:?}"),
        }
    }

    fn drag(&mut self, id: ParticleId, point: Point) -> Result<Transition, SimulationError> {
        self.apply(SimEvent::DragUpdate { id, point })?;
        self.apply(SimEvent::DragEnd { id, point })
    }

    /// Drag an anode-wire electron across the battery and on to the
    /// cathode, returning the id of the waiting cathode-wire electron.
    fn deliver_electron(&mut self, electron: ParticleId) -> ParticleId {
        let to = match self.drag(electron, BATTERY_MINUS).unwrap().change {
            Change::HandedOff { to, .. } => to,
            other => panic!("expected a hand-off, got {other:?}"),
        };
        let arrived = self.drag(to, CATHODE_END).unwrap();
        assert_eq!(arrived.change, Change::Arrived { id: to });
        to
    }

    fn cathode(&self) -> Point {
        self.sim.config().particles.cathode_target.center()
    }

    /// One full reaction: spawn, deliver the electron, drop the ion.
    fn plate_once(&mut self) -> Transition {
        let (ion, electron) = self.spawn();
        self.deliver_electron(electron);
        let target = self.cathode();
        self.drag(ion, target).unwrap()
    }

    fn count(&self, pred: impl Fn(&Feedback) -> bool) -> usize {
        self.sink.received.iter().filter(|f| pred(f)).count()
    }
}

fn ready() -> Bench {
    let mut bench = Bench::new(PlatingConfig::default());
    bench.connect();
    bench.sink.drain();
    bench
}

#[test]
fn one_full_reaction() {
    let mut bench = ready();
    let reservoir = bench.sim.reservoir();
    assert_eq!(reservoir.anode_mass, dec!(50));
    assert_eq!(reservoir.cathode_mass, dec!(25));
    assert_eq!(reservoir.plated_count, 0);

    let (ion, electron) = bench.spawn();
    assert_eq!(bench.sim.reservoir().anode_mass, dec!(45));
    assert_eq!(bench.sim.particles().len(), 2);

    let waiting = bench.deliver_electron(electron);
    assert!(bench.sim.get(electron).is_none(), "anode electron is replaced");
    let parked = bench.sim.get(waiting).and_then(Particle::as_electron).unwrap();
    assert!(matches!(parked.status, ParticleStatus::Waiting { .. }));
    assert!((parked.progress - 1.0).abs() < f64::EPSILON);
    assert_eq!(parked.position, CATHODE_END);

    let target = bench.cathode();
    let transition = bench.drag(ion, target).unwrap();
    assert_eq!(transition.change, Change::Arrived { id: ion });
    assert_eq!(transition.paired.len(), 1);
    assert!(bench.sim.particles().is_empty());

    let reservoir = bench.sim.reservoir();
    assert_eq!(reservoir.anode_mass, dec!(45));
    assert_eq!(reservoir.cathode_mass, dec!(30));
    assert_eq!(reservoir.plated_count, 1);
    assert!(!reservoir.complete);

    let kinds: Vec<&str> = bench
        .sink
        .received
        .iter()
        .map(|f| match f {
            Feedback::IonSpawned { .. } => "spawned",
            Feedback::ElectronHandedOff { .. } => "handed_off",
            Feedback::ElectronArrived { .. } => "electron_arrived",
            Feedback::IonArrived { .. } => "ion_arrived",
            Feedback::Plated { .. } => "plated",
            _ => "other",
        })
        .collect();
    assert_eq!(
        kinds,
        vec!["spawned", "handed_off", "electron_arrived", "ion_arrived", "plated"]
    );
}

#[test]
fn goal_fires_once_and_anode_depletes_at_threshold() {
    let mut bench = ready();
    // 50 -> 10 in steps of 5 is eight spawns.
    for _ in 0..8 {
        bench.plate_once();
    }
    let reservoir = bench.sim.reservoir();
    assert_eq!(reservoir.anode_mass, dec!(10));
    assert_eq!(reservoir.cathode_mass, dec!(65));
    assert_eq!(reservoir.plated_count, 8);
    assert!(reservoir.complete);
    assert_eq!(
        bench.count(|f| matches!(f, Feedback::GoalComplete { .. })),
        1
    );

    let before = bench.sim.journal().len();
    let err = bench.apply(SimEvent::Spawn).unwrap_err();
    assert_eq!(
        err.rejection(),
        Some(&Rejection::AnodeDepleted {
            anode_mass: dec!(10)
        })
    );
    assert_eq!(bench.sim.journal().len(), before);
    assert!(bench.sim.particles().is_empty());
}

#[test]
fn spawn_is_capped_by_active_particles() {
    let mut bench = ready();
    bench.spawn();
    bench.spawn();
    assert_eq!(bench.sim.active_count(), 4);

    let err = bench.apply(SimEvent::Spawn).unwrap_err();
    assert_eq!(
        err.rejection(),
        Some(&Rejection::CapacityExceeded { active: 4, cap: 5 })
    );
    assert_eq!(bench.sim.reservoir().anode_mass, dec!(40));
    assert_eq!(bench.sim.particles().len(), 4);
}

#[test]
fn spawn_with_five_active_is_rejected() {
    let mut config = PlatingConfig::default();
    config.particles.max_active = 6;
    let mut bench = Bench::new(config);
    bench.connect();

    let (_, first) = bench.spawn();
    bench.spawn();
    bench.spawn();
    // Parking one electron leaves exactly five active particles.
    bench.deliver_electron(first);
    assert_eq!(bench.sim.active_count(), 5);

    let particles_before = bench.sim.particles().to_vec();
    let err = bench.apply(SimEvent::Spawn).unwrap_err();
    assert_eq!(
        err.rejection(),
        Some(&Rejection::CapacityExceeded { active: 5, cap: 6 })
    );
    assert_eq!(bench.sim.particles(), particles_before.as_slice());
}

#[test]
fn completion_is_idempotent() {
    let mut bench = ready();
    let (_, electron) = bench.spawn();
    let waiting = bench.deliver_electron(electron);
    bench.sink.drain();

    let again = bench.drag(waiting, CATHODE_END).unwrap();
    assert_eq!(again.change, Change::Ignored);
    assert!(bench.sink.received.is_empty());
    assert_eq!(bench.sim.particles().len(), 2);
}

#[test]
fn electrons_never_move_backwards() {
    let mut bench = ready();
    let (_, electron) = bench.spawn();
    let mut last = 0.0_f64;
    for point in [
        Point::new(100.0, 200.0),
        Point::new(100.0, 290.0),
        Point::new(300.0, 60.0),
        ANODE_START,
        Point::new(100.0, 100.0),
    ] {
        bench
            .apply(SimEvent::DragUpdate {
                id: electron,
                point,
            })
            .unwrap();
        let progress = bench
            .sim
            .get(electron)
            .and_then(Particle::as_electron)
            .unwrap()
            .progress;
        assert!(progress >= last, "progress fell from {last} to {progress}");
        last = progress;
    }
}

#[test]
fn ions_pair_in_arrival_order() {
    let mut config = PlatingConfig::default();
    config.particles.max_active = 9;
    let mut bench = Bench::new(config);
    bench.connect();

    let (ion_a, electron_a) = bench.spawn();
    let (ion_b, electron_b) = bench.spawn();
    let first = bench.deliver_electron(electron_b);
    let second = bench.deliver_electron(electron_a);

    let target = bench.cathode();
    let t = bench.drag(ion_b, target).unwrap();
    assert_eq!(t.paired.len(), 1);
    assert_eq!(t.paired.first().map(|p| p.electron), Some(first));
    assert!(bench.sim.get(second).is_some());

    let t = bench.drag(ion_a, target).unwrap();
    assert_eq!(t.paired.first().map(|p| (p.ion, p.electron)), Some((ion_a, second)));
    assert!(bench.sim.particles().is_empty());
}

#[test]
fn out_of_bounds_ion_can_still_plate() {
    let mut bench = ready();
    let (ion, electron) = bench.spawn();
    let err = bench.drag(ion, Point::new(950.0, 20.0)).unwrap_err();
    assert_eq!(err.rejection(), Some(&Rejection::OutOfBounds { id: ion }));
    assert_eq!(
        bench.count(|f| matches!(
            f,
            Feedback::Rejected {
                reason: Rejection::OutOfBounds { .. }
            }
        )),
        1
    );

    bench.deliver_electron(electron);
    let target = bench.cathode();
    let t = bench.drag(ion, target).unwrap();
    assert_eq!(t.paired.len(), 1);
    assert_eq!(bench.sim.reservoir().plated_count, 1);
}

#[test]
fn flow_timer_balances_across_restarts() {
    let mut bench = Bench::new(PlatingConfig::default());
    for _ in 0..3 {
        bench.connect();
        let epoch = bench.sim.flow().epoch().unwrap();
        bench.apply(SimEvent::FlowTick { epoch }).unwrap();
        assert!(bench.sim.flow_position().is_some());

        bench.apply(SimEvent::Restart).unwrap();
        // Ticks from the stopped timer are ignored.
        let stale = bench.apply(SimEvent::FlowTick { epoch }).unwrap();
        assert_eq!(stale.change, Change::Ignored);
    }
    let flow = bench.sim.flow();
    assert!(!flow.is_running());
    assert_eq!(flow.starts(), 3);
    assert_eq!(flow.starts(), flow.stops());
    assert!(flow.value().abs() < f64::EPSILON);
}

#[test]
fn spawn_before_connecting_is_rejected_once() {
    let mut bench = Bench::new(PlatingConfig::default());
    let err = bench.apply(SimEvent::Spawn).unwrap_err();
    assert!(matches!(err, SimulationError::Rejected(Rejection::CircuitNotComplete)));
    assert_eq!(
        bench.count(|f| matches!(f, Feedback::Rejected { .. })),
        1
    );
    assert!(bench.sim.journal().is_empty());
}

#[test]
fn waiting_particles_ignore_drags() {
    let mut bench = ready();
    let (ion, electron) = bench.spawn();

    // No electron is waiting yet, so the ion stays active where it was dropped.
    let target = bench.cathode();
    let err = bench.drag(ion, target).unwrap_err();
    assert_eq!(err.rejection(), Some(&Rejection::NoWaitingElectron { id: ion }));
    let dropped = bench.sim.get(ion).unwrap();
    assert_eq!(dropped.kind(), ParticleKind::Ion);
    assert_eq!(dropped.status(), ParticleStatus::Active);
    assert_eq!(dropped.position(), target);

    let waiting = bench.deliver_electron(electron);
    let before = bench.sim.get(waiting).cloned().unwrap();
    assert_eq!(before.kind(), ParticleKind::Electron);
    assert!(matches!(before.status(), ParticleStatus::Waiting { .. }));

    let update = bench
        .apply(SimEvent::DragUpdate {
            id: waiting,
            point: ANODE_START,
        })
        .unwrap();
    assert_eq!(update.change, Change::Ignored);
    let end = bench
        .apply(SimEvent::DragEnd {
            id: waiting,
            point: ANODE_START,
        })
        .unwrap();
    assert_eq!(end.change, Change::Ignored);
    assert_eq!(bench.sim.get(waiting), Some(&before));

    // Dropping the ion again pairs it; its id no longer resolves afterwards.
    let t = bench.drag(ion, target).unwrap();
    assert_eq!(t.paired.len(), 1);
    let gone = bench
        .apply(SimEvent::DragUpdate {
            id: ion,
            point: target,
        })
        .unwrap();
    assert_eq!(gone.change, Change::Ignored);
    assert!(bench.sim.get(ion).is_none());
}

#[test]
fn snapshot_reflects_a_lesson_in_progress() {
    let mut bench = ready();
    let (first_ion, first_electron) = bench.spawn();
    let (second_ion, second_electron) = bench.spawn();
    let waiting = bench.deliver_electron(first_electron);
    bench
        .apply(SimEvent::DragUpdate {
            id: second_ion,
            point: Point::new(400.0, 400.0),
        })
        .unwrap();
    let epoch = bench.sim.flow().epoch().unwrap();
    bench.apply(SimEvent::FlowTick { epoch }).unwrap();

    let snapshot = bench.sim.snapshot();
    let ids: Vec<ParticleId> = snapshot.particles.iter().map(Particle::id).collect();
    assert_eq!(ids, vec![first_ion, second_ion, second_electron, waiting]);
    assert_eq!(
        snapshot.particles.get(1).map(Particle::position),
        Some(Point::new(400.0, 400.0))
    );
    assert_eq!(snapshot.reservoir.anode_mass, dec!(40));
    assert_eq!(snapshot.reservoir.cathode_mass, dec!(25));
    assert_eq!(snapshot.reservoir.plated_count, 0);
    assert!(snapshot.circuit_complete);

    let value = bench.sim.flow().value();
    assert!(value > 0.0);
    let expected = bench.sim.paths().map(|paths| paths.position_along(value));
    assert_eq!(snapshot.flow_position, expected);

    let json = serde_json::to_string(&snapshot).unwrap();
    let back: SimulationSnapshot = serde_json::from_str(&json).unwrap();
    assert_eq!(back, snapshot);

    bench
        .apply(SimEvent::SetWire {
            segment: Segment::AnodeWire,
            connected: false,
        })
        .unwrap();
    let broken = bench.sim.snapshot();
    assert!(!broken.circuit_complete);
    assert_eq!(broken.flow_position, None);
    assert_eq!(broken.particles, snapshot.particles);
}

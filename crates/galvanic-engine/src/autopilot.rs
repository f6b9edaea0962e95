//! Autopilot: a scripted learner that plays the lesson to completion.
//!
//! The autopilot looks at the simulation after every event and decides what
//! a careful learner would do next: lay out the wires, connect them, spawn
//! an ion, drag its electron around the circuit, then drag the ion onto the
//! cathode. Pointer positions get a small seeded jitter so the drags look
//! like a hand, and now and then the ion is dropped outside the beaker to
//! exercise the reset path.

use std::collections::VecDeque;

use galvanic_core::{PlatingConfig, SimEvent, Simulation, Viewport, WirePaths, route_wire};
use galvanic_types::{Particle, ParticleId, Point, Segment};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Deserialize;
use tracing::debug;

use crate::error::EngineError;

// -----------------------------------------------------------------------
// Configuration
// -----------------------------------------------------------------------

/// Configuration for the autopilot, loaded from the `autopilot` section of
/// `galvanic-config.yaml`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AutopilotConfig {
    /// Seed for the pointer jitter.
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Maximum pointer jitter, in logical units.
    #[serde(default = "default_jitter")]
    pub jitter: f64,

    /// Pointer moves per drag.
    #[serde(default = "default_drag_steps")]
    pub drag_steps: u32,

    /// Probability of dropping an ion outside the electrolyte.
    #[serde(default = "default_slip_rate")]
    pub slip_rate: f64,

    /// Real-time milliseconds between autopilot actions.
    #[serde(default = "default_step_interval_ms")]
    pub step_interval_ms: u64,

    /// Number of lessons to play back to back, restarting in between.
    #[serde(default = "default_lessons")]
    pub lessons: u32,

    /// Safety limit on the number of autopilot actions.
    #[serde(default = "default_max_steps")]
    pub max_steps: u64,

    /// Size of the device surface the anchors are measured on.
    #[serde(default)]
    pub device: DeviceSize,

    /// Wire anchors, in device pixels.
    #[serde(default)]
    pub anchors: Anchors,
}

impl Default for AutopilotConfig {
    fn default() -> Self {
        Self {
            seed: default_seed(),
            jitter: default_jitter(),
            drag_steps: default_drag_steps(),
            slip_rate: default_slip_rate(),
            step_interval_ms: default_step_interval_ms(),
            lessons: default_lessons(),
            max_steps: default_max_steps(),
            device: DeviceSize::default(),
            anchors: Anchors::default(),
        }
    }
}

impl AutopilotConfig {
    /// Check the values for consistency.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Autopilot`] describing the first problem.
    pub fn validate(&self) -> Result<(), EngineError> {
        let invalid = |message: &str| {
            Err(EngineError::Autopilot {
                message: message.to_owned(),
            })
        };
        if !(self.jitter >= 0.0 && self.jitter.is_finite()) {
            return invalid("jitter must be a non-negative number");
        }
        if self.drag_steps == 0 {
            return invalid("drag_steps must be at least 1");
        }
        if !(0.0..=1.0).contains(&self.slip_rate) {
            return invalid("slip_rate must be in [0, 1]");
        }
        if self.lessons == 0 {
            return invalid("lessons must be at least 1");
        }
        if self.max_steps == 0 {
            return invalid("max_steps must be at least 1");
        }
        Ok(())
    }

    /// Lay out both wires from the anchors, mapped into the logical frame.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Geometry`] if the device size is empty or the
    /// anchors do not produce valid paths.
    pub fn wire_paths(&self, plating: &PlatingConfig) -> Result<WirePaths, EngineError> {
        let viewport = Viewport::new(
            self.device.width,
            self.device.height,
            plating.world.logical_width,
            plating.world.logical_height,
        )?;
        let a = &self.anchors;
        let logical = |p: Point| viewport.to_logical(p);
        Ok(WirePaths {
            anode: route_wire(logical(a.anode_terminal), logical(a.battery_negative))?,
            cathode: route_wire(logical(a.battery_positive), logical(a.cathode_terminal))?,
        })
    }
}

/// Device surface size in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct DeviceSize {
    /// Width in pixels.
    pub width: f64,
    /// Height in pixels.
    pub height: f64,
}

impl Default for DeviceSize {
    fn default() -> Self {
        Self {
            width: 1000.0,
            height: 600.0,
        }
    }
}

/// Where the wires attach, in device pixels.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Anchors {
    /// Top of the anode electrode.
    pub anode_terminal: Point,
    /// Negative battery terminal.
    pub battery_negative: Point,
    /// Positive battery terminal.
    pub battery_positive: Point,
    /// Top of the cathode electrode.
    pub cathode_terminal: Point,
}

impl Default for Anchors {
    fn default() -> Self {
        Self {
            anode_terminal: Point::new(300.0, 300.0),
            battery_negative: Point::new(480.0, 60.0),
            battery_positive: Point::new(560.0, 60.0),
            cathode_terminal: Point::new(700.0, 300.0),
        }
    }
}

const fn default_seed() -> u64 {
    7
}

const fn default_jitter() -> f64 {
    4.0
}

const fn default_drag_steps() -> u32 {
    12
}

const fn default_slip_rate() -> f64 {
    0.1
}

const fn default_step_interval_ms() -> u64 {
    20
}

const fn default_lessons() -> u32 {
    1
}

const fn default_max_steps() -> u64 {
    5_000
}

// -----------------------------------------------------------------------
// Autopilot
// -----------------------------------------------------------------------

/// A scripted learner.
#[derive(Debug)]
pub struct Autopilot {
    config: AutopilotConfig,
    paths: WirePaths,
    rng: StdRng,
    queue: VecDeque<SimEvent>,
    laid_out: bool,
    anode_connected: bool,
    cathode_connected: bool,
    steps: u64,
}

impl Autopilot {
    /// Create an autopilot for the given configs.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] if the autopilot config is invalid or the
    /// wire layout fails.
    pub fn new(config: AutopilotConfig, plating: &PlatingConfig) -> Result<Self, EngineError> {
        config.validate()?;
        let paths = config.wire_paths(plating)?;
        let rng = StdRng::seed_from_u64(config.seed);
        Ok(Self {
            config,
            paths,
            rng,
            queue: VecDeque::new(),
            laid_out: false,
            anode_connected: false,
            cathode_connected: false,
            steps: 0,
        })
    }

    /// The configuration the autopilot was created with.
    pub const fn config(&self) -> &AutopilotConfig {
        &self.config
    }

    /// Number of actions taken so far.
    pub const fn steps(&self) -> u64 {
        self.steps
    }

    /// Whether the step limit has been reached.
    pub const fn exhausted(&self) -> bool {
        self.steps >= self.config.max_steps
    }

    /// Forget the wiring so the next actions reconnect the circuit.
    ///
    /// Called after a restart clears the latches.
    pub fn rewire(&mut self) {
        self.queue.clear();
        self.anode_connected = false;
        self.cathode_connected = false;
    }

    /// Decide the next action, or `None` once the lesson is complete.
    pub fn next_event(&mut self, sim: &Simulation) -> Option<SimEvent> {
        if sim.reservoir().complete || self.exhausted() {
            return None;
        }
        let event = self.plan(sim);
        self.steps = self.steps.saturating_add(1);
        Some(event)
    }

    fn plan(&mut self, sim: &Simulation) -> SimEvent {
        if !self.laid_out {
            self.laid_out = true;
            return SimEvent::UpdatePaths(self.paths.clone());
        }
        if !self.anode_connected {
            self.anode_connected = true;
            return SimEvent::SetWire {
                segment: Segment::AnodeWire,
                connected: true,
            };
        }
        if !self.cathode_connected {
            self.cathode_connected = true;
            return SimEvent::SetWire {
                segment: Segment::CathodeWire,
                connected: true,
            };
        }
        if let Some(event) = self.queue.pop_front() {
            return event;
        }

        let particles = sim.particles();
        let active_electron = particles.iter().find_map(|p| match p {
            Particle::Electron(e) if e.status.is_active() => Some((e.id, e.segment)),
            _ => None,
        });
        let electron_waiting = particles
            .iter()
            .any(|p| matches!(p, Particle::Electron(e) if !e.status.is_active()));
        let active_ion = particles.iter().find_map(|p| match p {
            Particle::Ion(ion) if ion.status.is_active() => Some((ion.id, ion.position)),
            _ => None,
        });

        if let Some((id, segment)) = active_electron {
            self.queue_electron_drag(id, segment);
        } else if let (Some((id, from)), true) = (active_ion, electron_waiting) {
            self.queue_ion_drag(id, from, sim.config());
        } else {
            return SimEvent::Spawn;
        }
        self.queue.pop_front().unwrap_or(SimEvent::Spawn)
    }

    fn queue_electron_drag(&mut self, id: ParticleId, segment: Segment) {
        let path = match segment {
            Segment::AnodeWire => &self.paths.anode,
            Segment::CathodeWire => &self.paths.cathode,
        };
        let end = path.end();
        let steps = self.config.drag_steps;
        let points: Vec<Point> = (1..steps)
            .map(|k| path.point_at_progress(f64::from(k) / f64::from(steps)))
            .collect();
        for point in points {
            let point = self.jitter(point);
            self.queue.push_back(SimEvent::DragUpdate { id, point });
        }
        self.queue.push_back(SimEvent::DragUpdate { id, point: end });
        self.queue.push_back(SimEvent::DragEnd { id, point: end });
        debug!(%id, ?segment, steps, "electron drag queued");
    }

    fn queue_ion_drag(&mut self, id: ParticleId, from: Point, plating: &PlatingConfig) {
        let particles = &plating.particles;
        let slip = self.rng.random_bool(self.config.slip_rate);
        let target = if slip {
            // Just past the far corner of the beaker.
            Point::new(particles.electrolyte.max.x + 40.0, particles.electrolyte.min.y - 40.0)
        } else {
            particles.cathode_target.center()
        };

        let steps = self.config.drag_steps;
        for k in 1..steps {
            let point = self.jitter(from.lerp(target, f64::from(k) / f64::from(steps)));
            self.queue.push_back(SimEvent::DragUpdate { id, point });
        }
        self.queue.push_back(SimEvent::DragUpdate { id, point: target });
        self.queue.push_back(SimEvent::DragEnd { id, point: target });
        debug!(%id, slip, "ion drag queued");
    }

    fn jitter(&mut self, point: Point) -> Point {
        let j = self.config.jitter;
        if j <= 0.0 {
            return point;
        }
        Point::new(
            point.x + self.rng.random_range(-j..=j),
            point.y + self.rng.random_range(-j..=j),
        )
    }
}

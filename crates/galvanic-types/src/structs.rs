//! Core entity structs for the Galvanic plating simulation.
//!
//! Particles are a tagged union: an [`Ion`] has no wire binding at all, and
//! an [`Electron`] always carries its [`Segment`] and progress. Invalid field
//! combinations cannot be represented.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{MassEntryType, ParticleKind, Segment};
use crate::ids::ParticleId;

// ---------------------------------------------------------------------------
// Geometry primitives
// ---------------------------------------------------------------------------

/// A 2-D coordinate in the logical reference frame.
///
/// The logical frame is independent of device pixels; the presentation
/// layer maps pointer positions into it before calling the core.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Point {
    /// Horizontal coordinate.
    pub x: f64,
    /// Vertical coordinate (grows downward, as on screen).
    pub y: f64,
}

impl Point {
    /// Create a point from its coordinates.
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    pub fn distance(self, other: Self) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// Linear interpolation towards `other`; `t = 0` is `self`, `t = 1` is `other`.
    pub fn lerp(self, other: Self, t: f64) -> Self {
        Self {
            x: (other.x - self.x).mul_add(t, self.x),
            y: (other.y - self.y).mul_add(t, self.y),
        }
    }

    /// Whether both coordinates are finite numbers.
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// An axis-aligned rectangular region of the logical frame.
///
/// Containment is inclusive on every edge.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Rect {
    /// Top-left corner.
    pub min: Point,
    /// Bottom-right corner.
    pub max: Point,
}

impl Rect {
    /// Whether `point` lies inside the rectangle or on its border.
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
    }

    /// Whether the rectangle encloses a non-zero area.
    pub fn has_area(&self) -> bool {
        self.max.x > self.min.x && self.max.y > self.min.y
    }

    /// Whether `other` lies entirely inside this rectangle.
    pub fn encloses(&self, other: &Self) -> bool {
        self.contains(other.min) && self.contains(other.max)
    }

    /// Center of the rectangle.
    pub fn center(&self) -> Point {
        self.min.lerp(self.max, 0.5)
    }
}

// ---------------------------------------------------------------------------
// Particles
// ---------------------------------------------------------------------------

/// Lifecycle status of a live particle.
///
/// There is no `Consumed` status: a consumed particle is removed from the
/// registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[serde(tag = "state", rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum ParticleStatus {
    /// Participating in the simulation and drag-able.
    #[default]
    Active,
    /// Arrived at its destination and eligible for pairing.
    Waiting {
        /// Arrival sequence number; lower values arrived earlier.
        since: u64,
    },
}

impl ParticleStatus {
    /// Whether the particle can still be dragged.
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Active)
    }

    /// The arrival sequence number, if the particle is waiting.
    pub const fn waiting_since(self) -> Option<u64> {
        match self {
            Self::Active => None,
            Self::Waiting { since } => Some(since),
        }
    }
}

/// A dissolved silver cation, free to move inside the electrolyte.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Ion {
    /// Unique particle id.
    pub id: ParticleId,
    /// Current position in the logical frame.
    pub position: Point,
    /// Lifecycle status.
    pub status: ParticleStatus,
    /// Number of times the ion was sent back to its origin after leaving
    /// the electrolyte. The presentation layer keys its sprite on this.
    pub resets: u32,
}

/// A charge carrier bound to one wire and travelling one way along it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Electron {
    /// Unique particle id.
    pub id: ParticleId,
    /// Current position, derived from `progress` along the segment's path.
    pub position: Point,
    /// Lifecycle status.
    pub status: ParticleStatus,
    /// The wire this electron travels along.
    pub segment: Segment,
    /// Fractional position along the wire in `[0, 1]`; never decreases.
    pub progress: f64,
}

/// A live particle: either an ion or an electron.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(tag = "kind", rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum Particle {
    /// A free ion in the electrolyte.
    Ion(Ion),
    /// An electron bound to a wire.
    Electron(Electron),
}

impl Particle {
    /// The particle's id.
    pub const fn id(&self) -> ParticleId {
        match self {
            Self::Ion(ion) => ion.id,
            Self::Electron(electron) => electron.id,
        }
    }

    /// The particle's kind.
    pub const fn kind(&self) -> ParticleKind {
        match self {
            Self::Ion(_) => ParticleKind::Ion,
            Self::Electron(_) => ParticleKind::Electron,
        }
    }

    /// The particle's status.
    pub const fn status(&self) -> ParticleStatus {
        match self {
            Self::Ion(ion) => ion.status,
            Self::Electron(electron) => electron.status,
        }
    }

    /// The particle's current position.
    pub const fn position(&self) -> Point {
        match self {
            Self::Ion(ion) => ion.position,
            Self::Electron(electron) => electron.position,
        }
    }

    /// Borrow the ion payload, if this is an ion.
    pub const fn as_ion(&self) -> Option<&Ion> {
        match self {
            Self::Ion(ion) => Some(ion),
            Self::Electron(_) => None,
        }
    }

    /// Borrow the electron payload, if this is an electron.
    pub const fn as_electron(&self) -> Option<&Electron> {
        match self {
            Self::Ion(_) => None,
            Self::Electron(electron) => Some(electron),
        }
    }
}

// ---------------------------------------------------------------------------
// Reservoir ledger
// ---------------------------------------------------------------------------

/// A single append-only record of silver moving between reservoirs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct MassEntry {
    /// Position of the entry in the journal, starting at 1.
    pub seq: u64,
    /// Direction of the movement.
    pub entry_type: MassEntryType,
    /// Number of particles involved (1 for a dissolve, `pairs` for a plate).
    pub particles: u32,
    /// Mass moved by this entry.
    #[ts(as = "String")]
    pub quantity: Decimal,
    /// Anode mass after the entry was applied.
    #[ts(as = "String")]
    pub anode_after: Decimal,
    /// Cathode mass after the entry was applied.
    #[ts(as = "String")]
    pub cathode_after: Decimal,
}

/// Read-only view of the reservoir ledger for the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ReservoirSnapshot {
    /// Remaining anode mass.
    #[ts(as = "String")]
    pub anode_mass: Decimal,
    /// Current cathode mass.
    #[ts(as = "String")]
    pub cathode_mass: Decimal,
    /// Number of completed plating reactions.
    pub plated_count: u32,
    /// Number of reactions needed to finish the lesson.
    pub plating_goal: u32,
    /// Whether the goal has been reached.
    pub complete: bool,
}

/// Everything the presentation layer renders, captured after an event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct SimulationSnapshot {
    /// Live particles in insertion order.
    pub particles: Vec<Particle>,
    /// Reservoir masses and plating progress.
    pub reservoir: ReservoirSnapshot,
    /// Whether both wires are connected.
    pub circuit_complete: bool,
    /// Position of the current-flow indicator, when the circuit is complete
    /// and wire paths are known.
    pub flow_position: Option<Point>,
}

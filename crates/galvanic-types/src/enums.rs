//! Enumeration types for the Galvanic plating simulation.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ---------------------------------------------------------------------------
// Wires
// ---------------------------------------------------------------------------

/// One of the two wires of the plating circuit.
///
/// Used both for the connection latches and as the path an electron is
/// currently bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum Segment {
    /// The wire from the silver anode to the battery.
    AnodeWire,
    /// The wire from the battery to the cathode (the object being plated).
    CathodeWire,
}

impl Segment {
    /// Return the wire on the other side of the battery.
    pub const fn other(self) -> Self {
        match self {
            Self::AnodeWire => Self::CathodeWire,
            Self::CathodeWire => Self::AnodeWire,
        }
    }
}

// ---------------------------------------------------------------------------
// Particles
// ---------------------------------------------------------------------------

/// Coarse particle classification used by queries and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum ParticleKind {
    /// A dissolved silver cation drifting through the electrolyte.
    Ion,
    /// A charge carrier confined to a wire.
    Electron,
}

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

/// Category of a reservoir mass movement.
///
/// | Type | From | To |
/// |------|------|----|
/// | Dissolve | Anode | Solution |
/// | Plate | Solution | Cathode |
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum MassEntryType {
    /// Silver leaves the anode as an ion (one spawn).
    Dissolve,
    /// Silver deposits on the cathode (one or more pairings).
    Plate,
}

// ---------------------------------------------------------------------------
// Feedback cues
// ---------------------------------------------------------------------------

/// Sound cue the presentation layer plays for a piece of feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum Cue {
    /// Short pop when a particle appears.
    Pop,
    /// Soft click for wiring changes and arrivals.
    Click,
    /// Chime for a successful plating reaction.
    Chime,
    /// Buzz for a rejected action.
    Error,
    /// Played once when the plating goal is reached.
    Fanfare,
}

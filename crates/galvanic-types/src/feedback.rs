//! Feedback emitted by the simulation for the presentation layer.
//!
//! Every transition the user should notice produces one [`Feedback`] value.
//! Rejected actions carry a [`Rejection`], the recoverable user-facing
//! condition that blocked them.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::Cue;
use crate::ids::ParticleId;

/// A recoverable condition that blocked a requested action.
///
/// None of these are programming errors. Each is detected where the action
/// is requested, surfaced once, and leaves the simulation in a consistent
/// state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, thiserror::Error)]
#[serde(tag = "reason", rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum Rejection {
    /// Spawn attempted before both wires were connected.
    #[error("the circuit is not complete; connect both wires first")]
    CircuitNotComplete,

    /// Spawn attempted with the anode at or under the depletion threshold.
    #[error("the anode is depleted ({anode_mass} remaining)")]
    AnodeDepleted {
        /// Anode mass at the time of the attempt.
        #[ts(as = "String")]
        anode_mass: Decimal,
    },

    /// Spawn attempted with too many active particles.
    #[error("too many active particles ({active} active, cap {cap})")]
    CapacityExceeded {
        /// Active particles at the time of the attempt.
        active: u32,
        /// Configured cap.
        cap: u32,
    },

    /// An ion was dropped outside the electrolyte and returned to its origin.
    #[error("ion {id} left the solution and was returned")]
    OutOfBounds {
        /// The ion that was reset.
        id: ParticleId,
    },

    /// An ion was dropped on the cathode with no electron waiting for it.
    #[error("ion {id} reached the cathode but no electron is waiting")]
    NoWaitingElectron {
        /// The ion that was dropped.
        id: ParticleId,
    },
}

/// A notification for the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "type", rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum Feedback {
    /// A spawn dissolved silver from the anode.
    IonSpawned {
        /// The new ion.
        ion: ParticleId,
        /// The electron released onto the anode wire.
        electron: ParticleId,
        /// Anode mass after the spawn.
        #[ts(as = "String")]
        anode_mass: Decimal,
    },

    /// An electron crossed the battery onto the cathode wire.
    ElectronHandedOff {
        /// The electron that completed the anode wire (now removed).
        from: ParticleId,
        /// The new electron at the start of the cathode wire.
        to: ParticleId,
    },

    /// An electron reached the cathode and is waiting for an ion.
    ElectronArrived {
        /// The waiting electron.
        id: ParticleId,
    },

    /// An ion reached the cathode and is waiting for pairing.
    IonArrived {
        /// The waiting ion.
        id: ParticleId,
    },

    /// One or more ion/electron pairs plated onto the cathode.
    Plated {
        /// Number of pairs consumed in this batch.
        pairs: u32,
        /// Cathode mass after the batch.
        #[ts(as = "String")]
        cathode_mass: Decimal,
        /// Total reactions so far.
        plated_count: u32,
    },

    /// The plating goal was reached. Emitted at most once per run.
    GoalComplete {
        /// Total reactions when the goal was reached.
        plated_count: u32,
    },

    /// A requested action was rejected.
    Rejected {
        /// Why it was rejected.
        reason: Rejection,
    },

    /// The circuit became complete or broken.
    CircuitChanged {
        /// Whether both wires are now connected.
        complete: bool,
    },

    /// The simulation was reset to its initial state.
    Restarted,
}

impl Feedback {
    /// The sound cue the presentation layer plays, if any.
    pub const fn cue(&self) -> Option<Cue> {
        match self {
            Self::IonSpawned { .. } | Self::ElectronHandedOff { .. } => Some(Cue::Pop),
            Self::ElectronArrived { .. } | Self::IonArrived { .. } => Some(Cue::Click),
            Self::CircuitChanged { complete: true } => Some(Cue::Click),
            Self::Plated { .. } => Some(Cue::Chime),
            Self::GoalComplete { .. } => Some(Cue::Fanfare),
            Self::Rejected { .. } => Some(Cue::Error),
            Self::CircuitChanged { complete: false } | Self::Restarted => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn rejection_messages_are_readable() {
        let depleted = Rejection::AnodeDepleted {
            anode_mass: dec!(10),
        };
        assert!(depleted.to_string().contains("10"));

        let cap = Rejection::CapacityExceeded { active: 5, cap: 5 };
        assert!(cap.to_string().contains("cap 5"));
    }

    #[test]
    fn cues_follow_feedback_kind() {
        let id = ParticleId::from_sequence(1);
        assert_eq!(Feedback::IonArrived { id }.cue(), Some(Cue::Click));
        assert_eq!(
            Feedback::Rejected {
                reason: Rejection::CircuitNotComplete
            }
            .cue(),
            Some(Cue::Error)
        );
        assert_eq!(Feedback::GoalComplete { plated_count: 5 }.cue(), Some(Cue::Fanfare));
        assert_eq!(Feedback::CircuitChanged { complete: false }.cue(), None);
        assert_eq!(Feedback::Restarted.cue(), None);
    }

    #[test]
    fn rejection_serializes_with_reason_tag() {
        let json = serde_json::to_value(Rejection::CircuitNotComplete).unwrap_or_default();
        assert_eq!(json["reason"], "circuit_not_complete");
    }
}

//! Shared type definitions for the Galvanic plating simulation.
//!
//! This crate is the single source of truth for all types that cross the
//! boundary between the simulation core and the presentation layer. Types
//! flow downstream to `TypeScript` via `ts-rs`.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrapper for particle identifiers
//! - [`enums`] -- Wires, particle kinds, ledger entry types, sound cues
//! - [`structs`] -- Points, regions, particles, ledger records, snapshots
//! - [`feedback`] -- Notifications and rejection reasons

pub mod enums;
pub mod feedback;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{Cue, MassEntryType, ParticleKind, Segment};
pub use feedback::{Feedback, Rejection};
pub use ids::ParticleId;
pub use structs::{
    Electron, Ion, MassEntry, Particle, ParticleStatus, Point, Rect, ReservoirSnapshot,
    SimulationSnapshot,
};

#[cfg(test)]
mod tests {
    //! `TypeScript` binding generation for the presentation layer.

    #[test]
    fn export_bindings() {
        // ts-rs writes bindings for every #[ts(export)] type into the
        // `bindings/` directory relative to the crate root.
        use ts_rs::TS;

        let _ = crate::ids::ParticleId::export_all();

        let _ = crate::enums::Segment::export_all();
        let _ = crate::enums::ParticleKind::export_all();
        let _ = crate::enums::MassEntryType::export_all();
        let _ = crate::enums::Cue::export_all();

        let _ = crate::structs::Point::export_all();
        let _ = crate::structs::Rect::export_all();
        let _ = crate::structs::ParticleStatus::export_all();
        let _ = crate::structs::Ion::export_all();
        let _ = crate::structs::Electron::export_all();
        let _ = crate::structs::Particle::export_all();
        let _ = crate::structs::MassEntry::export_all();
        let _ = crate::structs::ReservoirSnapshot::export_all();
        let _ = crate::structs::SimulationSnapshot::export_all();

        let _ = crate::feedback::Rejection::export_all();
        let _ = crate::feedback::Feedback::export_all();
    }
}

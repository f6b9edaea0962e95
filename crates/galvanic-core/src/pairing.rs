//! Pairing: matching waiting ions with waiting electrons at the cathode.
//!
//! Pairing is planned first and applied afterwards. [`plan`] only reads the
//! registry, so the caller can record the batch in the ledger before any
//! particle is removed. If the ledger refuses, nothing has changed.

use serde::{Deserialize, Serialize};

use galvanic_types::ParticleId;

use crate::registry::ParticleRegistry;

/// One ion/electron pair consumed by a plating reaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pairing {
    /// The waiting ion.
    pub ion: ParticleId,
    /// The waiting electron.
    pub electron: ParticleId,
}

/// Plan the pairs to consume now.
///
/// Returns `min(waiting ions, waiting electrons)` pairs, matching the
/// earliest-arrived ion with the earliest-arrived electron, and so on.
pub fn plan(registry: &ParticleRegistry) -> Vec<Pairing> {
    registry
        .waiting_ions()
        .into_iter()
        .zip(registry.waiting_electrons())
        .map(|(ion, electron)| Pairing { ion, electron })
        .collect()
}

/// All particle ids consumed by `pairs`.
pub fn consumed_ids(pairs: &[Pairing]) -> Vec<ParticleId> {
    pairs.iter().flat_map(|p| [p.ion, p.electron]).collect()
}

//! Type-safe identifier wrapper around [`Uuid`].
//!
//! Particles are identified by [`ParticleId`]. The simulation never mints
//! ids itself: an id source is injected so tests can produce deterministic
//! sequences while the engine binary uses time-ordered UUID v7 values.

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

/// Unique identifier for an ion or electron in the simulation.
///
/// Ids are immutable for the lifetime of a particle. An electron handed off
/// at the battery terminal receives a fresh id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ParticleId(pub Uuid);

impl ParticleId {
    /// Create a new identifier using UUID v7 (time-ordered).
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Create a deterministic identifier from a sequence number.
    ///
    /// The sequence number occupies the low bits of the UUID, so ids built
    /// from increasing numbers also sort in increasing order.
    pub fn from_sequence(n: u64) -> Self {
        Self(Uuid::from_u128(u128::from(n)))
    }

    /// Return the inner [`Uuid`] value.
    pub const fn into_inner(self) -> Uuid {
        self.0
    }
}

impl Default for ParticleId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for ParticleId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for ParticleId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl From<ParticleId> for Uuid {
    fn from(id: ParticleId) -> Self {
        id.0
    }
}

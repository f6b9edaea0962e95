//! The particle registry: every live ion and electron, in insertion order.
//!
//! The registry knows nothing about the transition rules. It stores
//! particles, stamps arrival order when a particle starts waiting, and
//! removes batches atomically. [`crate::simulation`] decides *when* each of
//! these happens.

use galvanic_types::{Electron, Ion, Particle, ParticleId, ParticleStatus, Point, Segment};

// ---------------------------------------------------------------------------
// Id sources
// ---------------------------------------------------------------------------

/// Supplies ids for new particles.
///
/// Injected into the simulation so tests can use deterministic ids.
pub trait IdSource: Send {
    /// Return a fresh id, distinct from every id returned before.
    fn next_id(&mut self) -> ParticleId;
}

/// Deterministic ids `1, 2, 3, ...` encoded as UUIDs.
#[derive(Debug, Clone, Default)]
pub struct SequentialIds {
    issued: u64,
}

impl SequentialIds {
    /// Create a source whose first id is sequence number 1.
    pub const fn new() -> Self {
        Self { issued: 0 }
    }
}

impl IdSource for SequentialIds {
    fn next_id(&mut self) -> ParticleId {
        self.issued = self.issued.saturating_add(1);
        ParticleId::from_sequence(self.issued)
    }
}

/// Time-ordered UUID v7 ids.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimeOrderedIds;

impl IdSource for TimeOrderedIds {
    fn next_id(&mut self) -> ParticleId {
        ParticleId::new()
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Owns the set of live particles.
#[derive(Debug, Clone, Default)]
pub struct ParticleRegistry {
    /// Live particles in insertion order.
    particles: Vec<Particle>,
    /// Last arrival sequence number handed out.
    arrivals: u64,
}

impl ParticleRegistry {
    /// Create an empty registry.
    pub const fn new() -> Self {
        Self {
            particles: Vec::new(),
            arrivals: 0,
        }
    }

    /// Remove every particle and restart the arrival sequence.
    pub fn clear(&mut self) {
        self.particles.clear();
        self.arrivals = 0;
    }

    /// All live particles in insertion order.
    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// Mutable iteration over all live particles.
    pub fn particles_mut(&mut self) -> impl Iterator<Item = &mut Particle> {
        self.particles.iter_mut()
    }

    /// Number of live particles.
    pub fn len(&self) -> usize {
        self.particles.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// Look up a particle by id.
    pub fn get(&self, id: ParticleId) -> Option<&Particle> {
        self.particles.iter().find(|p| p.id() == id)
    }

    /// Look up an ion by id.
    pub fn ion(&self, id: ParticleId) -> Option<&Ion> {
        self.get(id).and_then(Particle::as_ion)
    }

    /// Look up an electron by id.
    pub fn electron(&self, id: ParticleId) -> Option<&Electron> {
        self.get(id).and_then(Particle::as_electron)
    }

    /// Mutable access to an ion by id.
    pub fn ion_mut(&mut self, id: ParticleId) -> Option<&mut Ion> {
        self.particles.iter_mut().find_map(|p| match p {
            Particle::Ion(ion) if ion.id == id => Some(ion),
            _ => None,
        })
    }

    /// Mutable access to an electron by id.
    pub fn electron_mut(&mut self, id: ParticleId) -> Option<&mut Electron> {
        self.particles.iter_mut().find_map(|p| match p {
            Particle::Electron(electron) if electron.id == id => Some(electron),
            _ => None,
        })
    }

    /// Number of particles in `Active` status.
    pub fn active_count(&self) -> usize {
        self.particles
            .iter()
            .filter(|p| p.status().is_active())
            .count()
    }

    /// Number of ions still in solution, active or waiting.
    pub fn ions_in_solution(&self) -> usize {
        self.particles
            .iter()
            .filter(|p| matches!(p, Particle::Ion(_)))
            .count()
    }

    /// Whether at least one electron is waiting at the cathode.
    pub fn has_waiting_electron(&self) -> bool {
        self.particles
            .iter()
            .any(|p| matches!(p, Particle::Electron(e) if !e.status.is_active()))
    }

    /// Insert a new active ion.
    pub fn insert_ion(&mut self, id: ParticleId, position: Point) {
        self.particles.push(Particle::Ion(Ion {
            id,
            position,
            status: ParticleStatus::Active,
            resets: 0,
        }));
    }

    /// Insert a new active electron at the start of `segment`.
    pub fn insert_electron(&mut self, id: ParticleId, segment: Segment, position: Point) {
        self.particles.push(Particle::Electron(Electron {
            id,
            position,
            status: ParticleStatus::Active,
            segment,
            progress: 0.0,
        }));
    }

    /// Stamp the next arrival sequence number for a particle entering
    /// `Waiting`.
    pub const fn next_arrival(&mut self) -> u64 {
        self.arrivals = self.arrivals.saturating_add(1);
        self.arrivals
    }

    /// Remove a single particle, returning it if it existed.
    pub fn remove(&mut self, id: ParticleId) -> Option<Particle> {
        let index = self.particles.iter().position(|p| p.id() == id)?;
        Some(self.particles.remove(index))
    }

    /// Remove every particle whose id is in `ids` in one pass.
    ///
    /// Returns the number of particles removed.
    pub fn remove_all(&mut self, ids: &[ParticleId]) -> usize {
        let before = self.particles.len();
        self.particles.retain(|p| !ids.contains(&p.id()));
        before.saturating_sub(self.particles.len())
    }

    /// Waiting ions, earliest arrival first.
    pub fn waiting_ions(&self) -> Vec<ParticleId> {
        self.waiting(|p| matches!(p, Particle::Ion(_)))
    }

    /// Waiting electrons, earliest arrival first.
    pub fn waiting_electrons(&self) -> Vec<ParticleId> {
        self.waiting(|p| matches!(p, Particle::Electron(_)))
    }

    fn waiting(&self, keep: impl Fn(&Particle) -> bool) -> Vec<ParticleId> {
        let mut waiting: Vec<(u64, ParticleId)> = self
            .particles
            .iter()
            .filter(|p| keep(p))
            .filter_map(|p| p.status().waiting_since().map(|since| (since, p.id())))
            .collect();
        waiting.sort_unstable_by_key(|(since, _)| *since);
        waiting.into_iter().map(|(_, id)| id).collect()
    }
}

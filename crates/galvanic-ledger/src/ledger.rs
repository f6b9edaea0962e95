//! The reservoir ledger: anode depletion, cathode growth, plating progress.
//!
//! # Design
//!
//! - **Append-only journal**: every change to a mass is a [`MassEntry`];
//!   entries are never modified or deleted (restart starts a new journal).
//! - **Checked arithmetic**: every mass update uses checked [`Decimal`]
//!   operations and is computed in full before anything is written, so a
//!   failed update leaves the ledger untouched.
//! - **One-shot completion**: the goal signal fires the first time
//!   `plated_count` reaches `plating_goal` and never again in the same run.

use rust_decimal::Decimal;
use tracing::{debug, info};

use galvanic_types::{MassEntry, MassEntryType, ReservoirSnapshot};

use crate::LedgerError;
use crate::conservation::{ConservationResult, Levels, verify_conservation};

// ---------------------------------------------------------------------------
// Parameters
// ---------------------------------------------------------------------------

/// Initial reservoir state and the fixed rules for moving mass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReservoirParams {
    /// Anode mass at the start of a run.
    pub anode_mass: Decimal,
    /// Cathode mass at the start of a run.
    pub cathode_mass: Decimal,
    /// Mass carried by one ion.
    pub unit: Decimal,
    /// Spawning is blocked once the anode is at or under this mass.
    pub depletion_threshold: Decimal,
    /// Number of plating reactions that completes the lesson.
    pub plating_goal: u32,
}

impl Default for ReservoirParams {
    fn default() -> Self {
        Self {
            anode_mass: Decimal::new(50, 0),
            cathode_mass: Decimal::new(25, 0),
            unit: Decimal::new(5, 0),
            depletion_threshold: Decimal::new(10, 0),
            plating_goal: 5,
        }
    }
}

impl ReservoirParams {
    /// Check the parameters for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InvalidParams`] if any mass is negative, the
    /// unit is not positive, or the goal is zero.
    pub fn validate(&self) -> Result<(), LedgerError> {
        let invalid = |reason: &str| {
            Err(LedgerError::InvalidParams {
                reason: reason.to_owned(),
            })
        };
        if self.anode_mass.is_sign_negative() {
            return invalid("anode_mass must not be negative");
        }
        if self.cathode_mass.is_sign_negative() {
            return invalid("cathode_mass must not be negative");
        }
        if self.unit <= Decimal::ZERO {
            return invalid("unit must be positive");
        }
        if self.depletion_threshold.is_sign_negative() {
            return invalid("depletion_threshold must not be negative");
        }
        if self.plating_goal == 0 {
            return invalid("plating_goal must be at least 1");
        }
        Ok(())
    }
}

/// The outcome of recording a plating batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlatingReceipt {
    /// Pairs plated in this batch.
    pub pairs: u32,
    /// Cathode mass after the batch.
    pub cathode_mass: Decimal,
    /// Total reactions after the batch.
    pub plated_count: u32,
    /// `true` only for the batch that first reached the goal.
    pub goal_reached: bool,
}

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

/// Anode and cathode reservoirs plus the plating progress counter.
///
/// Created once per simulation and mutated only by spawn and pairing
/// events. [`reset`](ReservoirLedger::reset) restores the initial values.
#[derive(Debug, Clone)]
pub struct ReservoirLedger {
    /// Initial values and movement rules.
    params: ReservoirParams,
    /// Current anode mass.
    anode_mass: Decimal,
    /// Current cathode mass.
    cathode_mass: Decimal,
    /// Completed reactions; never decreases within a run.
    plated_count: u32,
    /// Whether the completion signal has already fired.
    goal_signalled: bool,
    /// All mass movements of the current run, in order.
    journal: Vec<MassEntry>,
}

impl ReservoirLedger {
    /// Create a ledger at its initial values.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InvalidParams`] if the parameters are invalid.
    pub fn new(params: ReservoirParams) -> Result<Self, LedgerError> {
        params.validate()?;
        Ok(Self {
            anode_mass: params.anode_mass,
            cathode_mass: params.cathode_mass,
            params,
            plated_count: 0,
            goal_signalled: false,
            journal: Vec::new(),
        })
    }

    /// Restore the initial masses, zero the counter, and clear the journal.
    pub fn reset(&mut self) {
        self.anode_mass = self.params.anode_mass;
        self.cathode_mass = self.params.cathode_mass;
        self.plated_count = 0;
        self.goal_signalled = false;
        self.journal.clear();
        debug!("reservoir ledger reset");
    }

    /// Return the parameters the ledger was created with.
    pub const fn params(&self) -> &ReservoirParams {
        &self.params
    }

    /// Return the current anode mass.
    pub const fn anode_mass(&self) -> Decimal {
        self.anode_mass
    }

    /// Return the current cathode mass.
    pub const fn cathode_mass(&self) -> Decimal {
        self.cathode_mass
    }

    /// Return the number of completed reactions.
    pub const fn plated_count(&self) -> u32 {
        self.plated_count
    }

    /// Whether the plating goal has been reached.
    pub const fn is_complete(&self) -> bool {
        self.goal_signalled
    }

    /// Whether the anode can no longer release an ion.
    ///
    /// True at or under the depletion threshold, and also whenever less than
    /// one unit remains so the anode can never go negative.
    pub fn is_depleted(&self) -> bool {
        self.anode_mass <= self.params.depletion_threshold || self.anode_mass < self.params.unit
    }

    /// Return the journal of the current run.
    pub fn journal(&self) -> &[MassEntry] {
        &self.journal
    }

    /// Return a read-only snapshot for the presentation layer.
    pub const fn snapshot(&self) -> ReservoirSnapshot {
        ReservoirSnapshot {
            anode_mass: self.anode_mass,
            cathode_mass: self.cathode_mass,
            plated_count: self.plated_count,
            plating_goal: self.params.plating_goal,
            complete: self.goal_signalled,
        }
    }

    /// Move one unit of silver from the anode into solution.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Depleted`] if the anode is depleted, or
    /// [`LedgerError::ArithmeticOverflow`] on overflow. The ledger is
    /// unchanged on error.
    pub fn record_dissolve(&mut self) -> Result<MassEntry, LedgerError> {
        if self.is_depleted() {
            return Err(LedgerError::Depleted {
                anode_mass: self.anode_mass,
            });
        }
        let anode_after = self
            .anode_mass
            .checked_sub(self.params.unit)
            .ok_or(LedgerError::ArithmeticOverflow)?;

        let entry = self.next_entry(
            MassEntryType::Dissolve,
            1,
            self.params.unit,
            anode_after,
            self.cathode_mass,
        )?;
        self.anode_mass = anode_after;
        self.journal.push(entry.clone());
        debug!(anode_mass = %self.anode_mass, seq = entry.seq, "silver dissolved");
        Ok(entry)
    }

    /// Deposit `pairs` units of silver on the cathode.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::EmptyBatch`] for zero pairs, or
    /// [`LedgerError::ArithmeticOverflow`] on overflow. The ledger is
    /// unchanged on error.
    pub fn record_plating(&mut self, pairs: u32) -> Result<PlatingReceipt, LedgerError> {
        if pairs == 0 {
            return Err(LedgerError::EmptyBatch);
        }
        let quantity = self
            .params
            .unit
            .checked_mul(Decimal::from(pairs))
            .ok_or(LedgerError::ArithmeticOverflow)?;
        let cathode_after = self
            .cathode_mass
            .checked_add(quantity)
            .ok_or(LedgerError::ArithmeticOverflow)?;
        let plated_after = self
            .plated_count
            .checked_add(pairs)
            .ok_or(LedgerError::ArithmeticOverflow)?;

        let entry = self.next_entry(
            MassEntryType::Plate,
            pairs,
            quantity,
            self.anode_mass,
            cathode_after,
        )?;
        self.cathode_mass = cathode_after;
        self.plated_count = plated_after;
        self.journal.push(entry);

        let goal_reached = !self.goal_signalled && self.plated_count >= self.params.plating_goal;
        if goal_reached {
            self.goal_signalled = true;
            info!(
                plated_count = self.plated_count,
                goal = self.params.plating_goal,
                "plating goal reached"
            );
        }

        Ok(PlatingReceipt {
            pairs,
            cathode_mass: self.cathode_mass,
            plated_count: self.plated_count,
            goal_reached,
        })
    }

    /// Verify the conservation law given the number of ions in solution.
    pub fn verify_conservation(&self, ions_in_solution: u32) -> ConservationResult {
        verify_conservation(
            &self.params,
            Levels {
                anode: self.anode_mass,
                cathode: self.cathode_mass,
            },
            &self.journal,
            ions_in_solution,
        )
    }

    /// Build the next journal entry without appending it.
    fn next_entry(
        &self,
        entry_type: MassEntryType,
        particles: u32,
        quantity: Decimal,
        anode_after: Decimal,
        cathode_after: Decimal,
    ) -> Result<MassEntry, LedgerError> {
        let len = u64::try_from(self.journal.len()).map_err(|_err| LedgerError::ArithmeticOverflow)?;
        let seq = len.checked_add(1).ok_or(LedgerError::ArithmeticOverflow)?;
        Ok(MassEntry {
            seq,
            entry_type,
            particles,
            quantity,
            anode_after,
            cathode_after,
        })
    }
}

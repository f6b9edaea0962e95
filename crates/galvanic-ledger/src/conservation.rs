//! Conservation law verification for the reservoir ledger.
//!
//! Silver is never created or destroyed: it dissolves from the anode into
//! solution and plates from solution onto the cathode. Three checks follow:
//!
//! ```text
//! initial_anode   - sum(dissolve) == anode
//! initial_cathode + sum(plate)    == cathode
//! sum(dissolve)   - sum(plate)    == unit * ions_in_solution
//! ```
//!
//! The first two replay the journal against the live masses; the third ties
//! the ledger to the particle registry. Every mutation goes through the
//! journal, so the checks pass by construction; they exist to catch
//! corruption and future bugs.

use rust_decimal::Decimal;

use galvanic_types::{MassEntry, MassEntryType};

use crate::LedgerAnomaly;
use crate::ledger::ReservoirParams;

/// The result of a conservation check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConservationResult {
    /// All three checks hold.
    Balanced,
    /// At least one check failed.
    Anomaly(LedgerAnomaly),
}

/// Live reservoir masses to check against the journal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Levels {
    /// Current anode mass.
    pub anode: Decimal,
    /// Current cathode mass.
    pub cathode: Decimal,
}

/// Verify the conservation law for one run.
pub fn verify_conservation(
    params: &ReservoirParams,
    levels: Levels,
    entries: &[MassEntry],
    ions_in_solution: u32,
) -> ConservationResult {
    let journal_len = entries.len();

    let mut dissolved = Decimal::ZERO;
    let mut plated = Decimal::ZERO;
    for entry in entries {
        let total = match entry.entry_type {
            MassEntryType::Dissolve => &mut dissolved,
            MassEntryType::Plate => &mut plated,
        };
        *total = match total.checked_add(entry.quantity) {
            Some(val) => val,
            None => return overflow_anomaly(journal_len),
        };
    }

    let Some(expected_anode) = params.anode_mass.checked_sub(dissolved) else {
        return overflow_anomaly(journal_len);
    };
    if expected_anode != levels.anode {
        return anomaly(
            journal_len,
            expected_anode,
            levels.anode,
            "anode mass does not match the journal",
        );
    }

    let Some(expected_cathode) = params.cathode_mass.checked_add(plated) else {
        return overflow_anomaly(journal_len);
    };
    if expected_cathode != levels.cathode {
        return anomaly(
            journal_len,
            expected_cathode,
            levels.cathode,
            "cathode mass does not match the journal",
        );
    }

    let Some(in_solution) = dissolved.checked_sub(plated) else {
        return overflow_anomaly(journal_len);
    };
    let Some(carried) = params.unit.checked_mul(Decimal::from(ions_in_solution)) else {
        return overflow_anomaly(journal_len);
    };
    if in_solution != carried {
        return anomaly(
            journal_len,
            in_solution,
            carried,
            "mass in solution does not match the live ion count",
        );
    }

    if levels.anode.is_sign_negative() {
        return anomaly(journal_len, Decimal::ZERO, levels.anode, "anode mass is negative");
    }

    ConservationResult::Balanced
}

/// Construct an anomaly result for a failed check.
fn anomaly(journal_len: usize, expected: Decimal, actual: Decimal, what: &str) -> ConservationResult {
    ConservationResult::Anomaly(LedgerAnomaly {
        journal_len,
        expected,
        actual,
        message: format!(
            "LEDGER_ANOMALY after {journal_len} entries: {what} (expected {expected}, got {actual})"
        ),
    })
}

/// Construct an anomaly result for arithmetic overflow during summation.
fn overflow_anomaly(journal_len: usize) -> ConservationResult {
    ConservationResult::Anomaly(LedgerAnomaly {
        journal_len,
        expected: Decimal::ZERO,
        actual: Decimal::ZERO,
        message: format!(
            "LEDGER_ANOMALY after {journal_len} entries: arithmetic overflow while summing the journal"
        ),
    })
}

//! Reservoir mass ledger for the Galvanic plating simulation.
//!
//! Silver lives in exactly three places: the anode, the solution (as ions),
//! and the cathode. Every movement between them is journaled here, and the
//! masses are only ever changed through the journal.
//!
//! # Architecture
//!
//! - [`ledger`] -- The [`ReservoirLedger`]: anode/cathode masses, plating
//!   progress, the one-shot goal signal, and the append-only journal.
//! - [`conservation`] -- Conservation law verification.
//!
//! # Conservation Law
//!
//! At every point between events:
//!
//! ```text
//! anode + cathode + unit * ions_in_solution == initial_anode + initial_cathode
//! ```
//!
//! A violation produces a [`LedgerAnomaly`]. The ledger never panics; it
//! returns errors.
//!
//! # Usage
//!
//! ```
//! use galvanic_ledger::{ReservoirLedger, ReservoirParams};
//! use galvanic_ledger::conservation::ConservationResult;
//!
//! let mut ledger = ReservoirLedger::new(ReservoirParams::default()).ok();
//! if let Some(ledger) = ledger.as_mut() {
//!     // One ion dissolves, then plates.
//!     ledger.record_dissolve().ok();
//!     assert_eq!(ledger.verify_conservation(1), ConservationResult::Balanced);
//!     ledger.record_plating(1).ok();
//!     assert_eq!(ledger.verify_conservation(0), ConservationResult::Balanced);
//! }
//! ```

pub mod conservation;
pub mod ledger;

// Re-export primary types at crate root.
pub use conservation::ConservationResult;
pub use ledger::{PlatingReceipt, ReservoirLedger, ReservoirParams};

use rust_decimal::Decimal;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can occur when constructing or updating the ledger.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// The reservoir parameters are inconsistent.
    #[error("invalid reservoir parameters: {reason}")]
    InvalidParams {
        /// Explanation of what is wrong.
        reason: String,
    },

    /// A dissolve was recorded while the anode is depleted.
    #[error("anode depleted: {anode_mass} remaining")]
    Depleted {
        /// Remaining anode mass.
        anode_mass: Decimal,
    },

    /// A plating batch of zero pairs was recorded.
    #[error("plating batch must contain at least one pair")]
    EmptyBatch,

    /// Arithmetic overflow during a checked operation.
    #[error("arithmetic overflow in ledger calculation")]
    ArithmeticOverflow,
}

// ---------------------------------------------------------------------------
// Anomaly type
// ---------------------------------------------------------------------------

/// A conservation law violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerAnomaly {
    /// Journal length when the anomaly was detected.
    pub journal_len: usize,
    /// The quantity the law expects.
    pub expected: Decimal,
    /// The quantity actually observed.
    pub actual: Decimal,
    /// Human-readable description of the anomaly.
    pub message: String,
}

impl core::fmt::Display for LedgerAnomaly {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.message)
    }
}

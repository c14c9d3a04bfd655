//! Proportional Distribution Engine
//!
//! Splits a distributable amount of party currency among participants in
//! proportion to their contribution weights, tracking the unrounded
//! residual as an explicit remainder pool instead of discarding it or
//! smearing it across shares.
//!
//! ```text
//! engine/
//! ├── mod.rs        - Shared types and thresholds
//! ├── distribute.rs - Distributable computation, conversion, exact shares
//! ├── display.rs    - Whole-major / residue-minor display policy
//! └── weights.rs    - Weight totals, advisory check, equal-split plan
//! ```
//!
//! Every function here is pure and synchronous. Callers pass an immutable
//! snapshot of inputs per call; nothing in this module reads or writes
//! shared state, performs I/O, or returns an error. Degenerate inputs
//! (zero weight sum, negative distributable) produce reportable results,
//! not failures.

pub mod display;
pub mod distribute;
pub mod weights;

pub use display::{format_share, DisplayBreakdown};
pub use distribute::{compute_distributable, convert, distribute, evaluate};
pub use weights::{equal_split, total_weight, weight_advisory};

use serde::{Deserialize, Serialize};

/// Contribution weights are percentages and should sum to this.
pub const WEIGHT_TARGET: f64 = 100.0;

/// Deviation of the weight sum from [`WEIGHT_TARGET`] above which callers
/// surface an advisory warning.
pub const WEIGHT_TOLERANCE: f64 = 0.01;

/// Absolute amount below which the remainder pool is suppressed from
/// display. The pool itself is always kept, however small.
pub const DISPLAY_THRESHOLD: f64 = 0.01;

/// One party member with a contribution percentage.
///
/// Ordering is insertion order and names need not be unique.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    pub name: String,
    pub weight: f64,
}

impl Participant {
    pub fn new(name: impl Into<String>, weight: f64) -> Self {
        Self {
            name: name.into(),
            weight,
        }
    }

    /// Coerce raw user input into the form the engine assumes: a blank
    /// name becomes a positional placeholder and a non-finite or negative
    /// weight becomes zero.
    pub fn sanitized(name: &str, weight: f64, position: usize) -> Self {
        let name = name.trim();
        let name = if name.is_empty() {
            format!("Player {}", position + 1)
        } else {
            name.to_string()
        };
        let weight = if weight.is_finite() && weight > 0.0 {
            weight
        } else {
            0.0
        };
        Self { name, weight }
    }
}

/// Immutable snapshot of everything one distribution needs.
#[derive(Debug, Clone, PartialEq)]
pub struct DistributionRequest {
    /// Gross proceeds in major units.
    pub total_major: f64,
    /// Agreed deduction (map costs in the original game flow), major units.
    pub deduction_major: f64,
    /// When true the deduction was already paid back out of band and is
    /// not subtracted from the total.
    pub deduction_reimbursed: bool,
    pub participants: Vec<Participant>,
    /// Exchange rate fixed at calculation time: 1 major = `rate` minor.
    pub rate: f64,
}

/// One participant's exact share. Both amounts are unrounded; rounding
/// happens only at display time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticipantShare {
    pub name: String,
    pub weight: f64,
    pub amount_major: f64,
    pub amount_minor: f64,
}

/// The signed residual left after all exact shares are computed.
///
/// Near zero whenever weights sum to the target; any nonzero value comes
/// from floating-point drift or an off-target weight sum, never from
/// rounding inside the engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RemainderPool {
    pub amount_major: f64,
    pub amount_minor: f64,
}

impl RemainderPool {
    /// Whether either component is large enough to show to a user.
    pub fn is_displayable(&self) -> bool {
        self.amount_major.abs() >= DISPLAY_THRESHOLD
            || self.amount_minor.abs() >= DISPLAY_THRESHOLD
    }
}

/// Result of one distribution: exact shares plus the remainder pool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Distribution {
    pub distributable_major: f64,
    pub distributable_minor: f64,
    pub shares: Vec<ParticipantShare>,
    pub remainder: RemainderPool,
}

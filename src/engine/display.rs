//! Display policy for a single share.
//!
//! Players want to receive whole major orbs where possible, with the rest
//! expressed in minor orbs. The rounding here is strictly presentational:
//! it never feeds back into the distribution arithmetic, so no rounding
//! error compounds across participants.

use serde::{Deserialize, Serialize};

/// How one amount should be presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DisplayBreakdown {
    /// At least one whole major unit: `whole_major` plus the residue
    /// converted to minor units. `fractional_minor` may be zero, in which
    /// case renderers show the major part alone.
    MajorWithResidue {
        whole_major: u64,
        fractional_minor: u64,
    },
    /// Under one whole major unit: the amount rounded in minor units.
    /// Signed, since over-deducted rounds can produce negative shares.
    MinorOnly { amount_minor: i64 },
}

/// Apply the display policy to one exact share.
///
/// `amount_major` and `amount_minor` are the unrounded pair produced by
/// the distribution pass; `rate` is the same rate that produced them.
pub fn format_share(amount_major: f64, amount_minor: f64, rate: f64) -> DisplayBreakdown {
    if amount_major >= 1.0 {
        let whole_major = amount_major.floor();
        let fractional_minor = ((amount_major - whole_major) * rate).round();
        DisplayBreakdown::MajorWithResidue {
            whole_major: whole_major as u64,
            fractional_minor: fractional_minor as u64,
        }
    } else {
        DisplayBreakdown::MinorOnly {
            amount_minor: amount_minor.round() as i64,
        }
    }
}

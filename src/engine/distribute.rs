//! Exact proportional distribution with remainder accounting.
//!
//! Shares are kept at full floating-point precision. The remainder pool
//! is defined by subtraction, so the conservation identity
//! `distributable == sum(shares) + remainder` holds in both units for
//! any weight list, including ones that do not sum to 100.

use super::{Distribution, DistributionRequest, Participant, ParticipantShare, RemainderPool};

/// Amount actually available to split after the agreed deduction.
///
/// Never clamped: when the deduction exceeds the total the negative
/// result flows through so the caller can surface it as a warning.
pub fn compute_distributable(
    total_major: f64,
    deduction_major: f64,
    already_reimbursed: bool,
) -> f64 {
    if already_reimbursed {
        total_major
    } else {
        total_major - deduction_major
    }
}

/// Convert a major-unit amount into minor units at the given rate.
pub fn convert(amount_major: f64, rate: f64) -> f64 {
    amount_major * rate
}

/// Split `distributable` across `participants` in proportion to their
/// weights, at the fixed exchange `rate`.
///
/// With a non-positive weight sum every share is zero and the remainder
/// holds the full distributable. No rounding is applied anywhere in this
/// function.
pub fn distribute(distributable: f64, participants: &[Participant], rate: f64) -> Distribution {
    let total_weight: f64 = participants.iter().map(|p| p.weight).sum();
    let distributable_minor = convert(distributable, rate);

    let mut shares = Vec::with_capacity(participants.len());
    let mut distributed_major = 0.0;
    let mut distributed_minor = 0.0;

    for participant in participants {
        let (amount_major, amount_minor) = if total_weight > 0.0 {
            let major = distributable * participant.weight / total_weight;
            (major, convert(major, rate))
        } else {
            (0.0, 0.0)
        };

        distributed_major += amount_major;
        distributed_minor += amount_minor;

        shares.push(ParticipantShare {
            name: participant.name.clone(),
            weight: participant.weight,
            amount_major,
            amount_minor,
        });
    }

    // Subtraction, not rounding: whatever the shares did not absorb
    // stays in the pool, even when it is vanishingly small.
    let remainder = RemainderPool {
        amount_major: distributable - distributed_major,
        amount_minor: distributable_minor - distributed_minor,
    };

    Distribution {
        distributable_major: distributable,
        distributable_minor,
        shares,
        remainder,
    }
}

/// Run a full request: deduction handling followed by distribution.
pub fn evaluate(request: &DistributionRequest) -> Distribution {
    let distributable = compute_distributable(
        request.total_major,
        request.deduction_major,
        request.deduction_reimbursed,
    );
    distribute(distributable, &request.participants, request.rate)
}

//! Weight totals, the off-target advisory, and the equal-split plan.

use super::{Participant, WEIGHT_TARGET, WEIGHT_TOLERANCE};

/// Sum of all contribution weights, in insertion order.
pub fn total_weight(participants: &[Participant]) -> f64 {
    participants.iter().map(|p| p.weight).sum()
}

/// Advisory check on the weight sum. Returns the deviation when the sum
/// is off target beyond tolerance; distribution still proceeds on the
/// actual weights either way.
pub fn weight_advisory(total: f64) -> Option<f64> {
    let deviation = total - WEIGHT_TARGET;
    if deviation.abs() > WEIGHT_TOLERANCE {
        Some(deviation)
    } else {
        None
    }
}

/// Equal-split weight plan for `count` participants.
///
/// The first `count - 1` entries get the even share rounded to six
/// decimals; the last entry absorbs the exact residue so the plan sums
/// to exactly 100 with no drift.
pub fn equal_split(count: usize) -> Vec<f64> {
    if count == 0 {
        return Vec::new();
    }

    let even = round6(WEIGHT_TARGET / count as f64);
    let mut weights = vec![even; count - 1];
    let assigned: f64 = weights.iter().sum();
    weights.push(WEIGHT_TARGET - assigned);
    weights
}

fn round6(value: f64) -> f64 {
    (value * 1e6).round() / 1e6
}

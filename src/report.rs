//! Plain-text settlement report.
//!
//! Renders one distribution the way players paste it into party chat:
//! totals in both units, one line per player using the whole-major /
//! residue-minor display policy, the remainder pool when it is worth
//! showing, and the rates the numbers were computed at.

use crate::engine::{format_share, DisplayBreakdown, Distribution};
use crate::rates::RateBookSnapshot;

/// Display names for the two denominations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitNames {
    pub major: String,
    pub minor: String,
}

impl Default for UnitNames {
    fn default() -> Self {
        Self {
            major: "Divine".to_string(),
            minor: "Exalted".to_string(),
        }
    }
}

/// Everything one report needs, captured by reference so callers keep
/// ownership of their snapshots.
#[derive(Debug)]
pub struct ReportInputs<'a> {
    pub group_name: &'a str,
    pub round_name: &'a str,
    pub distribution: &'a Distribution,
    pub rate: f64,
    pub rates: &'a RateBookSnapshot,
    pub units: &'a UnitNames,
}

pub fn render(inputs: &ReportInputs<'_>) -> String {
    let units = inputs.units;
    let dist = inputs.distribution;
    let total_weight: f64 = dist.shares.iter().map(|s| s.weight).sum();

    let mut out = String::new();
    out.push_str(&format!(
        "{} Currency Split ({})\n",
        inputs.group_name, inputs.round_name
    ));
    out.push_str("================================\n");
    out.push_str(&format!(
        "Total: {} {} Orbs\n",
        format_amount(dist.distributable_major, 2),
        units.major
    ));
    out.push_str(&format!(
        "Total Value: {} {} Orbs\n",
        format_amount(dist.distributable_minor, 2),
        units.minor
    ));
    out.push_str(&format!(
        "Total Contribution: {}%\n\n",
        format_weight(total_weight)
    ));
    out.push_str("Shares:\n");
    out.push_str("----------------\n");

    for share in &dist.shares {
        let breakdown = format_share(share.amount_major, share.amount_minor, inputs.rate);
        out.push_str(&format!(
            "{}: {} ({}%)\n",
            share.name,
            render_breakdown(breakdown, units),
            format_weight(share.weight)
        ));
        out.push_str(&format!(
            "  Total: {} {} | {} {}\n\n",
            format_amount(share.amount_major, 2),
            units.major,
            format_amount(share.amount_minor.round(), 0),
            units.minor
        ));
    }

    if dist.remainder.is_displayable() {
        out.push_str("Central pool (undistributed remainder):\n");
        out.push_str(&format!(
            "  {}\n\n",
            render_remainder(dist.remainder.amount_major, dist.remainder.amount_minor, units)
        ));
    }

    let updated = inputs
        .rates
        .last_updated
        .map(|t| t.format("%Y-%m-%d %H:%M UTC").to_string())
        .unwrap_or_else(|| "never".to_string());
    out.push_str(&format!("Exchange Rates (updated {}):\n", updated));
    out.push_str(&format!(
        "1 {} = {} {}\n",
        units.major,
        format_amount(inputs.rate, 2),
        units.minor
    ));
    out.push_str(&format!("League: {}\n", inputs.rates.league));

    out
}

fn render_breakdown(breakdown: DisplayBreakdown, units: &UnitNames) -> String {
    match breakdown {
        DisplayBreakdown::MajorWithResidue {
            whole_major,
            fractional_minor: 0,
        } => format!("{} {}", group_digits(&whole_major.to_string()), units.major),
        DisplayBreakdown::MajorWithResidue {
            whole_major,
            fractional_minor,
        } => format!(
            "{} {} + {} {}",
            group_digits(&whole_major.to_string()),
            units.major,
            group_digits(&fractional_minor.to_string()),
            units.minor
        ),
        DisplayBreakdown::MinorOnly { amount_minor } => {
            format!("{} {}", format_amount(amount_minor as f64, 0), units.minor)
        }
    }
}

fn render_remainder(amount_major: f64, amount_minor: f64, units: &UnitNames) -> String {
    let major_visible = amount_major.abs() >= crate::engine::DISPLAY_THRESHOLD;
    let minor_visible = amount_minor.abs() >= crate::engine::DISPLAY_THRESHOLD;

    match (major_visible, minor_visible) {
        (true, true) => format!(
            "{} {} + {} {}",
            format_amount(amount_major, 3),
            units.major,
            format_amount(amount_minor, 2),
            units.minor
        ),
        (true, false) => format!("{} {}", format_amount(amount_major, 3), units.major),
        _ => format!("{} {}", format_amount(amount_minor, 2), units.minor),
    }
}

/// Fixed-decimal formatting with thousands separators in the integer
/// part, e.g. `12,345.68`.
pub fn format_amount(value: f64, decimals: usize) -> String {
    let fixed = format!("{:.*}", decimals, value);
    let (sign, digits) = match fixed.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", fixed.as_str()),
    };
    let (int_part, frac_part) = match digits.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (digits, None),
    };

    let grouped = group_digits(int_part);
    match frac_part {
        Some(frac) => format!("{}{}.{}", sign, grouped, frac),
        None => format!("{}{}", sign, grouped),
    }
}

/// Weights print as entered: whole numbers bare, fractions trimmed.
fn format_weight(weight: f64) -> String {
    if (weight - weight.round()).abs() < 1e-9 {
        format!("{}", weight.round() as i64)
    } else {
        let fixed = format!("{:.6}", weight);
        fixed.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

fn group_digits(digits: &str) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    grouped
}

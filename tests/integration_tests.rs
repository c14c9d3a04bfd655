//! Integration tests for the loot split service.
//!
//! These tests verify end-to-end behavior of the distribution engine,
//! the rate book override flows, the session/round lifecycle with file
//! persistence, and the settlement report.

use orbsplit::{
    compute_distributable, convert, distribute, equal_split, evaluate, format_share,
    total_weight, weight_advisory, CalculatorInputs, ConfirmationStatus, DisplayBreakdown,
    DistributionRequest, FeedQuote, FeedRates, Participant, RateBook, RateSource, SessionData,
    SessionStore, UnitKind, UnitNames,
};
use tempfile::TempDir;

// ============================================================================
// Test Helpers
// ============================================================================

const EPS: f64 = 1e-9;

fn party(weights: &[(&str, f64)]) -> Vec<Participant> {
    weights
        .iter()
        .map(|(name, weight)| Participant::new(*name, *weight))
        .collect()
}

fn feed_rates(major: Option<f64>, minor: Option<f64>) -> FeedRates {
    FeedRates {
        major: major.map(|price| FeedQuote {
            price,
            icon_url: None,
        }),
        minor: minor.map(|price| FeedQuote {
            price,
            icon_url: None,
        }),
        fetched_via: "https://poe2scout.com/api/items/".to_string(),
    }
}

// ============================================================================
// Distribution Engine Properties
// ============================================================================

mod engine_properties {
    use super::*;

    #[test]
    fn test_on_target_weights_distribute_everything() {
        let weight_lists: &[&[(&str, f64)]] = &[
            &[("A", 50.0), ("B", 30.0), ("C", 20.0)],
            &[("A", 100.0)],
            &[("A", 25.0), ("B", 25.0), ("C", 25.0), ("D", 25.0)],
            &[("A", 33.333333), ("B", 33.333333), ("C", 33.333334)],
        ];

        for weights in weight_lists {
            let participants = party(weights);
            let result = distribute(1234.56, &participants, 205.84);

            let distributed: f64 = result.shares.iter().map(|s| s.amount_major).sum();
            assert!((distributed - 1234.56).abs() < 1e-6, "weights {:?}", weights);
            assert!(result.remainder.amount_major.abs() < 1e-6);
        }
    }

    #[test]
    fn test_conservation_for_arbitrary_weights() {
        let weight_lists: &[&[(&str, f64)]] = &[
            &[("A", 10.0), ("B", 20.0)],
            &[("A", 70.0), ("B", 70.0)],
            &[("A", 0.1), ("B", 0.2), ("C", 0.3)],
        ];

        for weights in weight_lists {
            let participants = party(weights);
            let result = distribute(987.654, &participants, 42.0);

            let distributed: f64 = result.shares.iter().map(|s| s.amount_major).sum();
            assert!(
                (distributed + result.remainder.amount_major - 987.654).abs() < EPS,
                "weights {:?}",
                weights
            );
        }
    }

    #[test]
    fn test_linearity_in_the_total() {
        let participants = party(&[("A", 45.0), ("B", 55.0)]);
        let k = 7.5;

        let base = distribute(100.0, &participants, 205.84);
        let scaled = distribute(100.0 * k, &participants, 205.84);

        for (b, s) in base.shares.iter().zip(scaled.shares.iter()) {
            assert!((s.amount_major - k * b.amount_major).abs() < 1e-6);
        }
        assert!((scaled.remainder.amount_major - k * base.remainder.amount_major).abs() < 1e-6);
    }

    #[test]
    fn test_reference_scenario() {
        // 1000 major across 50/30/20 at rate 10.
        let result = distribute(1000.0, &party(&[("A", 50.0), ("B", 30.0), ("C", 20.0)]), 10.0);

        let expected = [(500.0, 5000.0), (300.0, 3000.0), (200.0, 2000.0)];
        for (share, (major, minor)) in result.shares.iter().zip(expected) {
            assert!((share.amount_major - major).abs() < EPS);
            assert!((share.amount_minor - minor).abs() < EPS);
        }
        assert!(result.remainder.amount_major.abs() < EPS);
        assert!(result.remainder.amount_minor.abs() < EPS);
    }

    #[test]
    fn test_deduction_scenario() {
        let request = DistributionRequest {
            total_major: 100.0,
            deduction_major: 10.0,
            deduction_reimbursed: false,
            participants: party(&[("A", 100.0)]),
            rate: 205.84,
        };
        let result = evaluate(&request);

        assert_eq!(result.distributable_major, 90.0);
        assert!((result.shares[0].amount_major - 90.0).abs() < EPS);
        assert!(result.remainder.amount_major.abs() < EPS);
    }

    #[test]
    fn test_reimbursed_deduction_is_not_subtracted() {
        assert_eq!(compute_distributable(100.0, 10.0, true), 100.0);
    }

    #[test]
    fn test_empty_party_degenerate() {
        let result = distribute(55.5, &[], 205.84);

        assert!(result.shares.is_empty());
        assert_eq!(result.remainder.amount_major, 55.5);
        assert_eq!(result.remainder.amount_minor, convert(55.5, 205.84));
    }

    #[test]
    fn test_display_breakdown_round_trip() {
        let breakdown = format_share(2.5, convert(2.5, 200.0), 200.0);
        assert_eq!(
            breakdown,
            DisplayBreakdown::MajorWithResidue {
                whole_major: 2,
                fractional_minor: 100,
            }
        );
    }

    #[test]
    fn test_weight_advisory_thresholds() {
        assert!(weight_advisory(100.0).is_none());
        assert!(weight_advisory(99.995).is_none());
        assert!(weight_advisory(99.9).is_some());
        assert!(weight_advisory(0.0).is_some());
    }

    #[test]
    fn test_equal_split_plans_are_exact() {
        for count in 2..=6 {
            let weights = equal_split(count);
            let participants: Vec<Participant> = weights
                .iter()
                .enumerate()
                .map(|(i, w)| Participant::new(format!("P{i}"), *w))
                .collect();

            assert_eq!(total_weight(&participants), 100.0);
            assert!(weight_advisory(total_weight(&participants)).is_none());
        }
    }
}

// ============================================================================
// Rate Book Flows
// ============================================================================

mod rate_flows {
    use super::*;

    #[test]
    fn test_feed_then_manual_then_forced_refresh() {
        let mut book = RateBook::new("Rise of the Abyssal");

        // Feed lands first.
        book.apply(&feed_rates(Some(205.84), Some(1.0)));
        assert_eq!(book.entry(UnitKind::Major).source, RateSource::Feed);
        assert_eq!(book.effective_rate(), 205.84);

        // The user types a manual value; a background apply must not
        // clobber it.
        book.set_manual(UnitKind::Major, 210.0).unwrap();
        book.apply(&feed_rates(Some(199.0), Some(1.0)));
        assert_eq!(book.effective_rate(), 210.0);

        // An explicit refresh wins over the manual value.
        book.force_apply(&feed_rates(Some(199.0), Some(1.0)));
        assert_eq!(book.effective_rate(), 199.0);
        assert_eq!(book.entry(UnitKind::Major).source, RateSource::Feed);
    }

    #[test]
    fn test_total_feed_failure_degrades_to_fallback() {
        let mut book = RateBook::new("Rise of the Abyssal");
        book.force_apply(&feed_rates(Some(199.0), Some(1.0)));

        book.apply_fallback();

        assert_eq!(book.entry(UnitKind::Major).source, RateSource::Fallback);
        assert_eq!(book.effective_rate(), 205.84);
    }

    #[test]
    fn test_engine_never_sees_a_degenerate_rate() {
        let book = RateBook::new("Rise of the Abyssal");
        let rate = book.effective_rate();
        assert!(rate.is_finite() && rate > 0.0);
    }
}

// ============================================================================
// Session Lifecycle and Persistence
// ============================================================================

mod session_flow {
    use super::*;

    #[test]
    fn test_full_round_lifecycle_survives_restart() {
        let dir = TempDir::new().unwrap();
        let store = SessionStore::new(dir.path().join("session.json"));

        let mut session = SessionData::new("Abyssal Farmers");
        let round_id = session
            .create_round(
                Some("Breach rotation".to_string()),
                vec!["Ash".to_string(), "Brynn".to_string(), "Cole".to_string()],
            )
            .unwrap();
        session
            .round_mut(round_id)
            .unwrap()
            .toggle_confirmation("Brynn")
            .unwrap();
        session
            .save_inputs(CalculatorInputs {
                total_major: 12.0,
                deduction_major: 1.0,
                deduction_reimbursed: false,
                participants: party(&[("Ash", 40.0), ("Brynn", 35.0), ("Cole", 25.0)]),
            })
            .unwrap();
        store.save(&session).unwrap();

        // Simulated restart: reload from disk and keep working.
        let mut reloaded = store.load().unwrap().unwrap();
        assert_eq!(reloaded, session);

        let round = reloaded.current_round().unwrap();
        assert_eq!(round.round_name, "Breach rotation");
        assert_eq!(
            round.confirmations["Brynn"],
            ConfirmationStatus::Confirmed
        );

        reloaded.switch_round(1).unwrap();
        assert_eq!(reloaded.current_round().unwrap().round_id, 1);
    }

    #[test]
    fn test_saved_inputs_feed_the_engine() {
        let mut session = SessionData::new("Party");
        session
            .save_inputs(CalculatorInputs {
                total_major: 10.0,
                deduction_major: 0.0,
                deduction_reimbursed: false,
                participants: party(&[("A", 50.0), ("B", 50.0)]),
            })
            .unwrap();

        let request = DistributionRequest {
            total_major: session.inputs.total_major,
            deduction_major: session.inputs.deduction_major,
            deduction_reimbursed: session.inputs.deduction_reimbursed,
            participants: session.inputs.participants.clone(),
            rate: 205.84,
        };
        let result = evaluate(&request);

        assert!((result.shares[0].amount_major - 5.0).abs() < EPS);
        assert!((result.shares[1].amount_major - 5.0).abs() < EPS);
    }
}

// ============================================================================
// Settlement Report
// ============================================================================

mod report_rendering {
    use super::*;
    use orbsplit::report::{render, ReportInputs};

    #[test]
    fn test_report_end_to_end() {
        let book = RateBook::new("Rise of the Abyssal");
        let rate = book.effective_rate();

        let request = DistributionRequest {
            total_major: 10.0,
            deduction_major: 1.0,
            deduction_reimbursed: false,
            participants: party(&[("Ash", 50.0), ("Brynn", 50.0)]),
            rate,
        };
        let distribution = evaluate(&request);

        let units = UnitNames::default();
        let report = render(&ReportInputs {
            group_name: "Abyssal Farmers",
            round_name: "Breach rotation",
            distribution: &distribution,
            rate,
            rates: &book.snapshot(),
            units: &units,
        });

        assert!(report.contains("Abyssal Farmers Currency Split (Breach rotation)"));
        assert!(report.contains("Total: 9.00 Divine Orbs"));
        assert!(report.contains("Total Contribution: 100%"));
        // 4.5 major each: 4 whole plus round(0.5 * 205.84) = 103 minor.
        assert!(report.contains("Ash: 4 Divine + 103 Exalted (50%)"));
        assert!(report.contains("1 Divine = 205.84 Exalted"));
        assert!(report.contains("League: Rise of the Abyssal"));
    }
}

//! Current rate state.
//!
//! The book holds one entry per unit plus freshness metadata. Override
//! semantics follow the calculator this service grew out of: a manual
//! entry survives background feed refreshes, an explicit user-requested
//! refresh overwrites everything, and total feed failure drops non-manual
//! entries back to the fallback constants.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::feed::FeedRates;
use super::{RateSource, UnitKind, FALLBACK_MAJOR_RATE, FALLBACK_MINOR_RATE};

/// One unit's current value and provenance. Values are prices in
/// reference-currency units, so the minor entry is normally 1.0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateEntry {
    pub value: f64,
    pub source: RateSource,
    pub icon_url: Option<String>,
}

impl RateEntry {
    fn fallback(value: f64) -> Self {
        Self {
            value,
            source: RateSource::Fallback,
            icon_url: None,
        }
    }

    fn is_manual(&self) -> bool {
        self.source == RateSource::Manual
    }
}

#[derive(Debug, Clone)]
pub struct RateBook {
    major: RateEntry,
    minor: RateEntry,
    league: String,
    last_updated: Option<DateTime<Utc>>,
    last_feed_via: Option<String>,
}

/// Serializable view of the book for API responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateBookSnapshot {
    pub major: RateEntry,
    pub minor: RateEntry,
    pub effective_rate: f64,
    pub league: String,
    pub last_updated: Option<DateTime<Utc>>,
    pub last_feed_via: Option<String>,
}

impl RateBook {
    pub fn new(league: impl Into<String>) -> Self {
        Self {
            major: RateEntry::fallback(FALLBACK_MAJOR_RATE),
            minor: RateEntry::fallback(FALLBACK_MINOR_RATE),
            league: league.into(),
            last_updated: None,
            last_feed_via: None,
        }
    }

    pub fn entry(&self, unit: UnitKind) -> &RateEntry {
        match unit {
            UnitKind::Major => &self.major,
            UnitKind::Minor => &self.minor,
        }
    }

    /// The single number the engine consumes: minor units per one major
    /// unit. Guarded so a degenerate book can never hand the engine a
    /// non-finite or non-positive rate.
    pub fn effective_rate(&self) -> f64 {
        let rate = self.major.value / self.minor.value;
        if rate.is_finite() && rate > 0.0 {
            rate
        } else {
            FALLBACK_MAJOR_RATE / FALLBACK_MINOR_RATE
        }
    }

    /// Merge feed quotes, leaving manual entries untouched.
    pub fn apply(&mut self, rates: &FeedRates) {
        let mut touched = false;

        if let Some(quote) = &rates.major {
            if self.major.is_manual() {
                debug!("Major rate manually overridden, skipping feed value");
            } else {
                self.major = RateEntry {
                    value: quote.price,
                    source: RateSource::Feed,
                    icon_url: quote.icon_url.clone(),
                };
                touched = true;
            }
        }

        if let Some(quote) = &rates.minor {
            if self.minor.is_manual() {
                debug!("Minor rate manually overridden, skipping feed value");
            } else {
                self.minor = RateEntry {
                    value: quote.price,
                    source: RateSource::Feed,
                    icon_url: quote.icon_url.clone(),
                };
                touched = true;
            }
        }

        if touched {
            self.mark_feed_update(&rates.fetched_via);
        }
    }

    /// Merge feed quotes, clearing any manual overrides. Used when the
    /// user explicitly asks for fresh prices.
    pub fn force_apply(&mut self, rates: &FeedRates) {
        if let Some(quote) = &rates.major {
            self.major = RateEntry {
                value: quote.price,
                source: RateSource::Feed,
                icon_url: quote.icon_url.clone(),
            };
        }
        if let Some(quote) = &rates.minor {
            self.minor = RateEntry {
                value: quote.price,
                source: RateSource::Feed,
                icon_url: quote.icon_url.clone(),
            };
        }
        if !rates.is_empty() {
            self.mark_feed_update(&rates.fetched_via);
        }
    }

    /// Drop non-manual entries to the fallback constants after the whole
    /// feed chain failed.
    pub fn apply_fallback(&mut self) {
        if !self.major.is_manual() {
            self.major = RateEntry::fallback(FALLBACK_MAJOR_RATE);
        }
        if !self.minor.is_manual() {
            self.minor = RateEntry::fallback(FALLBACK_MINOR_RATE);
        }
        self.last_updated = Some(Utc::now());
        self.last_feed_via = None;
        info!("Applied fallback exchange rates");
    }

    /// Record a hand-entered value for one unit.
    pub fn set_manual(&mut self, unit: UnitKind, value: f64) -> Result<()> {
        if !value.is_finite() || value <= 0.0 {
            return Err(anyhow::anyhow!(
                "Manual rate must be a positive finite number, got {}",
                value
            ));
        }

        let entry = match unit {
            UnitKind::Major => &mut self.major,
            UnitKind::Minor => &mut self.minor,
        };
        entry.value = value;
        entry.source = RateSource::Manual;
        self.last_updated = Some(Utc::now());

        info!(?unit, value, "Manual rate override set");
        Ok(())
    }

    pub fn league(&self) -> &str {
        &self.league
    }

    pub fn snapshot(&self) -> RateBookSnapshot {
        RateBookSnapshot {
            major: self.major.clone(),
            minor: self.minor.clone(),
            effective_rate: self.effective_rate(),
            league: self.league.clone(),
            last_updated: self.last_updated,
            last_feed_via: self.last_feed_via.clone(),
        }
    }

    fn mark_feed_update(&mut self, via: &str) {
        self.last_updated = Some(Utc::now());
        self.last_feed_via = Some(via.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rates::feed::FeedQuote;

    fn feed(major: Option<f64>, minor: Option<f64>) -> FeedRates {
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

    #[test]
    fn test_new_book_starts_on_fallback() {
        let book = RateBook::new("Standard");

        assert_eq!(book.entry(UnitKind::Major).source, RateSource::Fallback);
        assert_eq!(book.entry(UnitKind::Major).value, FALLBACK_MAJOR_RATE);
        assert_eq!(book.effective_rate(), FALLBACK_MAJOR_RATE);
    }

    #[test]
    fn test_apply_updates_feed_entries() {
        let mut book = RateBook::new("Standard");
        book.apply(&feed(Some(190.0), Some(1.0)));

        assert_eq!(book.entry(UnitKind::Major).value, 190.0);
        assert_eq!(book.entry(UnitKind::Major).source, RateSource::Feed);
        assert!(book.snapshot().last_updated.is_some());
        assert!(book.snapshot().last_feed_via.is_some());
    }

    #[test]
    fn test_manual_override_survives_apply() {
        let mut book = RateBook::new("Standard");
        book.set_manual(UnitKind::Major, 250.0).unwrap();
        book.apply(&feed(Some(190.0), Some(1.0)));

        assert_eq!(book.entry(UnitKind::Major).value, 250.0);
        assert_eq!(book.entry(UnitKind::Major).source, RateSource::Manual);
        // The minor side had no override and still takes the feed value.
        assert_eq!(book.entry(UnitKind::Minor).source, RateSource::Feed);
    }

    #[test]
    fn test_force_apply_clears_manual_override() {
        let mut book = RateBook::new("Standard");
        book.set_manual(UnitKind::Major, 250.0).unwrap();
        book.force_apply(&feed(Some(190.0), None));

        assert_eq!(book.entry(UnitKind::Major).value, 190.0);
        assert_eq!(book.entry(UnitKind::Major).source, RateSource::Feed);
    }

    #[test]
    fn test_fallback_spares_manual_entries() {
        let mut book = RateBook::new("Standard");
        book.set_manual(UnitKind::Major, 250.0).unwrap();
        book.apply_fallback();

        assert_eq!(book.entry(UnitKind::Major).value, 250.0);
        assert_eq!(book.entry(UnitKind::Minor).source, RateSource::Fallback);
    }

    #[test]
    fn test_set_manual_rejects_degenerate_values() {
        let mut book = RateBook::new("Standard");

        assert!(book.set_manual(UnitKind::Major, 0.0).is_err());
        assert!(book.set_manual(UnitKind::Major, -3.0).is_err());
        assert!(book.set_manual(UnitKind::Major, f64::NAN).is_err());
        assert!(book.set_manual(UnitKind::Major, f64::INFINITY).is_err());
    }

    #[test]
    fn test_effective_rate_divides_by_reference_price() {
        let mut book = RateBook::new("Standard");
        book.force_apply(&feed(Some(200.0), Some(2.0)));

        assert_eq!(book.effective_rate(), 100.0);
    }

    #[test]
    fn test_effective_rate_guards_degenerate_book() {
        let mut book = RateBook::new("Standard");
        // Drive the minor price to zero through the struct directly.
        book.minor.value = 0.0;

        assert_eq!(book.effective_rate(), FALLBACK_MAJOR_RATE);
    }
}

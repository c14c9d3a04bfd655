//! Exchange-rate acquisition.
//!
//! The distribution engine takes a single fixed rate per call; this
//! module owns where that rate comes from. Rates arrive from three
//! places, in falling order of trust: a third-party price feed, a manual
//! per-unit override entered by the user, and hardcoded fallback
//! constants for when the feed is unreachable.
//!
//! ```text
//! rates/
//! ├── mod.rs  - Shared types, fallback constants
//! ├── feed.rs - Price feed HTTP client with mirror fallback chain
//! └── book.rs - Current rate state, override semantics, freshness
//! ```

pub mod book;
pub mod feed;

pub use book::{RateBook, RateBookSnapshot, RateEntry};
pub use feed::{FeedQuote, FeedRates, PriceFeedClient, PriceFeedConfig};

use serde::{Deserialize, Serialize};

/// Last known feed rate for the major unit, in minor units per major.
/// Applied when every feed attempt fails and no manual value is set.
pub const FALLBACK_MAJOR_RATE: f64 = 205.84;

/// The minor unit is the feed's reference currency and prices at one.
pub const FALLBACK_MINOR_RATE: f64 = 1.0;

/// The two denominations a quote can be for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitKind {
    Major,
    Minor,
}

/// Where the current value of a rate entry came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateSource {
    /// Fetched from the price feed.
    Feed,
    /// Entered by hand. Survives background refreshes; only an explicit
    /// forced refresh replaces it.
    Manual,
    /// Hardcoded constant applied after total feed failure.
    Fallback,
}

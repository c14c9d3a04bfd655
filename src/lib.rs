//! orbsplit
//!
//! Party loot split service: divides in-game currency proceeds among a
//! small party proportionally to contribution percentages, with live
//! exchange rates from a third-party price feed and explicit remainder
//! accounting.
//!
//! ## Module Structure
//!
//! ```text
//! orbsplit/src/
//! ├── lib.rs         - Crate root with re-exports
//! ├── main.rs        - Server entrypoint
//! ├── config.rs      - Configuration management
//! ├── engine/        - Proportional distribution engine
//! │   ├── distribute.rs - Exact shares + remainder pool
//! │   ├── display.rs    - Whole-major / residue-minor display policy
//! │   └── weights.rs    - Weight advisory and equal-split plan
//! ├── rates/         - Exchange-rate acquisition
//! │   ├── feed.rs    - Price feed client with mirror fallback chain
//! │   └── book.rs    - Rate state, manual overrides, freshness
//! ├── session/       - Round lifecycle and persistence
//! │   ├── round.rs   - Rounds, confirmations, attachment records
//! │   ├── manager.rs - Session document
//! │   └── store.rs   - Atomic JSON file store
//! ├── report.rs      - Plain-text settlement report
//! └── api/           - HTTP API endpoints
//!     ├── split.rs   - Distribution computation
//!     ├── rates.rs   - Rate book access and refresh
//!     └── session.rs - Rounds, confirmations, report
//! ```

pub mod api;
pub mod config;
pub mod engine;
pub mod rates;
pub mod report;
pub mod session;

// Re-export main types for convenience
pub use config::Config;
pub use engine::{
    compute_distributable, convert, distribute, equal_split, evaluate, format_share,
    total_weight, weight_advisory, DisplayBreakdown, Distribution, DistributionRequest,
    Participant, ParticipantShare, RemainderPool,
};
pub use rates::{
    FeedQuote, FeedRates, PriceFeedClient, PriceFeedConfig, RateBook, RateBookSnapshot,
    RateEntry, RateSource, UnitKind,
};
pub use report::{ReportInputs, UnitNames};
pub use session::{
    Attachment, AttachmentKind, CalculatorInputs, ConfirmationStatus, Round, SessionData,
    SessionInfo, SessionStore,
};

// Re-export API types
pub use api::{
    create_rates_router, create_session_router, create_split_router, RatesApiState,
    SessionApiState, SplitApiState,
};

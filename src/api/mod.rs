//! HTTP API endpoints for the loot split service.
//!
//! Provides REST APIs for:
//! - Split computation (the distribution engine boundary)
//! - Exchange rates (snapshot, feed refresh, manual overrides)
//! - Session management (rounds, confirmations, attachments, report)

pub mod rates;
pub mod session;
pub mod split;

pub use rates::{create_router as create_rates_router, RatesApiState};
pub use session::{create_router as create_session_router, SessionApiState};
pub use split::{create_router as create_split_router, SplitApiState};

//! Exchange rate API.
//!
//! Endpoints:
//!   GET  /        -> Current rate book snapshot
//!   POST /refresh -> Fetch from the price feed and force-apply
//!   PUT  /manual  -> Set a manual override for one unit

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::rates::{PriceFeedClient, RateBook, RateBookSnapshot, UnitKind};

#[derive(Clone)]
pub struct RatesApiState {
    pub rates: Arc<RwLock<RateBook>>,
    pub feed: Arc<PriceFeedClient>,
}

pub fn create_router(state: RatesApiState) -> Router {
    Router::new()
        .route("/", get(get_rates))
        .route("/refresh", post(refresh))
        .route("/manual", put(set_manual))
        .with_state(state)
}

pub async fn get_rates(State(state): State<RatesApiState>) -> Json<RateBookSnapshot> {
    Json(state.rates.read().await.snapshot())
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    /// False when every feed attempt failed and fallback constants were
    /// applied instead.
    pub refreshed: bool,
    pub detail: String,
    pub rates: RateBookSnapshot,
}

/// Explicit user-requested refresh: fresh feed values win over any
/// manual overrides, matching the original refresh button.
pub async fn refresh(State(state): State<RatesApiState>) -> Json<RefreshResponse> {
    match state.feed.fetch_rates().await {
        Ok(feed_rates) => {
            let via = feed_rates.fetched_via.clone();
            let mut book = state.rates.write().await;
            book.force_apply(&feed_rates);
            info!(via = %via, "Rates refreshed from price feed");
            Json(RefreshResponse {
                refreshed: true,
                detail: format!("Updated from price feed via {}", via),
                rates: book.snapshot(),
            })
        }
        Err(e) => {
            warn!(error = ?e, "Price feed unavailable, applying fallback rates");
            let mut book = state.rates.write().await;
            book.apply_fallback();
            Json(RefreshResponse {
                refreshed: false,
                detail: format!("Price feed unavailable ({}); fallback rates applied", e),
                rates: book.snapshot(),
            })
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ManualRateRequest {
    pub unit: UnitKind,
    pub value: f64,
}

pub async fn set_manual(
    State(state): State<RatesApiState>,
    Json(request): Json<ManualRateRequest>,
) -> Result<Json<RateBookSnapshot>, (StatusCode, String)> {
    let mut book = state.rates.write().await;
    book.set_manual(request.unit, request.value)
        .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;
    Ok(Json(book.snapshot()))
}

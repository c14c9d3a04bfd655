//! Split computation API.
//!
//! Endpoints:
//!   POST /compute       -> Run one distribution over an input snapshot
//!   GET  /equal/{count} -> Equal-split weight plan for a party size
//!
//! This is the engine boundary. Raw user input is coerced here (blank
//! names, non-finite weights, missing rate) so the engine itself never
//! has to validate anything; degenerate conditions come back as
//! advisory warnings on the response, never as errors.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::warn;

use crate::engine::{
    self, format_share, DisplayBreakdown, DistributionRequest, Participant, RemainderPool,
};
use crate::rates::RateBook;
use crate::session::{CalculatorInputs, SessionData, SessionStore, MAX_PLAYERS, MIN_PLAYERS};

#[derive(Clone)]
pub struct SplitApiState {
    pub rates: Arc<RwLock<RateBook>>,
    pub session: Arc<RwLock<SessionData>>,
    pub store: Arc<SessionStore>,
}

pub fn create_router(state: SplitApiState) -> Router {
    Router::new()
        .route("/compute", post(compute))
        .route("/equal/{count}", get(equal_split))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
pub struct ParticipantInput {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub weight: f64,
}

#[derive(Debug, Deserialize)]
pub struct ComputeRequest {
    #[serde(default)]
    pub total_major: f64,
    #[serde(default)]
    pub deduction_major: f64,
    #[serde(default)]
    pub deduction_reimbursed: bool,
    pub participants: Vec<ParticipantInput>,
    /// Explicit rate override; resolved from the rate book when absent.
    pub rate: Option<f64>,
    /// Autosave these inputs into the session document.
    #[serde(default = "default_autosave")]
    pub autosave: bool,
}

fn default_autosave() -> bool {
    true
}

#[derive(Debug, Serialize)]
pub struct ShareView {
    pub name: String,
    pub weight: f64,
    pub amount_major: f64,
    pub amount_minor: f64,
    pub display: DisplayBreakdown,
}

#[derive(Debug, Serialize)]
pub struct ComputeResponse {
    pub distributable_major: f64,
    pub distributable_minor: f64,
    pub rate: f64,
    pub total_weight: f64,
    pub shares: Vec<ShareView>,
    pub remainder: RemainderPool,
    pub remainder_displayable: bool,
    pub warnings: Vec<String>,
}

pub async fn compute(
    State(state): State<SplitApiState>,
    Json(request): Json<ComputeRequest>,
) -> Json<ComputeResponse> {
    let mut warnings = Vec::new();

    let participants: Vec<Participant> = request
        .participants
        .iter()
        .enumerate()
        .map(|(i, p)| Participant::sanitized(&p.name, p.weight, i))
        .collect();

    let total = coerce_amount(request.total_major);
    let deduction = coerce_amount(request.deduction_major);

    let rate = match request.rate {
        Some(rate) if rate.is_finite() && rate > 0.0 => rate,
        Some(rate) => {
            warnings.push(format!(
                "Ignoring invalid rate override {}; using the current rate book",
                rate
            ));
            state.rates.read().await.effective_rate()
        }
        None => state.rates.read().await.effective_rate(),
    };

    let engine_request = DistributionRequest {
        total_major: total,
        deduction_major: deduction,
        deduction_reimbursed: request.deduction_reimbursed,
        participants,
        rate,
    };
    let distribution = engine::evaluate(&engine_request);

    let total_weight = engine::total_weight(&engine_request.participants);
    if let Some(deviation) = engine::weight_advisory(total_weight) {
        warnings.push(format!(
            "Contribution total is {:.2}% ({}{:.2}% off 100%); splitting on actual weights",
            total_weight,
            if deviation > 0.0 { "+" } else { "" },
            deviation
        ));
    }
    if total_weight <= 0.0 && !engine_request.participants.is_empty() {
        warnings.push("No positive contributions; the whole amount stays in the pool".to_string());
    }
    if distribution.distributable_major < 0.0 {
        warnings.push(format!(
            "Deduction exceeds the total by {:.2}; shares are negative",
            -distribution.distributable_major
        ));
    }

    if request.autosave {
        autosave_inputs(&state, &engine_request, &mut warnings).await;
    }

    let shares = distribution
        .shares
        .iter()
        .map(|share| ShareView {
            name: share.name.clone(),
            weight: share.weight,
            amount_major: share.amount_major,
            amount_minor: share.amount_minor,
            display: format_share(share.amount_major, share.amount_minor, rate),
        })
        .collect();

    Json(ComputeResponse {
        distributable_major: distribution.distributable_major,
        distributable_minor: distribution.distributable_minor,
        rate,
        total_weight,
        shares,
        remainder: distribution.remainder,
        remainder_displayable: distribution.remainder.is_displayable(),
        warnings,
    })
}

/// Weight plan that divides 100% evenly across a party.
pub async fn equal_split(
    Path(count): Path<usize>,
) -> Result<Json<Vec<f64>>, (StatusCode, String)> {
    if !(MIN_PLAYERS..=MAX_PLAYERS).contains(&count) {
        return Err((
            StatusCode::BAD_REQUEST,
            format!(
                "Party size must be between {} and {}, got {}",
                MIN_PLAYERS, MAX_PLAYERS, count
            ),
        ));
    }
    Ok(Json(engine::equal_split(count)))
}

async fn autosave_inputs(
    state: &SplitApiState,
    request: &DistributionRequest,
    warnings: &mut Vec<String>,
) {
    let inputs = CalculatorInputs {
        total_major: request.total_major,
        deduction_major: request.deduction_major,
        deduction_reimbursed: request.deduction_reimbursed,
        participants: request.participants.clone(),
    };

    let mut session = state.session.write().await;
    match session.save_inputs(inputs) {
        Ok(()) => {
            if let Err(e) = state.store.save(&session) {
                warn!(error = ?e, "Failed to persist autosaved inputs");
                warnings.push("Inputs computed but not persisted".to_string());
            }
        }
        Err(e) => {
            // Party size outside limits still computes; it just does not
            // overwrite the saved state.
            warnings.push(format!("Inputs not autosaved: {}", e));
        }
    }
}

fn coerce_amount(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

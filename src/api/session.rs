//! Session and round management API.
//!
//! Endpoints:
//!   GET  /                                    -> Session summary
//!   POST /rounds                              -> Create a round
//!   POST /rounds/{id}/activate                -> Make a round current
//!   PUT  /rounds/{id}                         -> Rename / edit members
//!   POST /rounds/{id}/confirmations/{member}  -> Toggle a receipt flag
//!   POST /rounds/{id}/confirmations/reset     -> All flags back to pending
//!   POST /rounds/{id}/attachments             -> Record attachment metadata
//!   GET  /report                              -> Text report for the
//!                                                active round and saved inputs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::warn;
use uuid::Uuid;

use crate::engine;
use crate::rates::RateBook;
use crate::report::{self, ReportInputs, UnitNames};
use crate::session::{
    Attachment, AttachmentKind, ConfirmationStatus, Round, SessionData, SessionStore,
};

#[derive(Clone)]
pub struct SessionApiState {
    pub session: Arc<RwLock<SessionData>>,
    pub store: Arc<SessionStore>,
    pub rates: Arc<RwLock<RateBook>>,
    pub units: Arc<UnitNames>,
}

pub fn create_router(state: SessionApiState) -> Router {
    Router::new()
        .route("/", get(get_session))
        .route("/rounds", post(create_round))
        .route("/rounds/{id}/activate", post(activate_round))
        .route("/rounds/{id}", put(edit_round))
        .route(
            "/rounds/{id}/confirmations/reset",
            post(reset_confirmations),
        )
        .route(
            "/rounds/{id}/confirmations/{member}",
            post(toggle_confirmation),
        )
        .route("/rounds/{id}/attachments", post(add_attachment))
        .route("/report", get(get_report))
        .with_state(state)
}

#[derive(Debug, Serialize)]
pub struct RoundSummary {
    pub round_id: u32,
    pub round_name: String,
    pub created: DateTime<Utc>,
    pub members: Vec<String>,
    pub confirmed: usize,
    pub item_count: usize,
    pub evidence_count: usize,
    pub is_active: bool,
}

impl RoundSummary {
    fn from_round(round: &Round) -> Self {
        Self {
            round_id: round.round_id,
            round_name: round.round_name.clone(),
            created: round.created,
            members: round.members.clone(),
            confirmed: round.confirmed_count(),
            item_count: round.attachments(AttachmentKind::Items).len(),
            evidence_count: round.attachments(AttachmentKind::Evidence).len(),
            is_active: round.is_active,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SessionView {
    pub session_id: Uuid,
    pub group_name: String,
    pub created: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
    pub current_round_id: u32,
    pub rounds: Vec<RoundSummary>,
}

pub async fn get_session(State(state): State<SessionApiState>) -> Json<SessionView> {
    let session = state.session.read().await;
    Json(SessionView {
        session_id: session.info.session_id,
        group_name: session.info.group_name.clone(),
        created: session.info.created,
        last_updated: session.info.last_updated,
        current_round_id: session.current_round_id,
        rounds: session.rounds.iter().map(RoundSummary::from_round).collect(),
    })
}

#[derive(Debug, Deserialize)]
pub struct CreateRoundRequest {
    pub name: Option<String>,
    pub members: Vec<String>,
}

pub async fn create_round(
    State(state): State<SessionApiState>,
    Json(request): Json<CreateRoundRequest>,
) -> Result<Json<RoundSummary>, (StatusCode, String)> {
    let mut session = state.session.write().await;
    let round_id = session
        .create_round(request.name, request.members)
        .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;
    persist(&state.store, &session)?;

    let round = session
        .current_round()
        .filter(|r| r.round_id == round_id)
        .ok_or_else(|| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Round vanished after creation".to_string(),
            )
        })?;
    Ok(Json(RoundSummary::from_round(round)))
}

pub async fn activate_round(
    State(state): State<SessionApiState>,
    Path(round_id): Path<u32>,
) -> Result<Json<RoundSummary>, (StatusCode, String)> {
    let mut session = state.session.write().await;
    session
        .switch_round(round_id)
        .map_err(|e| (StatusCode::NOT_FOUND, e.to_string()))?;
    persist(&state.store, &session)?;

    let round = session.current_round().ok_or_else(|| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "No current round after switch".to_string(),
        )
    })?;
    Ok(Json(RoundSummary::from_round(round)))
}

#[derive(Debug, Deserialize)]
pub struct EditRoundRequest {
    pub name: Option<String>,
    pub members: Option<Vec<String>>,
}

pub async fn edit_round(
    State(state): State<SessionApiState>,
    Path(round_id): Path<u32>,
    Json(request): Json<EditRoundRequest>,
) -> Result<Json<RoundSummary>, (StatusCode, String)> {
    let mut session = state.session.write().await;
    session
        .edit_round(round_id, request.name, request.members)
        .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;
    persist(&state.store, &session)?;

    let round = session
        .rounds
        .iter()
        .find(|r| r.round_id == round_id)
        .ok_or_else(|| (StatusCode::NOT_FOUND, format!("No round with id {}", round_id)))?;
    Ok(Json(RoundSummary::from_round(round)))
}

#[derive(Debug, Serialize)]
pub struct ConfirmationView {
    pub member: String,
    pub status: ConfirmationStatus,
}

pub async fn toggle_confirmation(
    State(state): State<SessionApiState>,
    Path((round_id, member)): Path<(u32, String)>,
) -> Result<Json<ConfirmationView>, (StatusCode, String)> {
    let mut session = state.session.write().await;
    let status = session
        .round_mut(round_id)
        .and_then(|round| round.toggle_confirmation(&member))
        .map_err(|e| (StatusCode::NOT_FOUND, e.to_string()))?;
    persist(&state.store, &session)?;

    Ok(Json(ConfirmationView { member, status }))
}

pub async fn reset_confirmations(
    State(state): State<SessionApiState>,
    Path(round_id): Path<u32>,
) -> Result<Json<RoundSummary>, (StatusCode, String)> {
    let mut session = state.session.write().await;
    let round = session
        .round_mut(round_id)
        .map_err(|e| (StatusCode::NOT_FOUND, e.to_string()))?;
    round.reset_confirmations();
    let summary = RoundSummary::from_round(round);
    persist(&state.store, &session)?;

    Ok(Json(summary))
}

#[derive(Debug, Deserialize)]
pub struct AddAttachmentRequest {
    pub kind: AttachmentKind,
    pub filename: String,
    pub byte_size: u64,
}

pub async fn add_attachment(
    State(state): State<SessionApiState>,
    Path(round_id): Path<u32>,
    Json(request): Json<AddAttachmentRequest>,
) -> Result<Json<RoundSummary>, (StatusCode, String)> {
    if request.filename.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            "Attachment filename cannot be blank".to_string(),
        ));
    }

    let mut session = state.session.write().await;
    let round = session
        .round_mut(round_id)
        .map_err(|e| (StatusCode::NOT_FOUND, e.to_string()))?;
    round.add_attachment(
        request.kind,
        Attachment {
            filename: request.filename,
            byte_size: request.byte_size,
            uploaded_at: Utc::now(),
        },
    );
    let summary = RoundSummary::from_round(round);
    persist(&state.store, &session)?;

    Ok(Json(summary))
}

/// Text report over the active round and the last autosaved inputs,
/// ready to paste into party chat.
pub async fn get_report(
    State(state): State<SessionApiState>,
) -> Result<String, (StatusCode, String)> {
    let session = state.session.read().await;
    let book = state.rates.read().await;

    let round_name = session
        .current_round()
        .map(|r| r.round_name.clone())
        .unwrap_or_else(|| "Round 1".to_string());

    let participants: Vec<_> = session
        .inputs
        .participants
        .iter()
        .enumerate()
        .map(|(i, p)| engine::Participant::sanitized(&p.name, p.weight, i))
        .collect();

    let rate = book.effective_rate();
    let request = engine::DistributionRequest {
        total_major: session.inputs.total_major,
        deduction_major: session.inputs.deduction_major,
        deduction_reimbursed: session.inputs.deduction_reimbursed,
        participants,
        rate,
    };
    let distribution = engine::evaluate(&request);

    Ok(report::render(&ReportInputs {
        group_name: &session.info.group_name,
        round_name: &round_name,
        distribution: &distribution,
        rate,
        rates: &book.snapshot(),
        units: &state.units,
    }))
}

fn persist(
    store: &SessionStore,
    session: &SessionData,
) -> Result<(), (StatusCode, String)> {
    store.save(session).map_err(|e| {
        warn!(error = ?e, "Failed to persist session");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to persist session: {}", e),
        )
    })
}

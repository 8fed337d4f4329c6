// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Event administration, standings and completion routes.

use crate::error::{AppError, Result};
use crate::models::{EventDefinition, Leaderboards, Participant, ParticipantStatus, RuleDiagnostic};
use crate::routes::parse_date;
use crate::services::engine::FinalizeSummary;
use crate::time_utils::local_today;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    routing::{get, post, put},
    Json, Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/events/{event_id}", put(put_event))
        .route("/api/events/{event_id}/participants", post(add_participant))
        .route("/api/events/{event_id}/leaderboard", get(get_leaderboard))
        .route(
            "/api/events/{event_id}/participants/{user_id}/status",
            get(get_participant_status),
        )
        .route("/api/events/{event_id}/finalize", post(finalize_event))
}

/// Optional override of the event calendar's "today".
#[derive(Deserialize)]
struct AsOfQuery {
    as_of: Option<String>,
}

impl AsOfQuery {
    fn today(&self, state: &AppState) -> Result<NaiveDate> {
        match &self.as_of {
            Some(raw) => parse_date("as_of", raw),
            None => Ok(local_today(
                chrono::Utc::now(),
                state.config.event_utc_offset_hours,
            )),
        }
    }
}

// ─── Events ──────────────────────────────────────────────────

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct EventResponse {
    pub id: String,
    pub name: String,
    pub start_date: String,
    pub end_date: String,
    pub total_days: u32,
    pub active_rules: usize,
    /// Rules that were not loaded and are ignored
    pub skipped_rules: Vec<RuleDiagnostic>,
    /// Blocking rules with invalid config; admission is refused until fixed
    pub invalid_blocking_rules: Vec<RuleDiagnostic>,
}

/// Create or replace an event and its rules.
async fn put_event(
    State(state): State<Arc<AppState>>,
    Path(event_id): Path<String>,
    Json(definition): Json<EventDefinition>,
) -> Result<Json<EventResponse>> {
    let event = state.engine.upsert_event(&event_id, definition).await?;

    Ok(Json(EventResponse {
        total_days: event.total_days(),
        active_rules: event.rules.rules().len(),
        skipped_rules: event.rules.skipped().to_vec(),
        invalid_blocking_rules: event.rules.broken_blocking().to_vec(),
        start_date: event.start_date.to_string(),
        end_date: event.end_date.to_string(),
        id: event.id,
        name: event.name,
    }))
}

// ─── Participants ────────────────────────────────────────────

#[derive(Deserialize, Validate)]
struct ParticipantRequest {
    #[validate(length(min = 1, max = 128))]
    user_id: String,
    #[validate(length(min = 1, max = 100))]
    display_name: String,
}

/// Register a user in an event.
async fn add_participant(
    State(state): State<Arc<AppState>>,
    Path(event_id): Path<String>,
    Json(request): Json<ParticipantRequest>,
) -> Result<Json<Participant>> {
    request
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let participant = Participant {
        event_id,
        user_id: request.user_id,
        display_name: request.display_name,
    };
    state.engine.add_participant(participant.clone())?;
    Ok(Json(participant))
}

// ─── Standings ───────────────────────────────────────────────

/// Endurance and consistency leaderboards.
async fn get_leaderboard(
    State(state): State<Arc<AppState>>,
    Path(event_id): Path<String>,
) -> Result<Json<Leaderboards>> {
    Ok(Json(state.engine.leaderboard(&event_id)?))
}

// ─── Completion ──────────────────────────────────────────────

/// Completion and penalty for one participant, evaluated now.
async fn get_participant_status(
    State(state): State<Arc<AppState>>,
    Path((event_id, user_id)): Path<(String, String)>,
    Query(query): Query<AsOfQuery>,
) -> Result<Json<ParticipantStatus>> {
    let today = query.today(&state)?;
    let status = state
        .engine
        .participant_status(&event_id, &user_id, today)
        .await?;
    Ok(Json(status))
}

/// Store completion and penalty records for every participant.
async fn finalize_event(
    State(state): State<Arc<AppState>>,
    Path(event_id): Path<String>,
    Query(query): Query<AsOfQuery>,
) -> Result<Json<FinalizeSummary>> {
    let today = query.today(&state)?;
    Ok(Json(state.engine.finalize_event(&event_id, today).await?))
}

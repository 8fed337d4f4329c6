// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Activity ingestion routes.

use crate::error::{AppError, Result};
use crate::models::InboundActivity;
use crate::routes::parse_date;
use crate::services::ProcessResult;
use crate::AppState;
use axum::{
    extract::{Path, State},
    routing::{delete, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/activities", post(ingest_activity))
        .route(
            "/api/events/{event_id}/participants/{user_id}/activities/{date}",
            delete(delete_activity),
        )
}

/// Score an inbound activity for every event its user is in.
async fn ingest_activity(
    State(state): State<Arc<AppState>>,
    Json(inbound): Json<InboundActivity>,
) -> Result<Json<ProcessResult>> {
    if inbound.user_id.is_empty() {
        return Err(AppError::BadRequest("userId is required".to_string()));
    }
    if !state
        .rate_limiter
        .check(&inbound.user_id, chrono::Utc::now())
    {
        return Err(AppError::RateLimited(inbound.user_id));
    }

    let result = state.engine.process_activity(&inbound).await?;
    Ok(Json(result))
}

#[derive(Serialize)]
pub struct DeleteActivityResponse {
    pub removed: bool,
}

/// Remove the activity recorded for one date and recompute standings.
async fn delete_activity(
    State(state): State<Arc<AppState>>,
    Path((event_id, user_id, date)): Path<(String, String, String)>,
) -> Result<Json<DeleteActivityResponse>> {
    let date = parse_date("date", &date)?;
    let removed = state
        .engine
        .remove_activity(&event_id, &user_id, date)
        .await?;
    if !removed {
        return Err(AppError::NotFound(format!(
            "Activity on {} for {} in event {}",
            date, user_id, event_id
        )));
    }
    Ok(Json(DeleteActivityResponse { removed }))
}

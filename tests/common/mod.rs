// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::body::Body;
use axum::http::{header, Request, Response};
use serde_json::{json, Value};
use std::sync::Arc;
use streakboard::config::Config;
use streakboard::db::MemoryStore;
use streakboard::models::{EventDefinition, InboundActivity, Participant, RuleRecord};
use streakboard::routes::create_router;
use streakboard::services::{
    BonusAppliedIntent, ChannelNotifier, IngestRateLimiter, LogNotifier, ScoringEngine,
};
use streakboard::AppState;
use tokio::sync::mpsc::UnboundedReceiver;

/// Create a test app backed by an in-memory store.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    create_test_app_with_config(Config::test_default())
}

#[allow(dead_code)]
pub fn create_test_app_with_config(config: Config) -> (axum::Router, Arc<AppState>) {
    let engine = ScoringEngine::new(Arc::new(MemoryStore::new()), Arc::new(LogNotifier));
    let rate_limiter =
        IngestRateLimiter::new(config.ingest_rate_limit, config.ingest_rate_window_secs);

    let state = Arc::new(AppState {
        config,
        engine,
        rate_limiter,
    });

    (create_router(state.clone()), state)
}

/// Engine whose bonus notifications can be inspected.
#[allow(dead_code)]
pub fn test_engine() -> (ScoringEngine, UnboundedReceiver<BonusAppliedIntent>) {
    let (notifier, receiver) = ChannelNotifier::new();
    (
        ScoringEngine::new(Arc::new(MemoryStore::new()), Arc::new(notifier)),
        receiver,
    )
}

#[allow(dead_code)]
pub fn date(s: &str) -> chrono::NaiveDate {
    chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

#[allow(dead_code)]
pub fn rule(id: &str, rule_type: &str, config: Value) -> RuleRecord {
    RuleRecord {
        id: id.to_string(),
        rule_type: rule_type.to_string(),
        config,
    }
}

/// A ten-day event (2024-01-01 to 2024-01-10).
#[allow(dead_code)]
pub fn january_event(rules: Vec<RuleRecord>) -> EventDefinition {
    EventDefinition {
        name: "New Year Ten".to_string(),
        start_date: date("2024-01-01"),
        end_date: date("2024-01-10"),
        rules,
    }
}

/// Store an event and register the given users in it.
#[allow(dead_code)]
pub async fn seed_event(
    engine: &ScoringEngine,
    event_id: &str,
    def: EventDefinition,
    users: &[&str],
) {
    engine.upsert_event(event_id, def).await.unwrap();
    for user in users {
        engine
            .add_participant(Participant {
                event_id: event_id.to_string(),
                user_id: user.to_string(),
                display_name: format!("Runner {}", user),
            })
            .unwrap();
    }
}

/// A run at 6:00 min/km.
#[allow(dead_code)]
pub fn run(user: &str, start_local: &str, meters: f64) -> InboundActivity {
    InboundActivity {
        source_activity_id: 1000,
        user_id: user.to_string(),
        sport_type: "Run".to_string(),
        distance_meters: meters,
        moving_time_seconds: meters * 0.36,
        start_local: start_local.to_string(),
    }
}

#[allow(dead_code)]
pub fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[allow(dead_code)]
pub fn empty_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

#[allow(dead_code)]
pub async fn read_json(response: Response<Body>) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap_or(json!(null))
}

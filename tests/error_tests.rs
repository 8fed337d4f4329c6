// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::NaiveDate;
use streakboard::db::StoreError;
use streakboard::error::AppError;
use streakboard::models::IngestError;
use streakboard::services::EngineError;

#[test]
fn test_engine_errors_map_to_status() {
    let cases = [
        (
            EngineError::NotFound("Event e1".to_string()),
            StatusCode::NOT_FOUND,
        ),
        (
            EngineError::Ingest(IngestError::Corrupt("distance_meters = NaN".to_string())),
            StatusCode::BAD_REQUEST,
        ),
        (
            EngineError::EventNotEnded {
                event_id: "e1".to_string(),
                end_date: NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
            },
            StatusCode::BAD_REQUEST,
        ),
        (
            EngineError::Store(StoreError::Unavailable("disk full".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR,
        ),
    ];

    for (err, status) in cases {
        let response = AppError::from(err).into_response();
        assert_eq!(response.status(), status);
    }
}

#[test]
fn test_store_error_is_database_error() {
    let err: AppError = StoreError::Corrupt("bad row".to_string()).into();
    assert!(matches!(err, AppError::Database(_)));
}

#[test]
fn test_rate_limited_status() {
    let response = AppError::RateLimited("u1".to_string()).into_response();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
}

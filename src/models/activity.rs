// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Activity models: inbound records, canonical activities, and scored results.

use crate::models::rule::RuleType;
use crate::time_utils::parse_start_local;
use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Sport types that count toward events.
pub const ACCEPTED_SPORT_TYPES: [&str; 2] = ["Run", "Walk"];

/// Activity record as handed over by the ingestion collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InboundActivity {
    pub source_activity_id: u64,
    pub user_id: String,
    /// Sport type (Run, Walk, Ride, ...)
    #[serde(rename = "type")]
    pub sport_type: String,
    pub distance_meters: f64,
    pub moving_time_seconds: f64,
    /// Local start time (ISO 8601)
    pub start_local: String,
}

/// Why an inbound record cannot become a canonical activity.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum IngestError {
    #[error("Unsupported activity type: {0}")]
    UnsupportedType(String),

    #[error("Invalid local start time: {0}")]
    InvalidStartTime(String),

    #[error("Corrupt activity record: {0}")]
    Corrupt(String),
}

impl IngestError {
    /// Unsupported types are an expected outcome, not a broken record.
    pub fn is_rejection(&self) -> bool {
        matches!(self, IngestError::UnsupportedType(_))
    }
}

impl InboundActivity {
    /// Check the record itself, independent of any event.
    ///
    /// Returns the parsed local start time.
    pub fn check(&self) -> Result<NaiveDateTime, IngestError> {
        if !ACCEPTED_SPORT_TYPES.contains(&self.sport_type.as_str()) {
            return Err(IngestError::UnsupportedType(self.sport_type.clone()));
        }
        if !self.distance_meters.is_finite() || self.distance_meters < 0.0 {
            return Err(IngestError::Corrupt(format!(
                "distance_meters = {}",
                self.distance_meters
            )));
        }
        if !self.moving_time_seconds.is_finite() || self.moving_time_seconds < 0.0 {
            return Err(IngestError::Corrupt(format!(
                "moving_time_seconds = {}",
                self.moving_time_seconds
            )));
        }
        parse_start_local(&self.start_local)
            .ok_or_else(|| IngestError::InvalidStartTime(self.start_local.clone()))
    }

    /// Convert into the canonical form for one event.
    pub fn canonicalize(&self, event_id: &str) -> Result<Activity, IngestError> {
        let start_local = self.check()?;

        Ok(Activity {
            user_id: self.user_id.clone(),
            event_id: event_id.to_string(),
            start_local,
            distance_meters: self.distance_meters,
            moving_time_seconds: self.moving_time_seconds,
            source_activity_id: self.source_activity_id,
        })
    }
}

/// Canonical activity within one event.
///
/// At most one exists per `(user_id, event_id, activity_date)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    pub user_id: String,
    pub event_id: String,
    /// Local wall-clock start time
    pub start_local: NaiveDateTime,
    pub distance_meters: f64,
    pub moving_time_seconds: f64,
    pub source_activity_id: u64,
}

impl Activity {
    /// Local calendar date; the unit of scoring and streaks.
    pub fn activity_date(&self) -> NaiveDate {
        self.start_local.date()
    }

    pub fn local_time(&self) -> NaiveTime {
        self.start_local.time()
    }

    /// Day of week with 0 = Sunday.
    pub fn weekday_from_sunday(&self) -> u8 {
        self.start_local.weekday().num_days_from_sunday() as u8
    }

    pub fn distance_km(&self) -> f64 {
        self.distance_meters / 1000.0
    }

    /// Minutes per km, undefined for zero distance.
    pub fn pace_min_per_km(&self) -> Option<f64> {
        let km = self.distance_km();
        if km > 0.0 {
            Some(self.moving_time_seconds / 60.0 / km)
        } else {
            None
        }
    }
}

/// A bonus that an activity qualified for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct BonusOutcome {
    #[cfg_attr(feature = "binding-generation", ts(type = "string"))]
    pub bonus_type: RuleType,
    pub rule_id: String,
    pub name: String,
    pub multiplier: f64,
    pub message: String,
    pub priority: u8,
}

/// Activity with computed points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredActivity {
    #[serde(flatten)]
    pub activity: Activity,
    pub base_points: f64,
    pub applied_bonus: Option<BonusOutcome>,
    pub final_points: f64,
    /// Bonuses that also qualified but lost on priority.
    pub rejected_bonuses: Vec<BonusOutcome>,
}

impl ScoredActivity {
    pub fn activity_date(&self) -> NaiveDate {
        self.activity.activity_date()
    }
}

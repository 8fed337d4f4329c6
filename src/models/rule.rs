// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Event rule configuration.
//!
//! Rules arrive from the admin surface as loosely-typed JSON records
//! (`{ id, type, config }`). They are parsed once, when an event is stored,
//! into the closed [`RuleConfig`] union so that everything downstream can
//! match exhaustively on the rule kind.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use validator::{Validate, ValidationError};

/// Closed set of rule kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleType {
    MinDistance,
    PaceRange,
    MinActiveDays,
    TetBonus,
    LuckyDistance,
    MultiplierDay,
    PenaltyMissedDay,
}

impl RuleType {
    pub const ALL: [RuleType; 7] = [
        RuleType::MinDistance,
        RuleType::PaceRange,
        RuleType::MinActiveDays,
        RuleType::TetBonus,
        RuleType::LuckyDistance,
        RuleType::MultiplierDay,
        RuleType::PenaltyMissedDay,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RuleType::MinDistance => "min_distance",
            RuleType::PaceRange => "pace_range",
            RuleType::MinActiveDays => "min_active_days",
            RuleType::TetBonus => "tet_bonus",
            RuleType::LuckyDistance => "lucky_distance",
            RuleType::MultiplierDay => "multiplier_day",
            RuleType::PenaltyMissedDay => "penalty_missed_day",
        }
    }

    pub fn parse(raw: &str) -> Option<RuleType> {
        Self::ALL.into_iter().find(|t| t.as_str() == raw)
    }

    /// Blocking rules can exclude an activity from an event entirely.
    pub fn is_blocking(&self) -> bool {
        matches!(self, RuleType::MinDistance | RuleType::PaceRange)
    }

    /// Fixed resolution priority for bonus rules (higher wins).
    pub fn bonus_priority(&self) -> Option<u8> {
        match self {
            RuleType::TetBonus => Some(3),
            RuleType::LuckyDistance => Some(2),
            RuleType::MultiplierDay => Some(1),
            _ => None,
        }
    }
}

impl fmt::Display for RuleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rule as stored/edited by the admin surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleRecord {
    pub id: String,
    #[serde(rename = "type")]
    pub rule_type: String,
    #[serde(default)]
    pub config: serde_json::Value,
}

// ─── Per-kind configuration ──────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct MinDistanceConfig {
    #[validate(range(min = 0.0))]
    pub min_km: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_pace_bounds"))]
pub struct PaceRangeConfig {
    /// Fastest accepted pace, minutes per km.
    #[validate(range(min = 0.0))]
    pub min_pace: f64,
    /// Slowest accepted pace, minutes per km.
    #[validate(range(min = 0.0))]
    pub max_pace: f64,
}

fn validate_pace_bounds(config: &PaceRangeConfig) -> Result<(), ValidationError> {
    if config.min_pace > config.max_pace {
        return Err(ValidationError::new("pace_bounds").with_message("minPace exceeds maxPace".into()));
    }
    Ok(())
}

/// A completion badge awarded at or above `min_percentage`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct BadgeTier {
    #[validate(length(min = 1))]
    pub name: String,
    #[validate(range(min = 0.0, max = 100.0))]
    pub min_percentage: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_badge_order"))]
pub struct MinActiveDaysConfig {
    #[serde(alias = "minDays")]
    pub required_days: u32,
    #[serde(default)]
    pub grace_days: u32,
    /// Ordered by strictly increasing `min_percentage`.
    #[serde(default)]
    #[validate(nested)]
    pub badge_tiers: Vec<BadgeTier>,
}

fn validate_badge_order(config: &MinActiveDaysConfig) -> Result<(), ValidationError> {
    let increasing = config
        .badge_tiers
        .windows(2)
        .all(|pair| pair[0].min_percentage < pair[1].min_percentage);
    if !increasing {
        return Err(ValidationError::new("badge_order")
            .with_message("badge tiers must have strictly increasing thresholds".into()));
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeRange {
    #[serde(with = "crate::time_utils::clock_time")]
    pub start: NaiveTime,
    #[serde(with = "crate::time_utils::clock_time")]
    pub end: NaiveTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_tet_window"))]
pub struct TetBonusConfig {
    pub tet_date: NaiveDate,
    pub time_range: TimeRange,
    #[validate(range(min = 0.0))]
    pub min_km: f64,
    #[validate(range(exclusive_min = 0.0))]
    pub multiplier: f64,
}

fn validate_tet_window(config: &TetBonusConfig) -> Result<(), ValidationError> {
    if config.time_range.start > config.time_range.end {
        return Err(ValidationError::new("time_range")
            .with_message("timeRange.start is after timeRange.end".into()));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LuckyDistance {
    #[validate(range(exclusive_min = 0.0))]
    pub distance: f64,
    #[validate(range(exclusive_min = 0.0))]
    pub multiplier: f64,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LuckyDistanceConfig {
    /// First matching entry wins.
    #[validate(length(min = 1), nested)]
    pub lucky_distances: Vec<LuckyDistance>,
    #[validate(range(min = 0.0))]
    pub tolerance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct MultiplierDayConfig {
    /// Day of week, 0 = Sunday.
    #[validate(range(max = 6))]
    pub multiplier_day: u8,
    #[validate(range(exclusive_min = 0.0))]
    pub multiplier: f64,
}

fn default_currency() -> String {
    crate::config::DEFAULT_CURRENCY.to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PenaltyConfig {
    pub penalty_per_day: u64,
    #[serde(default = "default_currency")]
    #[validate(length(min = 1))]
    pub currency: String,
}

/// Typed rule configuration, one variant per [`RuleType`].
#[derive(Debug, Clone, PartialEq)]
pub enum RuleConfig {
    MinDistance(MinDistanceConfig),
    PaceRange(PaceRangeConfig),
    MinActiveDays(MinActiveDaysConfig),
    TetBonus(TetBonusConfig),
    LuckyDistance(LuckyDistanceConfig),
    MultiplierDay(MultiplierDayConfig),
    PenaltyMissedDay(PenaltyConfig),
}

impl RuleConfig {
    pub fn rule_type(&self) -> RuleType {
        match self {
            RuleConfig::MinDistance(_) => RuleType::MinDistance,
            RuleConfig::PaceRange(_) => RuleType::PaceRange,
            RuleConfig::MinActiveDays(_) => RuleType::MinActiveDays,
            RuleConfig::TetBonus(_) => RuleType::TetBonus,
            RuleConfig::LuckyDistance(_) => RuleType::LuckyDistance,
            RuleConfig::MultiplierDay(_) => RuleType::MultiplierDay,
            RuleConfig::PenaltyMissedDay(_) => RuleType::PenaltyMissedDay,
        }
    }

    /// Parse and validate a raw config against its declared kind.
    pub fn parse(rule_type: RuleType, raw: &serde_json::Value) -> Result<Self, RuleError> {
        fn typed<T>(raw: &serde_json::Value) -> Result<T, RuleError>
        where
            T: serde::de::DeserializeOwned + Validate,
        {
            let config: T = serde_json::from_value(raw.clone())
                .map_err(|e| RuleError::Malformed(e.to_string()))?;
            config
                .validate()
                .map_err(|e| RuleError::Invalid(e.to_string()))?;
            Ok(config)
        }

        Ok(match rule_type {
            RuleType::MinDistance => RuleConfig::MinDistance(typed(raw)?),
            RuleType::PaceRange => RuleConfig::PaceRange(typed(raw)?),
            RuleType::MinActiveDays => RuleConfig::MinActiveDays(typed(raw)?),
            RuleType::TetBonus => RuleConfig::TetBonus(typed(raw)?),
            RuleType::LuckyDistance => RuleConfig::LuckyDistance(typed(raw)?),
            RuleType::MultiplierDay => RuleConfig::MultiplierDay(typed(raw)?),
            RuleType::PenaltyMissedDay => RuleConfig::PenaltyMissedDay(typed(raw)?),
        })
    }
}

/// A validated rule attached to an event.
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    pub id: String,
    pub config: RuleConfig,
}

impl Rule {
    pub fn rule_type(&self) -> RuleType {
        self.config.rule_type()
    }
}

/// Errors from parsing a single rule.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RuleError {
    #[error("Unknown rule type: {0}")]
    UnknownType(String),

    #[error("Malformed rule config: {0}")]
    Malformed(String),

    #[error("Invalid rule config: {0}")]
    Invalid(String),
}

/// Why a rule record was not loaded.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(ts_rs::TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct RuleDiagnostic {
    pub rule_id: String,
    pub rule_type: String,
    pub reason: String,
}

/// The rules attached to one event.
///
/// List order carries no meaning; evaluation order is decided by rule kind.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleSet {
    rules: Vec<Rule>,
    skipped: Vec<RuleDiagnostic>,
    broken_blocking: Vec<RuleDiagnostic>,
}

impl RuleSet {
    /// Load rule records, failing closed per rule.
    ///
    /// Unknown kinds and invalid non-blocking configs are skipped. Invalid
    /// blocking configs are remembered so admission can refuse to run
    /// without them.
    pub fn load(records: &[RuleRecord]) -> Self {
        let mut set = RuleSet::default();

        for record in records {
            let Some(rule_type) = RuleType::parse(&record.rule_type) else {
                let err = RuleError::UnknownType(record.rule_type.clone());
                tracing::warn!(rule_id = %record.id, error = %err, "Skipping rule");
                set.skipped.push(diagnostic(record, &err));
                continue;
            };

            match RuleConfig::parse(rule_type, &record.config) {
                Ok(config) => set.rules.push(Rule {
                    id: record.id.clone(),
                    config,
                }),
                Err(err) if rule_type.is_blocking() => {
                    tracing::error!(
                        rule_id = %record.id,
                        rule_type = %rule_type,
                        error = %err,
                        "Blocking rule failed validation"
                    );
                    set.broken_blocking.push(diagnostic(record, &err));
                }
                Err(err) => {
                    tracing::warn!(
                        rule_id = %record.id,
                        rule_type = %rule_type,
                        error = %err,
                        "Skipping rule with invalid config"
                    );
                    set.skipped.push(diagnostic(record, &err));
                }
            }
        }

        set
    }

    pub fn from_rules(rules: Vec<Rule>) -> Self {
        Self {
            rules,
            ..Default::default()
        }
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn skipped(&self) -> &[RuleDiagnostic] {
        &self.skipped
    }

    /// Blocking rules whose config failed validation.
    pub fn broken_blocking(&self) -> &[RuleDiagnostic] {
        &self.broken_blocking
    }

    /// True only when the event was defined without any rule records.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty() && self.skipped.is_empty() && self.broken_blocking.is_empty()
    }

    pub fn min_active_days(&self) -> Option<&MinActiveDaysConfig> {
        self.rules.iter().find_map(|r| match &r.config {
            RuleConfig::MinActiveDays(c) => Some(c),
            _ => None,
        })
    }

    pub fn penalty(&self) -> Option<&PenaltyConfig> {
        self.rules.iter().find_map(|r| match &r.config {
            RuleConfig::PenaltyMissedDay(c) => Some(c),
            _ => None,
        })
    }
}

fn diagnostic(record: &RuleRecord, err: &RuleError) -> RuleDiagnostic {
    RuleDiagnostic {
        rule_id: record.id.clone(),
        rule_type: record.rule_type.clone(),
        reason: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(id: &str, rule_type: &str, config: serde_json::Value) -> RuleRecord {
        RuleRecord {
            id: id.to_string(),
            rule_type: rule_type.to_string(),
            config,
        }
    }

    #[test]
    fn test_load_typed_rules() {
        let set = RuleSet::load(&[
            record("r1", "min_distance", json!({ "minKm": 2.0 })),
            record(
                "r2",
                "tet_bonus",
                json!({
                    "tetDate": "2024-02-10",
                    "timeRange": { "start": "05:00", "end": "09:00" },
                    "minKm": 3.0,
                    "multiplier": 3.0
                }),
            ),
            record("r3", "penalty_missed_day", json!({ "penaltyPerDay": 50000 })),
        ]);

        assert_eq!(set.rules().len(), 3);
        assert!(set.skipped().is_empty());
        assert_eq!(set.rules()[0].rule_type(), RuleType::MinDistance);
        assert_eq!(set.penalty().unwrap().currency, "VND");
    }

    #[test]
    fn test_unknown_type_is_skipped() {
        let set = RuleSet::load(&[
            record("r1", "double_points_forever", json!({})),
            record("r2", "multiplier_day", json!({ "multiplierDay": 0, "multiplier": 2.0 })),
        ]);

        assert_eq!(set.rules().len(), 1);
        assert_eq!(set.skipped().len(), 1);
        assert_eq!(set.skipped()[0].rule_id, "r1");
    }

    #[test]
    fn test_invalid_bonus_is_skipped_not_fatal() {
        let set = RuleSet::load(&[record(
            "r1",
            "multiplier_day",
            json!({ "multiplierDay": 9, "multiplier": 2.0 }),
        )]);

        assert!(set.rules().is_empty());
        assert_eq!(set.skipped().len(), 1);
        assert!(set.broken_blocking().is_empty());
        assert!(!set.is_empty());
        assert!(RuleSet::load(&[]).is_empty());
    }

    #[test]
    fn test_invalid_blocking_rule_is_remembered() {
        let set = RuleSet::load(&[record(
            "r1",
            "pace_range",
            json!({ "minPace": 9.0, "maxPace": 4.0 }),
        )]);

        assert!(set.rules().is_empty());
        assert_eq!(set.broken_blocking().len(), 1);
        assert!(!set.is_empty());
    }

    #[test]
    fn test_missing_field_is_malformed() {
        let err = RuleConfig::parse(RuleType::MinDistance, &json!({ "min": 2 })).unwrap_err();
        assert!(matches!(err, RuleError::Malformed(_)));
    }

    #[test]
    fn test_badge_tiers_must_increase() {
        let err = RuleConfig::parse(
            RuleType::MinActiveDays,
            &json!({
                "requiredDays": 20,
                "badgeTiers": [
                    { "name": "gold", "minPercentage": 90.0 },
                    { "name": "silver", "minPercentage": 70.0 }
                ]
            }),
        )
        .unwrap_err();
        assert!(matches!(err, RuleError::Invalid(_)));
    }

    #[test]
    fn test_empty_lucky_list_rejected() {
        let err = RuleConfig::parse(
            RuleType::LuckyDistance,
            &json!({ "luckyDistances": [], "tolerance": 0.1 }),
        )
        .unwrap_err();
        assert!(matches!(err, RuleError::Invalid(_)));
    }

    #[test]
    fn test_bonus_priorities() {
        assert_eq!(RuleType::TetBonus.bonus_priority(), Some(3));
        assert_eq!(RuleType::LuckyDistance.bonus_priority(), Some(2));
        assert_eq!(RuleType::MultiplierDay.bonus_priority(), Some(1));
        assert_eq!(RuleType::MinDistance.bonus_priority(), None);
    }
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Blocking validators: the admission gate for an activity in one event.
//!
//! Validation is per `(activity, event)` pair. Failing here keeps the
//! activity out of this event only.

use crate::models::event::Event;
use crate::models::rule::{RuleConfig, RuleDiagnostic, RuleSet, RuleType};
use crate::models::Activity;
use serde::Serialize;

/// Result of running the blocking rules.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationOutcome {
    pub is_valid: bool,
    pub failures: Vec<Failure>,
}

impl ValidationOutcome {
    fn from_failures(failures: Vec<Failure>) -> Self {
        Self {
            is_valid: failures.is_empty(),
            failures,
        }
    }
}

/// One reason an activity was not admitted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Failure {
    /// Rule that failed, if the failure came from a configured rule
    pub rule_id: Option<String>,
    pub rule_type: Option<RuleType>,
    #[serde(flatten)]
    pub kind: FailureKind,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FailureKind {
    ZeroDistance,
    OutsideEventWindow {
        activity_date: chrono::NaiveDate,
    },
    BelowMinDistance {
        measured_km: f64,
        min_km: f64,
    },
    PaceOutOfRange {
        pace_min_per_km: f64,
        min_pace: f64,
        max_pace: f64,
    },
}

/// The event's blocking rules could not be loaded, so nothing can be admitted.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("Event has {} invalid blocking rule(s)", .0.len())]
pub struct BlockingRulesInvalid(pub Vec<RuleDiagnostic>);

/// Run all blocking rules against an activity.
pub fn validate(activity: &Activity, rules: &RuleSet) -> Result<ValidationOutcome, BlockingRulesInvalid> {
    if !rules.broken_blocking().is_empty() {
        return Err(BlockingRulesInvalid(rules.broken_blocking().to_vec()));
    }

    let mut failures = Vec::new();
    let distance_km = activity.distance_km();

    if distance_km <= 0.0 {
        failures.push(Failure {
            rule_id: None,
            rule_type: None,
            kind: FailureKind::ZeroDistance,
            reason: "Activity has no distance".to_string(),
        });
    }

    for rule in rules.rules() {
        match &rule.config {
            RuleConfig::MinDistance(config) => {
                if distance_km < config.min_km {
                    failures.push(Failure {
                        rule_id: Some(rule.id.clone()),
                        rule_type: Some(RuleType::MinDistance),
                        kind: FailureKind::BelowMinDistance {
                            measured_km: distance_km,
                            min_km: config.min_km,
                        },
                        reason: format!(
                            "Distance {:.2} km is below the minimum of {:.2} km",
                            distance_km, config.min_km
                        ),
                    });
                }
            }
            RuleConfig::PaceRange(config) => {
                // Not applicable without distance; covered by the zero-distance check.
                let Some(pace) = activity.pace_min_per_km() else {
                    continue;
                };
                if pace < config.min_pace || pace > config.max_pace {
                    failures.push(Failure {
                        rule_id: Some(rule.id.clone()),
                        rule_type: Some(RuleType::PaceRange),
                        kind: FailureKind::PaceOutOfRange {
                            pace_min_per_km: pace,
                            min_pace: config.min_pace,
                            max_pace: config.max_pace,
                        },
                        reason: format!(
                            "Pace {:.2} min/km is outside {:.2}-{:.2} min/km",
                            pace, config.min_pace, config.max_pace
                        ),
                    });
                }
            }
            RuleConfig::MinActiveDays(_)
            | RuleConfig::TetBonus(_)
            | RuleConfig::LuckyDistance(_)
            | RuleConfig::MultiplierDay(_)
            | RuleConfig::PenaltyMissedDay(_) => {}
        }
    }

    Ok(ValidationOutcome::from_failures(failures))
}

/// Blocking rules plus the event's date window.
pub fn validate_for_event(
    activity: &Activity,
    event: &Event,
) -> Result<ValidationOutcome, BlockingRulesInvalid> {
    let mut outcome = validate(activity, &event.rules)?;

    let activity_date = activity.activity_date();
    if !event.contains(activity_date) {
        outcome.failures.push(Failure {
            rule_id: None,
            rule_type: None,
            kind: FailureKind::OutsideEventWindow { activity_date },
            reason: format!(
                "Activity date {} is outside the event ({} to {})",
                activity_date, event.start_date, event.end_date
            ),
        });
        outcome.is_valid = false;
    }

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::rule::{MinDistanceConfig, PaceRangeConfig, Rule, RuleRecord};
    use chrono::NaiveDateTime;

    fn activity(meters: f64, seconds: f64) -> Activity {
        Activity {
            user_id: "u1".to_string(),
            event_id: "e1".to_string(),
            start_local: NaiveDateTime::parse_from_str("2024-01-10T06:00:00", "%Y-%m-%dT%H:%M:%S")
                .unwrap(),
            distance_meters: meters,
            moving_time_seconds: seconds,
            source_activity_id: 1,
        }
    }

    fn rules() -> RuleSet {
        RuleSet::from_rules(vec![
            Rule {
                id: "min".to_string(),
                config: RuleConfig::MinDistance(MinDistanceConfig { min_km: 2.0 }),
            },
            Rule {
                id: "pace".to_string(),
                config: RuleConfig::PaceRange(PaceRangeConfig {
                    min_pace: 4.0,
                    max_pace: 15.0,
                }),
            },
        ])
    }

    #[test]
    fn test_valid_activity_passes() {
        // 5 km in 30 min = 6 min/km
        let outcome = validate(&activity(5000.0, 1800.0), &rules()).unwrap();
        assert!(outcome.is_valid);
        assert!(outcome.failures.is_empty());
    }

    #[test]
    fn test_below_min_distance() {
        let outcome = validate(&activity(1500.0, 600.0), &rules()).unwrap();
        assert!(!outcome.is_valid);
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].rule_id.as_deref(), Some("min"));
        assert_eq!(
            outcome.failures[0].kind,
            FailureKind::BelowMinDistance {
                measured_km: 1.5,
                min_km: 2.0
            }
        );
    }

    #[test]
    fn test_pace_too_fast() {
        // 10 km in 30 min = 3 min/km, likely a ride logged as a run
        let outcome = validate(&activity(10000.0, 1800.0), &rules()).unwrap();
        assert!(!outcome.is_valid);
        assert_eq!(outcome.failures[0].rule_type, Some(RuleType::PaceRange));
        assert!(outcome.failures[0].reason.contains("3.00"));
    }

    #[test]
    fn test_pace_bounds_inclusive() {
        // exactly 15 min/km
        let outcome = validate(&activity(2000.0, 1800.0), &rules()).unwrap();
        assert!(outcome.is_valid);
    }

    #[test]
    fn test_zero_distance_never_admitted() {
        let outcome = validate(&activity(0.0, 600.0), &RuleSet::default()).unwrap();
        assert!(!outcome.is_valid);
        assert_eq!(outcome.failures[0].kind, FailureKind::ZeroDistance);

        // The pace rule does not also fire on zero distance.
        let outcome = validate(&activity(0.0, 600.0), &rules()).unwrap();
        assert!(!outcome
            .failures
            .iter()
            .any(|f| f.rule_type == Some(RuleType::PaceRange)));
    }

    #[test]
    fn test_broken_blocking_rule_aborts() {
        let set = RuleSet::load(&[RuleRecord {
            id: "bad".to_string(),
            rule_type: "min_distance".to_string(),
            config: serde_json::json!({ "minKm": "two" }),
        }]);
        let err = validate(&activity(5000.0, 1800.0), &set).unwrap_err();
        assert_eq!(err.0.len(), 1);
        assert_eq!(err.0[0].rule_id, "bad");
    }
}

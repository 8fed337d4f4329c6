// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Bonus resolution and point scoring.
//!
//! Every bonus rule is evaluated on its own; of those that qualify, exactly
//! one is applied, chosen by fixed kind priority (tet > lucky > multiplier
//! day). Bonuses never stack.

use crate::models::rule::{
    LuckyDistance, LuckyDistanceConfig, MultiplierDayConfig, Rule, RuleConfig, RuleSet,
    TetBonusConfig,
};
use crate::models::{Activity, BonusOutcome, ScoredActivity};

/// Why a Tet bonus did not apply.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TetMiss {
    #[error("Activity on {actual} is not on Tet ({tet_date})")]
    NotSameDay {
        actual: chrono::NaiveDate,
        tet_date: chrono::NaiveDate,
    },

    #[error("Start time {actual} is outside {start}-{end}")]
    OutsideTimeRange {
        actual: chrono::NaiveTime,
        start: chrono::NaiveTime,
        end: chrono::NaiveTime,
    },

    #[error("Distance {actual_km:.2} km is below the Tet minimum of {min_km:.2} km")]
    InsufficientDistance { actual_km: f64, min_km: f64 },
}

/// Score an activity against an event's rules.
pub fn score(activity: &Activity, rules: &RuleSet) -> ScoredActivity {
    let base_points = activity.distance_km();

    let mut available: Vec<BonusOutcome> = rules
        .rules()
        .iter()
        .filter_map(|rule| evaluate_bonus(activity, rule))
        .collect();

    // Stable sort: among equal priorities, rule order decides.
    available.sort_by(|a, b| b.priority.cmp(&a.priority));

    let mut available = available.into_iter();
    let applied_bonus = available.next();
    let rejected_bonuses: Vec<BonusOutcome> = available.collect();

    let multiplier = applied_bonus.as_ref().map_or(1.0, |b| b.multiplier);

    if let Some(bonus) = &applied_bonus {
        tracing::debug!(
            user_id = %activity.user_id,
            event_id = %activity.event_id,
            bonus = %bonus.bonus_type,
            rejected = rejected_bonuses.len(),
            "Bonus resolved"
        );
    }

    ScoredActivity {
        activity: activity.clone(),
        base_points,
        applied_bonus,
        final_points: base_points * multiplier,
        rejected_bonuses,
    }
}

/// Evaluate one rule as a bonus. Non-bonus rules yield `None`.
fn evaluate_bonus(activity: &Activity, rule: &Rule) -> Option<BonusOutcome> {
    match &rule.config {
        RuleConfig::TetBonus(config) => match check_tet(activity, config) {
            Ok(()) => Some(outcome(
                rule,
                "Tet Bonus",
                config.multiplier,
                format!("Happy Tet! Your run earns x{} points", config.multiplier),
            )),
            Err(miss) => {
                tracing::trace!(rule_id = %rule.id, reason = %miss, "Tet bonus not applicable");
                None
            }
        },
        RuleConfig::LuckyDistance(config) => lucky_match(activity, config).map(|entry| {
            let name = if entry.name.is_empty() {
                format!("Lucky {} km", entry.distance)
            } else {
                entry.name.clone()
            };
            let message = format!("{}! Your run earns x{} points", name, entry.multiplier);
            outcome(rule, &name, entry.multiplier, message)
        }),
        RuleConfig::MultiplierDay(config) => {
            if multiplier_day_matches(activity, config) {
                Some(outcome(
                    rule,
                    "Multiplier Day",
                    config.multiplier,
                    format!("Multiplier day! Your run earns x{} points", config.multiplier),
                ))
            } else {
                None
            }
        }
        RuleConfig::MinDistance(_)
        | RuleConfig::PaceRange(_)
        | RuleConfig::MinActiveDays(_)
        | RuleConfig::PenaltyMissedDay(_) => None,
    }
}

fn outcome(rule: &Rule, name: &str, multiplier: f64, message: String) -> BonusOutcome {
    let bonus_type = rule.rule_type();
    BonusOutcome {
        bonus_type,
        rule_id: rule.id.clone(),
        name: name.to_string(),
        multiplier,
        message,
        priority: bonus_type.bonus_priority().unwrap_or(0),
    }
}

/// All three Tet conditions must hold: date, clock window, distance.
pub fn check_tet(activity: &Activity, config: &TetBonusConfig) -> Result<(), TetMiss> {
    let actual = activity.activity_date();
    if actual != config.tet_date {
        return Err(TetMiss::NotSameDay {
            actual,
            tet_date: config.tet_date,
        });
    }

    let time = activity.local_time();
    let (start, end) = (config.time_range.start, config.time_range.end);
    if time < start || time > end {
        return Err(TetMiss::OutsideTimeRange {
            actual: time,
            start,
            end,
        });
    }

    let actual_km = activity.distance_km();
    if actual_km < config.min_km {
        return Err(TetMiss::InsufficientDistance {
            actual_km,
            min_km: config.min_km,
        });
    }

    Ok(())
}

/// First entry (in declared order) within tolerance.
pub fn lucky_match<'a>(
    activity: &Activity,
    config: &'a LuckyDistanceConfig,
) -> Option<&'a LuckyDistance> {
    let km = activity.distance_km();
    config
        .lucky_distances
        .iter()
        .find(|entry| (km - entry.distance).abs() <= config.tolerance)
}

pub fn multiplier_day_matches(activity: &Activity, config: &MultiplierDayConfig) -> bool {
    activity.weekday_from_sunday() == config.multiplier_day
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::rule::{MinDistanceConfig, RuleType, TimeRange};
    use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

    fn activity_at(start: &str, meters: f64) -> Activity {
        Activity {
            user_id: "u1".to_string(),
            event_id: "e1".to_string(),
            start_local: NaiveDateTime::parse_from_str(start, "%Y-%m-%dT%H:%M:%S").unwrap(),
            distance_meters: meters,
            moving_time_seconds: meters * 0.36,
            source_activity_id: 7,
        }
    }

    fn tet_rule() -> Rule {
        Rule {
            id: "tet".to_string(),
            config: RuleConfig::TetBonus(TetBonusConfig {
                // Saturday
                tet_date: NaiveDate::from_ymd_opt(2024, 2, 10).unwrap(),
                time_range: TimeRange {
                    start: NaiveTime::from_hms_opt(5, 0, 0).unwrap(),
                    end: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
                },
                min_km: 3.0,
                multiplier: 3.0,
            }),
        }
    }

    fn saturday_rule() -> Rule {
        Rule {
            id: "sat".to_string(),
            config: RuleConfig::MultiplierDay(MultiplierDayConfig {
                multiplier_day: 6,
                multiplier: 2.0,
            }),
        }
    }

    fn lucky_rule() -> Rule {
        Rule {
            id: "lucky".to_string(),
            config: RuleConfig::LuckyDistance(LuckyDistanceConfig {
                lucky_distances: vec![LuckyDistance {
                    distance: 5.0,
                    multiplier: 2.0,
                    name: "Lucky Five".to_string(),
                }],
                tolerance: 0.1,
            }),
        }
    }

    #[test]
    fn test_no_bonus_rules() {
        let rules = RuleSet::from_rules(vec![Rule {
            id: "min".to_string(),
            config: RuleConfig::MinDistance(MinDistanceConfig { min_km: 1.0 }),
        }]);
        let scored = score(&activity_at("2024-02-07T06:00:00", 4200.0), &rules);
        assert_eq!(scored.base_points, 4.2);
        assert_eq!(scored.final_points, 4.2);
        assert!(scored.applied_bonus.is_none());
        assert!(scored.rejected_bonuses.is_empty());
    }

    #[test]
    fn test_tet_beats_multiplier_day() {
        let rules = RuleSet::from_rules(vec![saturday_rule(), tet_rule()]);
        let scored = score(&activity_at("2024-02-10T06:30:00", 4000.0), &rules);

        let applied = scored.applied_bonus.unwrap();
        assert_eq!(applied.bonus_type, RuleType::TetBonus);
        assert_eq!(scored.final_points, 12.0);
        assert_eq!(scored.rejected_bonuses.len(), 1);
        assert_eq!(scored.rejected_bonuses[0].bonus_type, RuleType::MultiplierDay);
    }

    #[test]
    fn test_all_three_qualify_only_one_applies() {
        let rules = RuleSet::from_rules(vec![saturday_rule(), lucky_rule(), tet_rule()]);
        let scored = score(&activity_at("2024-02-10T06:30:00", 5050.0), &rules);

        assert_eq!(scored.applied_bonus.unwrap().bonus_type, RuleType::TetBonus);
        let rejected: Vec<RuleType> = scored.rejected_bonuses.iter().map(|b| b.bonus_type).collect();
        assert_eq!(rejected, vec![RuleType::LuckyDistance, RuleType::MultiplierDay]);
    }

    #[test]
    fn test_lucky_beats_multiplier_day() {
        let rules = RuleSet::from_rules(vec![saturday_rule(), lucky_rule()]);
        // Saturday, but not Tet
        let scored = score(&activity_at("2024-02-17T06:30:00", 5000.0), &rules);
        let applied = scored.applied_bonus.unwrap();
        assert_eq!(applied.bonus_type, RuleType::LuckyDistance);
        assert_eq!(applied.name, "Lucky Five");
        assert_eq!(scored.final_points, 10.0);
    }

    #[test]
    fn test_tet_miss_reasons() {
        let Rule {
            config: RuleConfig::TetBonus(config),
            ..
        } = tet_rule()
        else {
            unreachable!()
        };

        let err = check_tet(&activity_at("2024-02-09T06:00:00", 5000.0), &config).unwrap_err();
        assert!(matches!(err, TetMiss::NotSameDay { .. }));

        let err = check_tet(&activity_at("2024-02-10T09:00:01", 5000.0), &config).unwrap_err();
        assert!(matches!(err, TetMiss::OutsideTimeRange { .. }));

        let err = check_tet(&activity_at("2024-02-10T06:00:00", 2500.0), &config).unwrap_err();
        assert!(matches!(err, TetMiss::InsufficientDistance { .. }));

        // window bounds are inclusive
        assert!(check_tet(&activity_at("2024-02-10T05:00:00", 3000.0), &config).is_ok());
        assert!(check_tet(&activity_at("2024-02-10T09:00:00", 3000.0), &config).is_ok());
    }

    #[test]
    fn test_lucky_first_declared_entry_wins() {
        let config = LuckyDistanceConfig {
            lucky_distances: vec![
                LuckyDistance {
                    distance: 5.0,
                    multiplier: 2.0,
                    name: "first".to_string(),
                },
                LuckyDistance {
                    distance: 5.1,
                    multiplier: 4.0,
                    name: "second".to_string(),
                },
            ],
            tolerance: 0.1,
        };
        let entry = lucky_match(&activity_at("2024-02-07T06:00:00", 5050.0), &config).unwrap();
        assert_eq!(entry.name, "first");
    }

    #[test]
    fn test_multiplier_day_sunday_is_zero() {
        let config = MultiplierDayConfig {
            multiplier_day: 0,
            multiplier: 2.0,
        };
        assert!(multiplier_day_matches(
            &activity_at("2024-02-11T06:00:00", 3000.0),
            &config
        ));
        assert!(!multiplier_day_matches(
            &activity_at("2024-02-12T06:00:00", 3000.0),
            &config
        ));
    }

    #[test]
    fn test_two_rules_same_kind_keep_declared_order() {
        let early = Rule {
            id: "sat_early".to_string(),
            config: RuleConfig::MultiplierDay(MultiplierDayConfig {
                multiplier_day: 6,
                multiplier: 1.5,
            }),
        };
        let rules = RuleSet::from_rules(vec![early, saturday_rule()]);
        let scored = score(&activity_at("2024-02-17T06:30:00", 3000.0), &rules);
        assert_eq!(scored.applied_bonus.unwrap().rule_id, "sat_early");
        assert_eq!(scored.rejected_bonuses[0].rule_id, "sat");
    }
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Completion and missed-day penalty evaluation.
//!
//! Both evaluators are pure: they always recount from the activity dates, so
//! running them again on the same input gives the same answer.

use crate::models::rule::{BadgeTier, MinActiveDaysConfig, PenaltyConfig};
use crate::models::{CompletionResult, PenaltyResult};
use crate::time_utils::inclusive_day_count;
use chrono::NaiveDate;
use std::collections::BTreeSet;

/// Day counts shared by completion and penalty evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayCounts {
    pub total_days: u32,
    pub active_days: u32,
    pub missed_days: u32,
}

/// Count distinct activity dates inside `[event_start, event_end]`.
pub fn count_days<I>(dates: I, event_start: NaiveDate, event_end: NaiveDate) -> DayCounts
where
    I: IntoIterator<Item = NaiveDate>,
{
    let total_days = inclusive_day_count(event_start, event_end);
    let active: BTreeSet<NaiveDate> = dates
        .into_iter()
        .filter(|d| event_start <= *d && *d <= event_end)
        .collect();
    let active_days = active.len() as u32;

    DayCounts {
        total_days,
        active_days,
        missed_days: total_days.saturating_sub(active_days),
    }
}

/// Evaluate a minimum-active-days rule.
///
/// A participant is valid when `active_days >= required_days - grace_days`.
pub fn evaluate_completion<I>(
    dates: I,
    event_start: NaiveDate,
    event_end: NaiveDate,
    rule: &MinActiveDaysConfig,
) -> CompletionResult
where
    I: IntoIterator<Item = NaiveDate>,
{
    let counts = count_days(dates, event_start, event_end);
    let completion_percentage = if counts.total_days == 0 {
        0.0
    } else {
        counts.active_days as f64 * 100.0 / counts.total_days as f64
    };

    CompletionResult {
        active_days: counts.active_days,
        total_days: counts.total_days,
        required_days: rule.required_days,
        grace_days: rule.grace_days,
        missed_days: counts.missed_days,
        completion_percentage,
        is_valid: counts.active_days.saturating_add(rule.grace_days) >= rule.required_days,
        badge: badge_for(completion_percentage, &rule.badge_tiers),
    }
}

/// Highest tier whose threshold the percentage reaches.
pub fn badge_for(completion_percentage: f64, tiers: &[BadgeTier]) -> Option<String> {
    tiers
        .iter()
        .rev()
        .find(|tier| completion_percentage >= tier.min_percentage)
        .map(|tier| tier.name.clone())
}

/// Evaluate a per-missed-day penalty rule.
pub fn evaluate_penalty<I>(
    dates: I,
    event_start: NaiveDate,
    event_end: NaiveDate,
    rule: &PenaltyConfig,
) -> PenaltyResult
where
    I: IntoIterator<Item = NaiveDate>,
{
    let counts = count_days(dates, event_start, event_end);

    PenaltyResult {
        total_days: counts.total_days,
        active_days: counts.active_days,
        missed_days: counts.missed_days,
        penalty_per_day: rule.penalty_per_day,
        penalty_amount: u64::from(counts.missed_days).saturating_mul(rule.penalty_per_day),
        currency: rule.currency.clone(),
    }
}

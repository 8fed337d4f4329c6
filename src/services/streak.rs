// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Consecutive-day streaks derived from activity dates.

use chrono::NaiveDate;
use std::collections::BTreeSet;

/// Streak counters for a set of activity dates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreakCounts {
    pub current_streak: u32,
    pub longest_streak: u32,
    pub total_active_days: u32,
}

/// Compute streaks from activity dates (duplicates and order don't matter).
///
/// `current_streak` is the run ending at the most recent date in the input,
/// not relative to today.
pub fn compute_streak<I>(dates: I) -> StreakCounts
where
    I: IntoIterator<Item = NaiveDate>,
{
    let distinct: BTreeSet<NaiveDate> = dates.into_iter().collect();
    if distinct.is_empty() {
        return StreakCounts::default();
    }

    let mut running = 1u32;
    let mut longest = 1u32;
    let mut previous: Option<NaiveDate> = None;

    for date in &distinct {
        if let Some(prev) = previous {
            if (*date - prev).num_days() == 1 {
                running += 1;
                longest = longest.max(running);
            } else {
                running = 1;
            }
        }
        previous = Some(*date);
    }

    StreakCounts {
        current_streak: running,
        longest_streak: longest,
        total_active_days: distinct.len() as u32,
    }
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Standings aggregation and leaderboard ranking.

use crate::models::{
    LeaderboardEntry, Leaderboards, ParticipantStanding, ScoredActivity, StreakState,
};
use crate::services::streak::compute_streak;
use std::collections::{BTreeSet, HashMap};

/// Recompute a participant's totals from all of their scored activities.
pub fn aggregate(user_id: &str, event_id: &str, activities: &[ScoredActivity]) -> ParticipantStanding {
    let active_days: BTreeSet<_> = activities.iter().map(|a| a.activity_date()).collect();

    ParticipantStanding {
        user_id: user_id.to_string(),
        event_id: event_id.to_string(),
        total_km: activities.iter().map(|a| a.activity.distance_km()).sum(),
        total_points: activities.iter().map(|a| a.final_points).sum(),
        active_day_count: active_days.len() as u32,
    }
}

/// Recompute a participant's streaks from all of their scored activities.
pub fn streak_state(user_id: &str, event_id: &str, activities: &[ScoredActivity]) -> StreakState {
    let counts = compute_streak(activities.iter().map(|a| a.activity_date()));
    StreakState {
        user_id: user_id.to_string(),
        event_id: event_id.to_string(),
        current_streak: counts.current_streak,
        longest_streak: counts.longest_streak,
        total_active_days: counts.total_active_days,
    }
}

/// Build both leaderboards from the same standings.
///
/// Ordering is total (ties fall back to user id) so identical input always
/// gives identical output. Ranks use competition numbering: 1, 1, 3.
pub fn rank(
    standings: &[ParticipantStanding],
    streaks: &[StreakState],
    display_names: &HashMap<String, String>,
) -> Leaderboards {
    let streaks_by_user: HashMap<&str, &StreakState> =
        streaks.iter().map(|s| (s.user_id.as_str(), s)).collect();

    let entries: Vec<LeaderboardEntry> = standings
        .iter()
        .map(|standing| {
            let streak = streaks_by_user.get(standing.user_id.as_str());
            LeaderboardEntry {
                user_id: standing.user_id.clone(),
                display_name: display_names
                    .get(&standing.user_id)
                    .cloned()
                    .unwrap_or_else(|| standing.user_id.clone()),
                total_km: standing.total_km,
                total_points: standing.total_points,
                active_days: standing.active_day_count,
                longest_streak: streak.map_or(0, |s| s.longest_streak),
                current_streak: streak.map_or(0, |s| s.current_streak),
                rank: 0,
            }
        })
        .collect();

    let mut endurance = entries.clone();
    endurance.sort_by(|a, b| {
        b.total_km
            .total_cmp(&a.total_km)
            .then_with(|| a.user_id.cmp(&b.user_id))
    });
    assign_ranks(&mut endurance, |a, b| a.total_km == b.total_km);

    let mut consistency: Vec<LeaderboardEntry> =
        entries.into_iter().filter(|e| e.longest_streak > 0).collect();
    consistency.sort_by(|a, b| {
        b.longest_streak
            .cmp(&a.longest_streak)
            .then_with(|| a.user_id.cmp(&b.user_id))
    });
    assign_ranks(&mut consistency, |a, b| a.longest_streak == b.longest_streak);

    Leaderboards {
        endurance,
        consistency,
    }
}

/// Standard competition ranking over an already sorted list.
fn assign_ranks<F>(entries: &mut [LeaderboardEntry], tied: F)
where
    F: Fn(&LeaderboardEntry, &LeaderboardEntry) -> bool,
{
    for i in 0..entries.len() {
        let rank = if i > 0 && tied(&entries[i - 1], &entries[i]) {
            entries[i - 1].rank
        } else {
            i as u32 + 1
        };
        entries[i].rank = rank;
    }
}

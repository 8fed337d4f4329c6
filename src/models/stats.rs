//! Per-participant aggregates and leaderboard rows.
//!
//! These are always recomputed from the full activity set of a
//! participant, never incremented, so replays and edits cannot drift them.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Totals for one participant in one event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParticipantStanding {
    pub user_id: String,
    pub event_id: String,
    pub total_km: f64,
    pub total_points: f64,
    /// Distinct activity dates
    pub active_day_count: u32,
}

/// Consecutive-day runs for one participant in one event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakState {
    pub user_id: String,
    pub event_id: String,
    /// Run ending at the latest recorded activity date
    pub current_streak: u32,
    pub longest_streak: u32,
    pub total_active_days: u32,
}

/// One row of a leaderboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct LeaderboardEntry {
    pub user_id: String,
    pub display_name: String,
    pub total_km: f64,
    pub total_points: f64,
    pub active_days: u32,
    pub longest_streak: u32,
    pub current_streak: u32,
    pub rank: u32,
}

/// The two independently ranked views of the same standings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Leaderboards {
    /// By total distance
    pub endurance: Vec<LeaderboardEntry>,
    /// By longest streak; participants without a streak are left out
    pub consistency: Vec<LeaderboardEntry>,
}

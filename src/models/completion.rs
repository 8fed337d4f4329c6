// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! End-of-event completion and penalty models.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Outcome of evaluating a minimum-active-days rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CompletionResult {
    pub active_days: u32,
    pub total_days: u32,
    pub required_days: u32,
    pub grace_days: u32,
    pub missed_days: u32,
    pub completion_percentage: f64,
    pub is_valid: bool,
    pub badge: Option<String>,
}

/// Outcome of evaluating a missed-day penalty rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct PenaltyResult {
    pub total_days: u32,
    pub active_days: u32,
    pub missed_days: u32,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub penalty_per_day: u64,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub penalty_amount: u64,
    pub currency: String,
}

/// Stored completion for a participant who met the requirement.
///
/// Keyed by `(event_id, user_id)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRecord {
    pub user_id: String,
    pub event_id: String,
    pub active_days: u32,
    pub total_days: u32,
    pub required_days: u32,
    pub grace_days: u32,
    pub missed_days: u32,
    pub completion_percentage: f64,
    pub is_completed: bool,
    pub badge: Option<String>,
    /// Last day of the event (ISO 8601 date)
    pub completed_at: String,
}

/// Stored penalty for a participant.
///
/// Keyed by `(event_id, user_id)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PenaltyRecord {
    pub user_id: String,
    pub event_id: String,
    pub total_days: u32,
    pub active_days: u32,
    pub missed_days: u32,
    pub penalty_amount: u64,
    pub currency: String,
    pub is_paid: bool,
}

/// On-demand status of one participant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ParticipantStatus {
    pub user_id: String,
    pub event_id: String,
    pub event_ended: bool,
    pub completion: Option<CompletionResult>,
    pub penalty: Option<PenaltyResult>,
}

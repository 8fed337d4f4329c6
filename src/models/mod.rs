// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod activity;
pub mod completion;
pub mod event;
pub mod rule;
pub mod stats;

pub use activity::{Activity, BonusOutcome, InboundActivity, IngestError, ScoredActivity};
pub use completion::{
    CompletionRecord, CompletionResult, ParticipantStatus, PenaltyRecord, PenaltyResult,
};
pub use event::{Event, EventDefinition, EventError, Participant};
pub use rule::{Rule, RuleConfig, RuleDiagnostic, RuleRecord, RuleSet, RuleType};
pub use stats::{LeaderboardEntry, Leaderboards, ParticipantStanding, StreakState};

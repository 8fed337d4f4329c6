// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod bonus;
pub mod completion;
pub mod engine;
pub mod notify;
pub mod rate_limit;
pub mod standings;
pub mod streak;
pub mod validation;

pub use engine::{EngineError, EventOutcome, ProcessResult, ScoringEngine};
pub use notify::{BonusAppliedIntent, ChannelNotifier, LogNotifier, Notifier};
pub use rate_limit::IngestRateLimiter;

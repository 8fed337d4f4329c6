// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Scoring engine.
//!
//! Handles the core workflow for an inbound activity:
//! 1. Check the record (sport type, corrupt values, start time)
//! 2. For every event the user participates in: validate, score, upsert
//! 3. Recompute the participant's standing and streak from all activities
//! 4. Emit a "bonus applied" intent once the write is done
//!
//! Completion and penalty evaluation run on demand or at event end.

use crate::db::{RecordStore, StoreError};
use crate::models::rule::MinActiveDaysConfig;
use crate::models::{
    CompletionRecord, CompletionResult, Event, EventDefinition, EventError, InboundActivity,
    IngestError, Leaderboards, Participant, ParticipantStanding, ParticipantStatus, PenaltyRecord,
    PenaltyResult, RuleDiagnostic, ScoredActivity,
};
use crate::services::completion::{evaluate_completion, evaluate_penalty};
use crate::services::notify::{BonusAppliedIntent, Notifier};
use crate::services::validation::{validate_for_event, BlockingRulesInvalid, Failure};
use crate::services::{bonus, standings};
use chrono::NaiveDate;
use dashmap::DashMap;
use futures_util::stream::{self, StreamExt};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Events processed concurrently for one inbound activity.
const MAX_CONCURRENT_EVENTS: usize = 8;

/// One lock per `(event_id, user_id)`; upsert + recompute run under it.
pub type PairLocks = Arc<DashMap<(String, String), Arc<Mutex<()>>>>;

/// Errors the engine surfaces to its caller.
///
/// Rejections and skipped events are outcomes, not errors.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("{0} not found")]
    NotFound(String),

    #[error(transparent)]
    InvalidEvent(#[from] EventError),

    #[error(transparent)]
    Ingest(#[from] IngestError),

    #[error("Event {event_id} has not ended (last day {end_date})")]
    EventNotEnded {
        event_id: String,
        end_date: NaiveDate,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type EngineResult<T> = std::result::Result<T, EngineError>;

// ─── Outcomes ────────────────────────────────────────────────────

/// What happened to an activity in one event.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum EventOutcome {
    Admitted {
        scored: ScoredActivity,
        /// An activity for the same date was already stored
        replaced: bool,
    },
    Rejected {
        failures: Vec<Failure>,
    },
    /// Nothing to do for this event
    Skipped {
        reason: String,
    },
    /// The event's blocking rules are unusable
    Failed {
        diagnostics: Vec<RuleDiagnostic>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventResult {
    pub event_id: String,
    #[serde(flatten)]
    pub outcome: EventOutcome,
}

/// Result of processing an inbound activity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessResult {
    pub source_activity_id: u64,
    pub user_id: String,
    /// Set when the record itself was not accepted (e.g. a bike ride)
    pub rejection: Option<String>,
    /// Per-event outcomes, ordered by event id
    pub events: Vec<EventResult>,
}

/// Summary of an end-of-event evaluation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinalizeSummary {
    pub event_id: String,
    pub participants: usize,
    pub completed: usize,
    pub penalized: usize,
}

// ─── Engine ──────────────────────────────────────────────────────

/// Activity scoring and standings engine.
pub struct ScoringEngine {
    store: Arc<dyn RecordStore>,
    notifier: Arc<dyn Notifier>,
    locks: PairLocks,
}

impl ScoringEngine {
    pub fn new(store: Arc<dyn RecordStore>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            store,
            notifier,
            locks: Arc::new(DashMap::new()),
        }
    }

    pub fn store(&self) -> &Arc<dyn RecordStore> {
        &self.store
    }

    /// Run `f` while holding the lock for one (event, user) pair.
    ///
    /// The lock entry is dropped again once no other task holds or awaits it.
    async fn with_pair_lock<T>(&self, event_id: &str, user_id: &str, f: impl FnOnce() -> T) -> T {
        let key = (event_id.to_string(), user_id.to_string());
        let lock = self
            .locks
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();

        let result = {
            let _guard = lock.lock().await;
            f()
        };

        drop(lock);
        self.locks.remove_if(&key, |_, l| Arc::strong_count(l) == 1);
        result
    }

    #[cfg(test)]
    fn tracked_pairs(&self) -> usize {
        self.locks.len()
    }

    // ─── Events & Participants ───────────────────────────────────

    /// Create or replace an event, loading its rules once.
    ///
    /// Stored activities of existing participants are brought in line with
    /// the new definition: days outside the window are dropped, the rest are
    /// re-scored against the new bonus rules, and standings are recomputed.
    pub async fn upsert_event(
        &self,
        event_id: &str,
        definition: EventDefinition,
    ) -> EngineResult<Event> {
        let event = Event::from_definition(event_id, definition)?;

        tracing::info!(
            event_id,
            rules = event.rules.rules().len(),
            skipped = event.rules.skipped().len(),
            broken_blocking = event.rules.broken_blocking().len(),
            "Event stored"
        );

        self.store.upsert_event(event.clone())?;

        for participant in self.store.participants(event_id)? {
            self.with_pair_lock(event_id, &participant.user_id, || {
                self.rescore(&event, &participant.user_id)
            })
            .await?;
        }
        Ok(event)
    }

    /// Caller must hold the pair lock.
    fn rescore(&self, event: &Event, user_id: &str) -> EngineResult<()> {
        let activities = self.store.activities(&event.id, user_id)?;
        if activities.is_empty() {
            return Ok(());
        }

        let mut dropped = 0;
        for stored in activities {
            let activity_date = stored.activity_date();
            if !event.contains(activity_date) {
                self.store.remove_activity(&event.id, user_id, activity_date)?;
                dropped += 1;
                continue;
            }
            let scored = bonus::score(&stored.activity, &event.rules);
            if scored != stored {
                self.store.upsert_activity(scored)?;
            }
        }

        if dropped > 0 {
            tracing::info!(
                event_id = %event.id,
                user_id,
                dropped,
                "Activities outside the event window dropped"
            );
        }
        self.recompute(&event.id, user_id)
    }

    pub fn add_participant(&self, participant: Participant) -> EngineResult<()> {
        self.require_event(&participant.event_id)?;
        tracing::info!(
            event_id = %participant.event_id,
            user_id = %participant.user_id,
            "Participant registered"
        );
        self.store.upsert_participant(participant)?;
        Ok(())
    }

    fn require_event(&self, event_id: &str) -> EngineResult<Event> {
        self.store
            .get_event(event_id)?
            .ok_or_else(|| EngineError::NotFound(format!("Event {}", event_id)))
    }

    fn require_participant(&self, event_id: &str, user_id: &str) -> EngineResult<Participant> {
        self.store
            .get_participant(event_id, user_id)?
            .ok_or_else(|| {
                EngineError::NotFound(format!("Participant {} in event {}", user_id, event_id))
            })
    }

    // ─── Activity admission ──────────────────────────────────────

    /// Process an inbound activity for every event its user participates in.
    ///
    /// Safe to replay: the stored activity for a date is replaced, and all
    /// derived records are recomputed from scratch.
    pub async fn process_activity(&self, inbound: &InboundActivity) -> EngineResult<ProcessResult> {
        tracing::info!(
            user_id = %inbound.user_id,
            source_activity_id = inbound.source_activity_id,
            sport_type = %inbound.sport_type,
            "Processing activity"
        );

        let mut result = ProcessResult {
            source_activity_id: inbound.source_activity_id,
            user_id: inbound.user_id.clone(),
            rejection: None,
            events: Vec::new(),
        };

        match inbound.check() {
            Ok(_) => {}
            Err(e) if e.is_rejection() => {
                tracing::info!(
                    user_id = %inbound.user_id,
                    source_activity_id = inbound.source_activity_id,
                    reason = %e,
                    "Activity rejected"
                );
                result.rejection = Some(e.to_string());
                return Ok(result);
            }
            Err(e) => return Err(e.into()),
        }

        let events = self.store.events_for_user(&inbound.user_id)?;
        if events.is_empty() {
            tracing::debug!(user_id = %inbound.user_id, "User is in no events");
        }

        let mut outcomes = stream::iter(events)
            .map(|event| self.process_for_event(inbound, event))
            .buffer_unordered(MAX_CONCURRENT_EVENTS)
            .collect::<Vec<EngineResult<EventResult>>>()
            .await
            .into_iter()
            .collect::<EngineResult<Vec<EventResult>>>()?;

        outcomes.sort_by(|a, b| a.event_id.cmp(&b.event_id));
        result.events = outcomes;
        Ok(result)
    }

    async fn process_for_event(
        &self,
        inbound: &InboundActivity,
        event: Event,
    ) -> EngineResult<EventResult> {
        let outcome = self.admit(inbound, &event).await?;
        Ok(EventResult {
            event_id: event.id,
            outcome,
        })
    }

    async fn admit(&self, inbound: &InboundActivity, event: &Event) -> EngineResult<EventOutcome> {
        if event.rules.is_empty() {
            tracing::debug!(event_id = %event.id, "Event has no rules, skipping");
            return Ok(EventOutcome::Skipped {
                reason: "Event has no rules".to_string(),
            });
        }

        let activity = inbound.canonicalize(&event.id)?;
        let activity_date = activity.activity_date();

        let validation = match validate_for_event(&activity, event) {
            Ok(validation) => validation,
            Err(BlockingRulesInvalid(diagnostics)) => {
                tracing::error!(
                    event_id = %event.id,
                    user_id = %activity.user_id,
                    broken = diagnostics.len(),
                    "Admission aborted: invalid blocking rules"
                );
                return Ok(EventOutcome::Failed { diagnostics });
            }
        };

        if !validation.is_valid {
            tracing::info!(
                event_id = %event.id,
                user_id = %activity.user_id,
                %activity_date,
                failures = validation.failures.len(),
                "Activity not admitted"
            );
            return Ok(EventOutcome::Rejected {
                failures: validation.failures,
            });
        }

        let scored = bonus::score(&activity, &event.rules);

        let previous = self
            .with_pair_lock(&event.id, &activity.user_id, || {
                let previous = self.store.upsert_activity(scored.clone())?;
                self.recompute(&event.id, &activity.user_id)?;
                Ok::<_, EngineError>(previous)
            })
            .await?;

        tracing::info!(
            event_id = %event.id,
            user_id = %activity.user_id,
            %activity_date,
            final_points = scored.final_points,
            replaced = previous.is_some(),
            "Activity admitted"
        );

        // A replay of the same activity has nothing new to announce.
        if let Some(bonus) = &scored.applied_bonus {
            if previous.as_ref() != Some(&scored) {
                self.notifier.notify(BonusAppliedIntent {
                    user_id: activity.user_id.clone(),
                    event_id: event.id.clone(),
                    message: bonus.message.clone(),
                    final_points: scored.final_points,
                });
            }
        }

        Ok(EventOutcome::Admitted {
            scored,
            replaced: previous.is_some(),
        })
    }

    /// Rebuild standing and streak from the participant's full activity set.
    ///
    /// Caller must hold the pair lock.
    fn recompute(&self, event_id: &str, user_id: &str) -> EngineResult<()> {
        let activities = self.store.activities(event_id, user_id)?;
        let standing = standings::aggregate(user_id, event_id, &activities);
        let streak = standings::streak_state(user_id, event_id, &activities);

        tracing::debug!(
            event_id,
            user_id,
            total_km = standing.total_km,
            total_points = standing.total_points,
            longest_streak = streak.longest_streak,
            "Standings recomputed"
        );

        self.store.set_standing(standing)?;
        self.store.set_streak(streak)?;
        Ok(())
    }

    /// Remove the activity stored for `date` and recompute.
    ///
    /// Returns `false` if there was nothing to remove.
    pub async fn remove_activity(
        &self,
        event_id: &str,
        user_id: &str,
        date: NaiveDate,
    ) -> EngineResult<bool> {
        self.require_event(event_id)?;

        self.with_pair_lock(event_id, user_id, || {
            let removed = self.store.remove_activity(event_id, user_id, date)?;
            if removed {
                self.recompute(event_id, user_id)?;
                tracing::info!(event_id, user_id, activity_date = %date, "Activity removed");
            } else {
                tracing::debug!(event_id, user_id, activity_date = %date, "No activity to remove");
            }
            Ok::<_, EngineError>(removed)
        })
        .await
    }

    // ─── Standings ───────────────────────────────────────────────

    /// Both leaderboards for an event.
    ///
    /// Every participant is listed; one without activities has a zero
    /// standing (and so is left off the consistency board).
    pub fn leaderboard(&self, event_id: &str) -> EngineResult<Leaderboards> {
        self.require_event(event_id)?;

        let participants = self.store.participants(event_id)?;
        let mut stored: HashMap<String, ParticipantStanding> = self
            .store
            .standings(event_id)?
            .into_iter()
            .map(|s| (s.user_id.clone(), s))
            .collect();

        let rows: Vec<ParticipantStanding> = participants
            .iter()
            .map(|p| {
                stored.remove(&p.user_id).unwrap_or_else(|| ParticipantStanding {
                    user_id: p.user_id.clone(),
                    event_id: event_id.to_string(),
                    ..Default::default()
                })
            })
            .collect();
        let display_names: HashMap<String, String> = participants
            .into_iter()
            .map(|p| (p.user_id, p.display_name))
            .collect();

        let streaks = self.store.streaks(event_id)?;
        Ok(standings::rank(&rows, &streaks, &display_names))
    }

    // ─── Completion & Penalty ────────────────────────────────────

    /// Evaluate a participant's completion and penalty.
    ///
    /// Results are persisted only once the event has ended.
    pub async fn participant_status(
        &self,
        event_id: &str,
        user_id: &str,
        today: NaiveDate,
    ) -> EngineResult<ParticipantStatus> {
        let event = self.require_event(event_id)?;
        self.require_participant(event_id, user_id)?;

        let event_ended = event.has_ended(today);
        let (completion, penalty) = if event_ended {
            self.with_pair_lock(event_id, user_id, || {
                let results = self.evaluate(&event, user_id)?;
                self.persist(&event, user_id, &results.0, results.1.as_ref())?;
                Ok::<_, EngineError>(results)
            })
            .await?
        } else {
            self.evaluate(&event, user_id)?
        };

        Ok(ParticipantStatus {
            user_id: user_id.to_string(),
            event_id: event_id.to_string(),
            event_ended,
            completion: Some(completion),
            penalty,
        })
    }

    /// Evaluate and store completion and penalty for every participant.
    ///
    /// Idempotent: running it again rewrites the same records.
    pub async fn finalize_event(
        &self,
        event_id: &str,
        today: NaiveDate,
    ) -> EngineResult<FinalizeSummary> {
        let event = self.require_event(event_id)?;
        if !event.has_ended(today) {
            return Err(EngineError::EventNotEnded {
                event_id: event_id.to_string(),
                end_date: event.end_date,
            });
        }

        let participants = self.store.participants(event_id)?;
        let mut summary = FinalizeSummary {
            event_id: event_id.to_string(),
            participants: participants.len(),
            completed: 0,
            penalized: 0,
        };

        for participant in &participants {
            let (completion, penalty) = self
                .with_pair_lock(event_id, &participant.user_id, || {
                    let results = self.evaluate(&event, &participant.user_id)?;
                    self.persist(&event, &participant.user_id, &results.0, results.1.as_ref())?;
                    Ok::<_, EngineError>(results)
                })
                .await?;

            if completion.is_valid {
                summary.completed += 1;
            }
            if penalty.as_ref().is_some_and(|p| p.penalty_amount > 0) {
                summary.penalized += 1;
            }
        }

        tracing::info!(
            event_id,
            participants = summary.participants,
            completed = summary.completed,
            penalized = summary.penalized,
            "Event finalized"
        );
        Ok(summary)
    }

    fn evaluate(
        &self,
        event: &Event,
        user_id: &str,
    ) -> EngineResult<(CompletionResult, Option<PenaltyResult>)> {
        let dates: Vec<NaiveDate> = self
            .store
            .activities(&event.id, user_id)?
            .iter()
            .map(|a| a.activity_date())
            .collect();

        // Without a minimum-active-days rule every participant completes.
        let default_rule = MinActiveDaysConfig::default();
        let rule = event.rules.min_active_days().unwrap_or(&default_rule);
        let completion = evaluate_completion(
            dates.iter().copied(),
            event.start_date,
            event.end_date,
            rule,
        );
        let penalty = event.rules.penalty().map(|config| {
            evaluate_penalty(dates.iter().copied(), event.start_date, event.end_date, config)
        });

        Ok((completion, penalty))
    }

    fn persist(
        &self,
        event: &Event,
        user_id: &str,
        completion: &CompletionResult,
        penalty: Option<&PenaltyResult>,
    ) -> EngineResult<()> {
        if completion.is_valid {
            self.store.upsert_completion(CompletionRecord {
                user_id: user_id.to_string(),
                event_id: event.id.clone(),
                active_days: completion.active_days,
                total_days: completion.total_days,
                required_days: completion.required_days,
                grace_days: completion.grace_days,
                missed_days: completion.missed_days,
                completion_percentage: completion.completion_percentage,
                is_completed: true,
                badge: completion.badge.clone(),
                completed_at: event.end_date.to_string(),
            })?;
        } else if self.store.remove_completion(&event.id, user_id)? {
            tracing::info!(event_id = %event.id, user_id, "Completion withdrawn");
        }

        if let Some(penalty) = penalty {
            let is_paid = self
                .store
                .get_penalty(&event.id, user_id)?
                .is_some_and(|existing| existing.is_paid);
            self.store.upsert_penalty(PenaltyRecord {
                user_id: user_id.to_string(),
                event_id: event.id.clone(),
                total_days: penalty.total_days,
                active_days: penalty.active_days,
                missed_days: penalty.missed_days,
                penalty_amount: penalty.penalty_amount,
                currency: penalty.currency.clone(),
                is_paid,
            })?;
        }

        tracing::debug!(
            event_id = %event.id,
            user_id,
            is_valid = completion.is_valid,
            penalty_amount = penalty.map_or(0, |p| p.penalty_amount),
            "Completion evaluated"
        );
        Ok(())
    }
}

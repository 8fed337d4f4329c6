// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-memory record store backed by `DashMap`.
//!
//! Provides typed operations for:
//! - Events and participants
//! - Activities (one per participant per activity date)
//! - Standings, streaks, completion and penalty records

use crate::db::{RecordStore, StoreResult};
use crate::models::{
    CompletionRecord, Event, Participant, ParticipantStanding, PenaltyRecord, ScoredActivity,
    StreakState,
};
use chrono::NaiveDate;
use dashmap::DashMap;
use std::collections::BTreeMap;
use std::sync::Arc;

/// `(event_id, user_id)`
type ParticipantKey = (String, String);

fn key(event_id: &str, user_id: &str) -> ParticipantKey {
    (event_id.to_string(), user_id.to_string())
}

/// Shared in-memory store. Clones share the same underlying maps.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    events: DashMap<String, Event>,
    participants: DashMap<ParticipantKey, Participant>,
    activities: DashMap<ParticipantKey, BTreeMap<NaiveDate, ScoredActivity>>,
    standings: DashMap<ParticipantKey, ParticipantStanding>,
    streaks: DashMap<ParticipantKey, StreakState>,
    completions: DashMap<ParticipantKey, CompletionRecord>,
    penalties: DashMap<ParticipantKey, PenaltyRecord>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect values of a participant-keyed map for one event, ordered by user id.
    fn by_event<T: Clone>(map: &DashMap<ParticipantKey, T>, event_id: &str) -> Vec<T> {
        let mut rows: Vec<(String, T)> = map
            .iter()
            .filter(|entry| entry.key().0 == event_id)
            .map(|entry| (entry.key().1.clone(), entry.value().clone()))
            .collect();
        rows.sort_by(|a, b| a.0.cmp(&b.0));
        rows.into_iter().map(|(_, v)| v).collect()
    }
}

impl RecordStore for MemoryStore {
    // ─── Events & Participants ───────────────────────────────────

    fn upsert_event(&self, event: Event) -> StoreResult<()> {
        self.inner.events.insert(event.id.clone(), event);
        Ok(())
    }

    fn get_event(&self, event_id: &str) -> StoreResult<Option<Event>> {
        Ok(self.inner.events.get(event_id).map(|e| e.value().clone()))
    }

    fn upsert_participant(&self, participant: Participant) -> StoreResult<()> {
        self.inner.participants.insert(
            key(&participant.event_id, &participant.user_id),
            participant,
        );
        Ok(())
    }

    fn get_participant(&self, event_id: &str, user_id: &str) -> StoreResult<Option<Participant>> {
        Ok(self
            .inner
            .participants
            .get(&key(event_id, user_id))
            .map(|p| p.value().clone()))
    }

    fn participants(&self, event_id: &str) -> StoreResult<Vec<Participant>> {
        Ok(Self::by_event(&self.inner.participants, event_id))
    }

    fn events_for_user(&self, user_id: &str) -> StoreResult<Vec<Event>> {
        let mut event_ids: Vec<String> = self
            .inner
            .participants
            .iter()
            .filter(|entry| entry.key().1 == user_id)
            .map(|entry| entry.key().0.clone())
            .collect();
        event_ids.sort();

        Ok(event_ids
            .iter()
            .filter_map(|id| self.inner.events.get(id).map(|e| e.value().clone()))
            .collect())
    }

    // ─── Activities ──────────────────────────────────────────────

    fn upsert_activity(&self, activity: ScoredActivity) -> StoreResult<Option<ScoredActivity>> {
        let date = activity.activity_date();
        let mut by_date = self
            .inner
            .activities
            .entry(key(&activity.activity.event_id, &activity.activity.user_id))
            .or_default();
        Ok(by_date.insert(date, activity))
    }

    fn remove_activity(&self, event_id: &str, user_id: &str, date: NaiveDate) -> StoreResult<bool> {
        Ok(self
            .inner
            .activities
            .get_mut(&key(event_id, user_id))
            .is_some_and(|mut by_date| by_date.remove(&date).is_some()))
    }

    fn activities(&self, event_id: &str, user_id: &str) -> StoreResult<Vec<ScoredActivity>> {
        Ok(self
            .inner
            .activities
            .get(&key(event_id, user_id))
            .map(|by_date| by_date.values().cloned().collect())
            .unwrap_or_default())
    }

    // ─── Derived records ─────────────────────────────────────────

    fn set_standing(&self, standing: ParticipantStanding) -> StoreResult<()> {
        self.inner
            .standings
            .insert(key(&standing.event_id, &standing.user_id), standing);
        Ok(())
    }

    fn standings(&self, event_id: &str) -> StoreResult<Vec<ParticipantStanding>> {
        Ok(Self::by_event(&self.inner.standings, event_id))
    }

    fn set_streak(&self, streak: StreakState) -> StoreResult<()> {
        self.inner
            .streaks
            .insert(key(&streak.event_id, &streak.user_id), streak);
        Ok(())
    }

    fn streaks(&self, event_id: &str) -> StoreResult<Vec<StreakState>> {
        Ok(Self::by_event(&self.inner.streaks, event_id))
    }

    fn upsert_completion(&self, record: CompletionRecord) -> StoreResult<()> {
        self.inner
            .completions
            .insert(key(&record.event_id, &record.user_id), record);
        Ok(())
    }

    fn get_completion(&self, event_id: &str, user_id: &str) -> StoreResult<Option<CompletionRecord>> {
        Ok(self
            .inner
            .completions
            .get(&key(event_id, user_id))
            .map(|r| r.value().clone()))
    }

    fn remove_completion(&self, event_id: &str, user_id: &str) -> StoreResult<bool> {
        Ok(self
            .inner
            .completions
            .remove(&key(event_id, user_id))
            .is_some())
    }

    fn upsert_penalty(&self, record: PenaltyRecord) -> StoreResult<()> {
        self.inner
            .penalties
            .insert(key(&record.event_id, &record.user_id), record);
        Ok(())
    }

    fn get_penalty(&self, event_id: &str, user_id: &str) -> StoreResult<Option<PenaltyRecord>> {
        Ok(self
            .inner
            .penalties
            .get(&key(event_id, user_id))
            .map(|r| r.value().clone()))
    }
}

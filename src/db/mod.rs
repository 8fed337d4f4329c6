//! Record store for events, participants, activities, and derived results.
//!
//! The engine only needs the [`RecordStore`] trait; [`MemoryStore`] is the
//! in-process implementation used by the server and tests.

pub mod memory;

pub use memory::MemoryStore;

use crate::models::{
    CompletionRecord, Event, Participant, ParticipantStanding, PenaltyRecord, ScoredActivity,
    StreakState,
};
use chrono::NaiveDate;

/// Storage errors surfaced by a record store backend.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("Corrupt record: {0}")]
    Corrupt(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Abstract record store.
///
/// Activities are keyed by `(event_id, user_id, activity_date)`; derived
/// records by `(event_id, user_id)`. All writes are upserts.
pub trait RecordStore: Send + Sync {
    // ─── Events & Participants ───────────────────────────────────

    fn upsert_event(&self, event: Event) -> StoreResult<()>;
    fn get_event(&self, event_id: &str) -> StoreResult<Option<Event>>;
    fn upsert_participant(&self, participant: Participant) -> StoreResult<()>;
    fn get_participant(&self, event_id: &str, user_id: &str) -> StoreResult<Option<Participant>>;
    fn participants(&self, event_id: &str) -> StoreResult<Vec<Participant>>;
    /// Events the user is registered in.
    fn events_for_user(&self, user_id: &str) -> StoreResult<Vec<Event>>;

    // ─── Activities ──────────────────────────────────────────────

    /// Insert or replace the activity for its date, returning the replaced one.
    fn upsert_activity(&self, activity: ScoredActivity) -> StoreResult<Option<ScoredActivity>>;
    /// Returns `true` if an activity existed for that date.
    fn remove_activity(&self, event_id: &str, user_id: &str, date: NaiveDate) -> StoreResult<bool>;
    /// All activities of a participant, ordered by date.
    fn activities(&self, event_id: &str, user_id: &str) -> StoreResult<Vec<ScoredActivity>>;

    // ─── Derived records ─────────────────────────────────────────

    fn set_standing(&self, standing: ParticipantStanding) -> StoreResult<()>;
    fn standings(&self, event_id: &str) -> StoreResult<Vec<ParticipantStanding>>;
    fn set_streak(&self, streak: StreakState) -> StoreResult<()>;
    fn streaks(&self, event_id: &str) -> StoreResult<Vec<StreakState>>;
    fn upsert_completion(&self, record: CompletionRecord) -> StoreResult<()>;
    fn get_completion(&self, event_id: &str, user_id: &str) -> StoreResult<Option<CompletionRecord>>;
    /// Returns `true` if a record was removed.
    fn remove_completion(&self, event_id: &str, user_id: &str) -> StoreResult<bool>;
    fn upsert_penalty(&self, record: PenaltyRecord) -> StoreResult<()>;
    fn get_penalty(&self, event_id: &str, user_id: &str) -> StoreResult<Option<PenaltyRecord>>;
}

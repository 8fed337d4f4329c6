// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Event and participant models.

use crate::models::rule::{RuleRecord, RuleSet};
use crate::time_utils::inclusive_day_count;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Event as submitted by the admin surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventDefinition {
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub rules: Vec<RuleRecord>,
}

/// An event with its rules loaded.
#[derive(Debug, Clone)]
pub struct Event {
    pub id: String,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub rules: RuleSet,
}

impl Event {
    /// Build an event from its definition, loading the rule set once.
    pub fn from_definition(id: &str, definition: EventDefinition) -> Result<Self, EventError> {
        if definition.end_date < definition.start_date {
            return Err(EventError::InvalidWindow {
                start: definition.start_date,
                end: definition.end_date,
            });
        }
        Ok(Self {
            id: id.to_string(),
            name: definition.name,
            start_date: definition.start_date,
            end_date: definition.end_date,
            rules: RuleSet::load(&definition.rules),
        })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }

    pub fn total_days(&self) -> u32 {
        inclusive_day_count(self.start_date, self.end_date)
    }

    /// An event has ended once `today` is past its last day.
    pub fn has_ended(&self, today: NaiveDate) -> bool {
        today > self.end_date
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EventError {
    #[error("Event ends ({end}) before it starts ({start})")]
    InvalidWindow { start: NaiveDate, end: NaiveDate },
}

/// A user's registration in an event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    pub event_id: String,
    pub user_id: String,
    pub display_name: String,
}

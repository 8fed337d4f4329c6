// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Per-user ingestion rate limiting.
//!
//! Counters live inside an explicitly constructed service held in
//! `AppState`; there is no process-wide state.

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicI64, Ordering};

/// Sliding-window limiter keyed by user id.
pub struct IngestRateLimiter {
    max_requests: u32,
    window: Duration,
    hits: DashMap<String, VecDeque<DateTime<Utc>>>,
    /// Unix seconds of the last sweep for idle users.
    last_sweep: AtomicI64,
}

impl IngestRateLimiter {
    pub fn new(max_requests: u32, window_secs: u64) -> Self {
        Self {
            max_requests,
            window: Duration::seconds(window_secs as i64),
            hits: DashMap::new(),
            last_sweep: AtomicI64::new(i64::MIN),
        }
    }

    /// Record a request at `now`. Returns `false` if the user is over the limit.
    pub fn check(&self, user_id: &str, now: DateTime<Utc>) -> bool {
        let cutoff = now - self.window;
        self.sweep(now, cutoff);

        let mut hits = self.hits.entry(user_id.to_string()).or_default();
        while hits.front().is_some_and(|t| *t <= cutoff) {
            hits.pop_front();
        }

        if hits.len() as u32 >= self.max_requests {
            tracing::warn!(user_id, limit = self.max_requests, "Ingestion rate limit hit");
            return false;
        }

        hits.push_back(now);
        true
    }

    /// Forget users with no hits inside the window, at most once per window.
    ///
    /// Must not be called while holding an entry of `hits`.
    fn sweep(&self, now: DateTime<Utc>, cutoff: DateTime<Utc>) {
        let last = self.last_sweep.load(Ordering::Relaxed);
        if last > cutoff.timestamp() {
            return;
        }
        if self
            .last_sweep
            .compare_exchange(last, now.timestamp(), Ordering::Relaxed, Ordering::Relaxed)
            .is_err()
        {
            return;
        }

        let before = self.hits.len();
        self.hits
            .retain(|_, hits| hits.back().is_some_and(|t| *t > cutoff));
        let dropped = before.saturating_sub(self.hits.len());
        if dropped > 0 {
            tracing::debug!(dropped, "Idle rate limit entries dropped");
        }
    }

    pub fn tracked_users(&self) -> usize {
        self.hits.len()
    }
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Streakboard: activity scoring and standings for community fitness events
//!
//! This crate provides the backend API that admits running and walking
//! activities into events, scores them against each event's rules, and
//! keeps streaks, leaderboards, completion and penalty records current.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use services::{IngestRateLimiter, ScoringEngine};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub engine: ScoringEngine,
    pub rate_limiter: IngestRateLimiter,
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Outbound "bonus applied" notifications.
//!
//! Delivery is fire-and-forget: a notifier must never block the scoring path
//! and its failures never undo a scored activity.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Intent handed to the notification collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BonusAppliedIntent {
    pub user_id: String,
    pub event_id: String,
    pub message: String,
    pub final_points: f64,
}

/// Sink for bonus notifications.
pub trait Notifier: Send + Sync {
    fn notify(&self, intent: BonusAppliedIntent);
}

/// Writes intents to the log only.
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, intent: BonusAppliedIntent) {
        tracing::info!(
            user_id = %intent.user_id,
            event_id = %intent.event_id,
            final_points = intent.final_points,
            message = %intent.message,
            "Bonus applied"
        );
    }
}

/// Forwards intents to a channel drained by a delivery worker.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    sender: mpsc::UnboundedSender<BonusAppliedIntent>,
}

impl ChannelNotifier {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<BonusAppliedIntent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl Notifier for ChannelNotifier {
    fn notify(&self, intent: BonusAppliedIntent) {
        if let Err(e) = self.sender.send(intent) {
            tracing::warn!(
                user_id = %e.0.user_id,
                event_id = %e.0.event_id,
                "Dropped bonus notification: receiver closed"
            );
        }
    }
}

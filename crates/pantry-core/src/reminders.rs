//! Expiry reminder scheduling seam.
//!
//! Scheduling is fire-and-forget: implementations log their own failures and
//! never report them back to the store or the sync coordinator.

use std::sync::Mutex;

use crate::models::{InventoryItem, ItemId};

pub trait ReminderScheduler: Send + Sync {
    /// Schedule (or reschedule) the expiry reminder for `item`.
    fn schedule(&self, item: &InventoryItem);

    /// Cancel the reminder for one item.
    fn cancel(&self, id: &ItemId);

    /// Cancel every pending reminder.
    fn cancel_all(&self);
}

/// Scheduler that only logs, for platforms without notifications.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingReminders;

impl ReminderScheduler for LoggingReminders {
    fn schedule(&self, item: &InventoryItem) {
        tracing::debug!(item_id = %item.id, expires_at = item.expires_at, "Reminder scheduled");
    }

    fn cancel(&self, id: &ItemId) {
        tracing::debug!(item_id = %id, "Reminder cancelled");
    }

    fn cancel_all(&self) {
        tracing::debug!("All reminders cancelled");
    }
}

/// One call observed by [`RecordingReminders`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReminderCall {
    Schedule(ItemId),
    Cancel(ItemId),
    CancelAll,
}

/// Scheduler that records every call; used by tests and diagnostics.
#[derive(Debug, Default)]
pub struct RecordingReminders {
    calls: Mutex<Vec<ReminderCall>>,
}

impl RecordingReminders {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<ReminderCall> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }

    fn record(&self, call: ReminderCall) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }
}

impl ReminderScheduler for RecordingReminders {
    fn schedule(&self, item: &InventoryItem) {
        self.record(ReminderCall::Schedule(item.id));
    }

    fn cancel(&self, id: &ItemId) {
        self.record(ReminderCall::Cancel(*id));
    }

    fn cancel_all(&self) {
        self.record(ReminderCall::CancelAll);
    }
}

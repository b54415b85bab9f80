// src/notify/log.rs
//! Append-only record of delivery attempts. Cooldown is derived from this
//! log: the reference point is the last *successful* send per trigger, so
//! a failed attempt never starts a quiet period.

use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct NotificationLogEntry {
    pub trigger: String,
    pub post_ids: Vec<u64>,
    pub success: bool,
    pub sent_at: DateTime<Utc>,
}

pub trait NotificationLog: Send + Sync {
    fn append(&self, entry: NotificationLogEntry);

    /// When the trigger last delivered successfully, if ever.
    fn last_success(&self, trigger: &str) -> Option<DateTime<Utc>>;

    fn entries(&self) -> Vec<NotificationLogEntry>;
}

#[derive(Default)]
pub struct InMemoryNotificationLog {
    entries: Mutex<Vec<NotificationLogEntry>>,
}

impl InMemoryNotificationLog {
    pub fn new() -> Self {
        Self::default()
    }
}

impl NotificationLog for InMemoryNotificationLog {
    fn append(&self, entry: NotificationLogEntry) {
        self.entries.lock().expect("notify log lock poisoned").push(entry);
    }

    fn last_success(&self, trigger: &str) -> Option<DateTime<Utc>> {
        self.entries
            .lock()
            .expect("notify log lock poisoned")
            .iter()
            .rev()
            .find(|e| e.success && e.trigger == trigger)
            .map(|e| e.sent_at)
    }

    fn entries(&self) -> Vec<NotificationLogEntry> {
        self.entries.lock().expect("notify log lock poisoned").clone()
    }
}

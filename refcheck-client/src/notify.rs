//! Notifier capability and notification records.

use chrono::{DateTime, Utc};
use refcheck_core::Severity;
use std::sync::Mutex;

/// Receives user-facing notices from the synchronization layer.
///
/// Handed to the gatekeeper at construction time; there is no global
/// registration point.
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str, severity: Severity);
}

/// A transient user-visible notice.
#[derive(Debug, Clone)]
pub struct Notification {
    pub severity: Severity,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
            created_at: Utc::now(),
        }
    }
}

/// Queues notifications for the host UI to drain on its next frame.
#[derive(Debug, Default)]
pub struct QueueNotifier {
    queue: Mutex<Vec<Notification>>,
}

impl QueueNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn drain(&self) -> Vec<Notification> {
        match self.queue.lock() {
            Ok(mut guard) => std::mem::take(&mut *guard),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }
}

impl Notifier for QueueNotifier {
    fn notify(&self, message: &str, severity: Severity) {
        let notification = Notification::new(severity, message);
        match self.queue.lock() {
            Ok(mut guard) => guard.push(notification),
            Err(poisoned) => poisoned.into_inner().push(notification),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

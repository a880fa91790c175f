// User-facing notifications for completed or failed actions

use crate::error::OperationError;
use parking_lot::Mutex;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Success,
            title: "Success".to_string(),
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Error,
            title: "Error".to_string(),
            message: message.into(),
        }
    }
}

pub trait Notifier: Send + Sync + 'static {
    fn notify(&self, notification: Notification);
}

// Default notifier: notifications become log events
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notification: Notification) {
        match notification.kind {
            NotificationKind::Success => info!(title = %notification.title, "{}", notification.message),
            NotificationKind::Error => warn!(title = %notification.title, "{}", notification.message),
        }
    }
}

// Keeps every notification, for tests and batch reports
#[derive(Debug, Default)]
pub struct MemoryNotifier {
    sent: Mutex<Vec<Notification>>,
}

impl MemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.sent.lock().clone()
    }

    pub fn last(&self) -> Option<Notification> {
        self.sent.lock().last().cloned()
    }

    pub fn count(&self, kind: NotificationKind) -> usize {
        self.sent.lock().iter().filter(|n| n.kind == kind).count()
    }
}

impl Notifier for MemoryNotifier {
    fn notify(&self, notification: Notification) {
        self.sent.lock().push(notification);
    }
}

// Emit a success or error notification for the outcome and hand it back
pub fn announce<T, N: Notifier + ?Sized>(
    notifier: &N,
    action: &str,
    result: Result<T, OperationError>,
    success: impl FnOnce(&T) -> String,
) -> Result<T, OperationError> {
    match &result {
        Ok(value) => notifier.notify(Notification::success(success(value))),
        Err(e) => {
            warn!(action, error = %e, "operation failed");
            notifier.notify(Notification::error(format!("Failed to {}: {}", action, e)));
        }
    }
    result
}

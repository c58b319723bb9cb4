//! Notifier implementations: one that logs, one that records.

use std::sync::{Arc, Mutex, PoisonError};

use tracing::{info, warn};

use studyhub_core::traits::notify::{Notification, NotificationVariant, Notifier};

/// Writes every notification to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notification: Notification) {
        let description = notification.description.as_deref().unwrap_or_default();
        match notification.variant {
            NotificationVariant::Destructive => {
                warn!(title = %notification.title, description, "Notification")
            }
            NotificationVariant::Default | NotificationVariant::Success => {
                info!(title = %notification.title, description, "Notification")
            }
        }
    }
}

/// Records notifications in memory so callers can inspect them.
#[derive(Debug, Clone, Default)]
pub struct MemoryNotifier {
    sent: Arc<Mutex<Vec<Notification>>>,
}

impl MemoryNotifier {
    /// Creates an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every notification received so far.
    pub fn all(&self) -> Vec<Notification> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Removes and returns every notification received so far.
    pub fn take(&self) -> Vec<Notification> {
        std::mem::take(&mut *self.sent.lock().unwrap_or_else(PoisonError::into_inner))
    }

    /// Number of destructive (failure) notifications received.
    pub fn error_count(&self) -> usize {
        self.all()
            .iter()
            .filter(|n| n.variant == NotificationVariant::Destructive)
            .count()
    }
}

impl Notifier for MemoryNotifier {
    fn notify(&self, notification: Notification) {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(notification);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_notifier_records() {
        let notifier = MemoryNotifier::new();
        notifier.notify(Notification::success("Moved"));
        notifier.notify(Notification::error("Failed").with_description("boom"));
        assert_eq!(notifier.error_count(), 1);
        assert_eq!(notifier.take().len(), 2);
        assert!(notifier.all().is_empty());
    }
}

//! Notification sink trait for user-visible messages.

use serde::{Deserialize, Serialize};

/// Visual style of a notification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationVariant {
    /// Neutral information.
    #[default]
    Default,
    /// A completed action.
    Success,
    /// A failure or rejected action.
    Destructive,
}

/// A user-visible message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// Short headline.
    pub title: String,
    /// Optional detail line.
    pub description: Option<String>,
    /// Visual style.
    #[serde(default)]
    pub variant: NotificationVariant,
}

impl Notification {
    /// A neutral notification.
    pub fn info(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
            variant: NotificationVariant::Default,
        }
    }

    /// A success notification.
    pub fn success(title: impl Into<String>) -> Self {
        Self {
            variant: NotificationVariant::Success,
            ..Self::info(title)
        }
    }

    /// A failure notification.
    pub fn error(title: impl Into<String>) -> Self {
        Self {
            variant: NotificationVariant::Destructive,
            ..Self::info(title)
        }
    }

    /// Attach a description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Fire-and-forget notification sink.
pub trait Notifier: Send + Sync + std::fmt::Debug + 'static {
    /// Show a notification. Nothing is returned to the caller.
    fn notify(&self, notification: Notification);
}

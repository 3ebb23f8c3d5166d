//! User-facing notifications
//!
//! The controller reports outcomes as toasts; the UI layer decides how to
//! show them and wires the optional action back to the controller.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Toast severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// Follow-up the user can trigger from a toast
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationAction {
    /// Call `save_now` again
    RetrySave,
    /// Call `submit` again
    RetrySubmit,
}

/// A toast
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<NotificationAction>,
}

impl Notification {
    /// Create notification
    #[inline]
    pub fn new(level: NotificationLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            action: None,
        }
    }

    /// Info toast
    #[inline]
    pub fn info(message: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Info, message)
    }

    /// Success toast
    #[inline]
    pub fn success(message: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Success, message)
    }

    /// Warning toast
    #[inline]
    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Warning, message)
    }

    /// Error toast
    #[inline]
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Error, message)
    }

    /// With follow-up action
    #[inline]
    #[must_use]
    pub fn with_action(mut self, action: NotificationAction) -> Self {
        self.action = Some(action);
        self
    }
}

/// Sink for notifications
pub trait Notifier: Send + Sync + std::fmt::Debug {
    /// Deliver a notification; must not block
    fn notify(&self, notification: Notification);
}

/// Writes notifications to the tracing log
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notification: Notification) {
        let action = notification.action;
        match notification.level {
            NotificationLevel::Info | NotificationLevel::Success => {
                tracing::info!(level = ?notification.level, ?action, "{}", notification.message);
            }
            NotificationLevel::Warning => {
                tracing::warn!(?action, "{}", notification.message);
            }
            NotificationLevel::Error => {
                tracing::error!(?action, "{}", notification.message);
            }
        }
    }
}

/// Forwards notifications to a channel consumed by a UI task
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    sender: mpsc::UnboundedSender<Notification>,
}

impl ChannelNotifier {
    /// Create notifier and the receiving end
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl Notifier for ChannelNotifier {
    fn notify(&self, notification: Notification) {
        if self.sender.send(notification).is_err() {
            tracing::debug!("notification receiver dropped");
        }
    }
}

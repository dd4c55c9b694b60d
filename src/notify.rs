//! Notification and navigation collaborators
//!
//! The form reports submission outcomes through a [`Notifier`] and asks a
//! [`Navigator`] to move on after success. Both are fire-and-forget.

use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tracing::{error, info};

/// Notification severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Success,
    Error,
}

/// Human-readable outcome message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub severity: Severity,
    pub message: String,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
        }
    }
}

pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

pub trait Navigator: Send + Sync {
    fn navigate(&self, destination: &str);
}

/// Writes notifications to the log
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notification: Notification) {
        match notification.severity {
            Severity::Success => info!(message = %notification.message, "Form notification"),
            Severity::Error => error!(message = %notification.message, "Form notification"),
        }
    }
}

/// Logs navigation requests
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNavigator;

impl Navigator for TracingNavigator {
    fn navigate(&self, destination: &str) {
        info!(destination, "Navigation requested");
    }
}

/// Captures notifications for inspection
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    notifications: Arc<Mutex<Vec<Notification>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.notifications
            .lock()
            .map(|n| n.clone())
            .unwrap_or_default()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: Notification) {
        if let Ok(mut notifications) = self.notifications.lock() {
            notifications.push(notification);
        }
    }
}

/// Captures navigation requests for inspection
#[derive(Debug, Clone, Default)]
pub struct RecordingNavigator {
    destinations: Arc<Mutex<Vec<String>>>,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn destinations(&self) -> Vec<String> {
        self.destinations
            .lock()
            .map(|d| d.clone())
            .unwrap_or_default()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, destination: &str) {
        if let Ok(mut destinations) = self.destinations.lock() {
            destinations.push(destination.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_notifier() {
        let notifier = RecordingNotifier::new();
        notifier.notify(Notification::success("saved"));
        notifier.notify(Notification::error("offline"));

        let seen = notifier.notifications();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].severity, Severity::Success);
        assert_eq!(seen[1].message, "offline");
    }

    #[test]
    fn test_recording_navigator_shares_state() {
        let navigator = RecordingNavigator::new();
        let handle = navigator.clone();
        navigator.navigate("/dashboard");
        assert_eq!(handle.destinations(), vec!["/dashboard".to_string()]);
    }
}

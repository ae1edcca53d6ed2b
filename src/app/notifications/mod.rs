//! User-facing notifications for hub operations.
//!
//! Tabs report failed hub calls here instead of handling errors themselves.
//! The UI layer shows the active notifications as toasts and a status line.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use uuid::Uuid;

use crate::app::data_hub::HubError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotificationType {
    Error,
    Warning,
    Info,
    Success,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationError {
    pub message: String,
    pub code: Option<String>,
    pub details: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    pub title: String,
    pub notification_type: NotificationType,
    pub errors: Vec<NotificationError>,
    #[serde(skip, default = "Instant::now")]
    pub created_at: Instant,
    #[serde(skip, default)]
    pub expires_at: Option<Instant>,
    pub dismissible: bool,
    pub source: String, // e.g., "matrices", "quantum"
}

impl Notification {
    pub fn new_error(
        id: String,
        title: String,
        errors: Vec<NotificationError>,
        source: String,
    ) -> Self {
        Self {
            id,
            title,
            notification_type: NotificationType::Error,
            errors,
            created_at: Instant::now(),
            expires_at: None, // Errors don't auto-expire
            dismissible: true,
            source,
        }
    }

    pub fn new_warning(
        id: String,
        title: String,
        errors: Vec<NotificationError>,
        source: String,
    ) -> Self {
        Self {
            id,
            title,
            notification_type: NotificationType::Warning,
            errors,
            created_at: Instant::now(),
            expires_at: Some(Instant::now() + Duration::from_secs(30)),
            dismissible: true,
            source,
        }
    }

    pub fn new_info(id: String, title: String, message: String, source: String) -> Self {
        Self::with_message(id, title, NotificationType::Info, message, source, 10)
    }

    pub fn new_success(id: String, title: String, message: String, source: String) -> Self {
        Self::with_message(id, title, NotificationType::Success, message, source, 5)
    }

    fn with_message(
        id: String,
        title: String,
        notification_type: NotificationType,
        message: String,
        source: String,
        lifetime_secs: u64,
    ) -> Self {
        Self {
            id,
            title,
            notification_type,
            errors: vec![NotificationError {
                message,
                code: None,
                details: None,
            }],
            created_at: Instant::now(),
            expires_at: Some(Instant::now() + Duration::from_secs(lifetime_secs)),
            dismissible: true,
            source,
        }
    }

    /// Error notification for a rejected hub call made by `source`
    pub fn from_hub_error(error: &HubError, source: &str) -> Self {
        let details = match error {
            HubError::UnknownCategory(_) => {
                "Valid categories: matrices, arrays, scalars, functions, complex, datasets, vectors"
                    .to_string()
            }
            HubError::PayloadMismatch { payload, .. } => {
                format!("Export it under '{}' instead", payload)
            }
            HubError::NonFiniteValue(_) => {
                "Replace NaN and infinite values before exporting".to_string()
            }
        };

        Self::new_error(
            Uuid::new_v4().to_string(),
            "Data hub request failed".to_string(),
            vec![NotificationError {
                message: error.to_string(),
                code: Some(error.code().to_string()),
                details: Some(details),
            }],
            source.to_string(),
        )
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Instant::now())
    }

    fn is_expired_at(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|expires_at| now > expires_at)
    }

    pub fn get_icon(&self) -> &'static str {
        match self.notification_type {
            NotificationType::Error => "✗",
            NotificationType::Warning => "⚠",
            NotificationType::Info => "ℹ",
            NotificationType::Success => "✓",
        }
    }

    /// First message, for one-line toasts
    pub fn message(&self) -> &str {
        self.errors
            .first()
            .map(|error| error.message.as_str())
            .unwrap_or_default()
    }
}

#[derive(Debug, Default)]
pub struct NotificationManager {
    notifications: HashMap<String, Notification>,
    pub selected_notification_id: Option<String>,
}

impl NotificationManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_notification(&mut self, notification: Notification) {
        self.notifications
            .insert(notification.id.clone(), notification);
    }

    /// Pass a successful hub result through; record a failed one
    pub fn report<T>(&mut self, result: Result<T, HubError>, source: &str) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(error) => {
                crate::log_warn!("{} hub request failed: {}", source, error);
                self.add_notification(Notification::from_hub_error(&error, source));
                None
            }
        }
    }

    pub fn dismiss_notification(&mut self, id: &str) {
        self.notifications.remove(id);
        if self.selected_notification_id.as_deref() == Some(id) {
            self.selected_notification_id = None;
        }
    }

    pub fn clear_expired(&mut self) {
        self.clear_expired_at(Instant::now());
    }

    fn clear_expired_at(&mut self, now: Instant) {
        self.notifications
            .retain(|_, notification| !notification.is_expired_at(now));
    }

    /// Active notifications, newest first
    pub fn get_active_notifications(&self) -> Vec<&Notification> {
        let mut notifications: Vec<&Notification> = self.notifications.values().collect();
        notifications.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        notifications
    }

    pub fn get_notification(&self, id: &str) -> Option<&Notification> {
        self.notifications.get(id)
    }

    pub fn has_errors(&self) -> bool {
        self.get_error_count() > 0
    }

    pub fn has_warnings(&self) -> bool {
        self.get_warning_count() > 0
    }

    pub fn get_error_count(&self) -> usize {
        self.count_of(NotificationType::Error)
    }

    pub fn get_warning_count(&self) -> usize {
        self.count_of(NotificationType::Warning)
    }

    /// Status line text such as "2 errors, 1 warning"; `None` when clean
    pub fn status_summary(&self) -> Option<String> {
        let parts: Vec<String> = [
            (self.get_error_count(), "error"),
            (self.get_warning_count(), "warning"),
        ]
        .into_iter()
        .filter(|(count, _)| *count > 0)
        .map(|(count, noun)| {
            if count == 1 {
                format!("1 {}", noun)
            } else {
                format!("{} {}s", count, noun)
            }
        })
        .collect();

        if parts.is_empty() {
            None
        } else {
            Some(parts.join(", "))
        }
    }

    pub fn show_notification_details(&mut self, notification_id: String) {
        self.selected_notification_id = Some(notification_id);
    }

    fn count_of(&self, notification_type: NotificationType) -> usize {
        self.notifications
            .values()
            .filter(|n| n.notification_type == notification_type)
            .count()
    }
}

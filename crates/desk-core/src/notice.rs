//! Transient user-facing notifications.
//!
//! The dispatcher emits a [`Notice`] for order fills, switch confirmations,
//! server errors, and send-while-disconnected drops. Notices ride a
//! `tokio::sync::broadcast` channel owned by the session manager; the
//! presentation layer subscribes and renders them as toasts. A lagging
//! subscriber misses notices rather than blocking dispatch.

use serde::{Deserialize, Serialize};

/// Severity of a notice.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    /// Something completed (order filled, user switched).
    Success,
    /// Informational (order pending).
    Info,
    /// Something failed (server error, not connected).
    Error,
}

/// A transient notification for the user.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Notice {
    /// Severity.
    pub level: NoticeLevel,
    /// Display text.
    pub message: String,
}

impl Notice {
    /// Build a success notice.
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    /// Build an informational notice.
    #[must_use]
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    /// Build an error notice.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

//! Notification entity and repository trait.
//!
//! Maps to the `notifications` table in the database schema.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::shared::error::AppError;

/// Notification types matching the PostgreSQL ENUM `notification_type`.
///
/// Database definition:
/// ```sql
/// CREATE TYPE notification_type AS ENUM (
///     'like',     -- Someone liked your post
///     'comment',  -- Someone commented on your post
///     'retweet',  -- Someone retweeted or quoted your post
///     'mention',
///     'follow'
/// );
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    Like,
    Comment,
    Retweet,
    Mention,
    Follow,
}

impl NotificationType {
    /// Convert from database string representation.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "like" => Some(Self::Like),
            "comment" => Some(Self::Comment),
            "retweet" => Some(Self::Retweet),
            "mention" => Some(Self::Mention),
            "follow" => Some(Self::Follow),
            _ => None,
        }
    }

    /// Convert to database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Like => "like",
            Self::Comment => "comment",
            Self::Retweet => "retweet",
            Self::Mention => "mention",
            Self::Follow => "follow",
        }
    }
}

impl std::fmt::Display for NotificationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A notification delivered to `recipient_id` about something `from_user_id` did.
///
/// Maps to the `notifications` table:
/// - id: BIGINT PRIMARY KEY (Snowflake ID)
/// - recipient_id: BIGINT NOT NULL
/// - from_user_id: BIGINT NOT NULL, CHECK (recipient_id <> from_user_id)
/// - notification_type: notification_type NOT NULL
/// - post_id: BIGINT NULL (weak reference, no cascade)
/// - comment_id: BIGINT NULL (weak reference, no cascade)
/// - read: BOOLEAN NOT NULL DEFAULT FALSE
/// - created_at: TIMESTAMPTZ NOT NULL DEFAULT NOW()
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: i64,
    pub recipient_id: i64,
    pub from_user_id: i64,
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    pub post_id: Option<i64>,
    pub comment_id: Option<i64>,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(
        id: i64,
        recipient_id: i64,
        from_user_id: i64,
        notification_type: NotificationType,
        post_id: Option<i64>,
        comment_id: Option<i64>,
    ) -> Self {
        Self {
            id,
            recipient_id,
            from_user_id,
            notification_type,
            post_id,
            comment_id,
            read: false,
            created_at: Utc::now(),
        }
    }

    /// Self-notifications are never persisted.
    pub fn is_self_notification(&self) -> bool {
        self.recipient_id == self.from_user_id
    }
}

/// Repository trait for Notification data access operations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationRepository: Send + Sync {
    /// Persist a new notification.
    async fn create(&self, notification: &Notification) -> Result<Notification, AppError>;

    /// Find a notification by ID.
    async fn find_by_id(&self, id: i64) -> Result<Option<Notification>, AppError>;

    /// All notifications for a recipient, newest first.
    async fn find_by_recipient(&self, recipient_id: i64) -> Result<Vec<Notification>, AppError>;

    /// Number of unread notifications for a recipient.
    async fn count_unread(&self, recipient_id: i64) -> Result<i64, AppError>;

    /// Mark one notification read. Returns false when it does not exist.
    async fn mark_read(&self, id: i64) -> Result<bool, AppError>;

    /// Mark every unread notification of a recipient read. Returns the number flipped.
    async fn mark_all_read(&self, recipient_id: i64) -> Result<u64, AppError>;

    /// Delete a notification. Returns false when it does not exist.
    async fn delete(&self, id: i64) -> Result<bool, AppError>;
}

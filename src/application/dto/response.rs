//! Response DTOs
//!
//! Display projections returned by the engine. User references are always
//! resolved to a [`UserSummary`]; raw ids appear only next to it or where the
//! id is the payload.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::{Notification, NotificationType, UserProfile};

/// Display identity of a user
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserSummary {
    pub id: i64,
    pub username: String,
    pub avatar: Option<String>,
}

impl From<UserProfile> for UserSummary {
    fn from(profile: UserProfile) -> Self {
        Self {
            id: profile.id,
            username: profile.username,
            avatar: profile.avatar,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CommentView {
    pub id: i64,
    pub content: String,
    pub author: UserSummary,
    pub created_at: DateTime<Utc>,
}

/// The post a retweet or quote points at.
///
/// Resolved one hop only: its own `original_post_id` is reported but never
/// expanded.
#[derive(Debug, Clone, Serialize)]
pub struct OriginalPostView {
    pub id: i64,
    pub author: UserSummary,
    pub content: String,
    pub image: Option<String>,
    pub like_count: usize,
    pub retweet_count: usize,
    pub share_count: i64,
    pub original_post_id: Option<i64>,
    pub is_retweet: bool,
    pub is_quote_retweet: bool,
    pub created_at: DateTime<Utc>,
}

/// Full projection of a post
#[derive(Debug, Clone, Serialize)]
pub struct PostView {
    pub id: i64,
    pub author: UserSummary,
    pub content: String,
    pub image: Option<String>,
    pub likes: Vec<i64>,
    pub like_count: usize,
    pub retweets: Vec<i64>,
    pub share_count: i64,
    pub is_retweet: bool,
    pub is_quote_retweet: bool,
    /// Set even when the original no longer exists
    pub original_post_id: Option<i64>,
    /// None when there is no original or it was deleted
    pub original_post: Option<OriginalPostView>,
    pub comments: Vec<CommentView>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Result of a like toggle
#[derive(Debug, Clone, Serialize)]
pub struct LikeSummary {
    pub post_id: i64,
    /// Whether the actor likes the post after the toggle
    pub liked: bool,
    pub likes: Vec<i64>,
    pub like_count: usize,
    pub actor: UserSummary,
}

/// Result of a retweet toggle
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RetweetOutcome {
    Created(Box<PostView>),
    Deleted { post_id: i64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PostDeleted {
    pub post_id: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CommentDeleted {
    pub post_id: i64,
    pub comment_id: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ShareCountView {
    pub post_id: i64,
    pub share_count: i64,
}

/// A notification with its sender and post resolved
#[derive(Debug, Clone, Serialize)]
pub struct NotificationView {
    pub id: i64,
    pub from_user: UserSummary,
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    pub post_id: Option<i64>,
    /// Absent when the post was deleted or the notification has no post
    pub post_content: Option<String>,
    pub comment_id: Option<i64>,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

impl NotificationView {
    pub fn new(notification: Notification, from_user: UserSummary, post_content: Option<String>) -> Self {
        Self {
            id: notification.id,
            from_user,
            notification_type: notification.notification_type,
            post_id: notification.post_id,
            post_content,
            comment_id: notification.comment_id,
            read: notification.read,
            created_at: notification.created_at,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UnreadCount {
    pub count: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MarkAllReadSummary {
    pub updated: u64,
}

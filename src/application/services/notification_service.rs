//! Notification Service
//!
//! Read and read-state operations on a user's notifications.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::instrument;

use super::projection::Projector;
use crate::application::dto::{MarkAllReadSummary, NotificationView, UnreadCount};
use crate::domain::{NotificationRepository, PostRepository, UserDirectory};
use crate::shared::error::AppError;

/// Notification service trait
#[async_trait]
pub trait NotificationService: Send + Sync {
    /// Notifications of a recipient, newest first
    async fn list(&self, recipient_id: i64) -> Result<Vec<NotificationView>, NotificationError>;

    async fn unread_count(&self, recipient_id: i64) -> Result<UnreadCount, NotificationError>;

    async fn mark_read(&self, notification_id: i64) -> Result<(), NotificationError>;

    async fn mark_all_read(&self, recipient_id: i64) -> Result<MarkAllReadSummary, NotificationError>;

    async fn delete(&self, notification_id: i64) -> Result<(), NotificationError>;
}

/// Notification service errors
#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("Notification not found")]
    NotFound,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<AppError> for NotificationError {
    fn from(err: AppError) -> Self {
        match err {
            AppError::NotFound(_) => Self::NotFound,
            other => Self::Internal(other.to_string()),
        }
    }
}

/// NotificationService implementation
pub struct NotificationServiceImpl<N, P, U>
where
    N: NotificationRepository,
    P: PostRepository,
    U: UserDirectory,
{
    notification_repo: Arc<N>,
    post_repo: Arc<P>,
    projector: Projector<P, U>,
}

impl<N, P, U> NotificationServiceImpl<N, P, U>
where
    N: NotificationRepository,
    P: PostRepository,
    U: UserDirectory,
{
    pub fn new(notification_repo: Arc<N>, post_repo: Arc<P>, user_directory: Arc<U>) -> Self {
        Self {
            notification_repo,
            projector: Projector::new(Arc::clone(&post_repo), user_directory),
            post_repo,
        }
    }
}

#[async_trait]
impl<N, P, U> NotificationService for NotificationServiceImpl<N, P, U>
where
    N: NotificationRepository + 'static,
    P: PostRepository + 'static,
    U: UserDirectory + 'static,
{
    #[instrument(skip(self))]
    async fn list(&self, recipient_id: i64) -> Result<Vec<NotificationView>, NotificationError> {
        let notifications = self.notification_repo.find_by_recipient(recipient_id).await?;

        let users = self
            .projector
            .resolve_users(notifications.iter().map(|n| n.from_user_id))
            .await?;

        let mut post_ids: Vec<i64> = notifications.iter().filter_map(|n| n.post_id).collect();
        post_ids.sort_unstable();
        post_ids.dedup();
        let contents: HashMap<i64, String> = if post_ids.is_empty() {
            HashMap::new()
        } else {
            self.post_repo
                .find_many(&post_ids)
                .await?
                .into_iter()
                .map(|post| (post.id, post.content))
                .collect()
        };

        Ok(notifications
            .into_iter()
            .map(|n| {
                let from_user = users.summary(n.from_user_id);
                let post_content = n.post_id.and_then(|id| contents.get(&id).cloned());
                NotificationView::new(n, from_user, post_content)
            })
            .collect())
    }

    async fn unread_count(&self, recipient_id: i64) -> Result<UnreadCount, NotificationError> {
        let count = self.notification_repo.count_unread(recipient_id).await?;
        Ok(UnreadCount { count })
    }

    #[instrument(skip(self))]
    async fn mark_read(&self, notification_id: i64) -> Result<(), NotificationError> {
        if !self.notification_repo.mark_read(notification_id).await? {
            return Err(NotificationError::NotFound);
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn mark_all_read(&self, recipient_id: i64) -> Result<MarkAllReadSummary, NotificationError> {
        let updated = self.notification_repo.mark_all_read(recipient_id).await?;
        Ok(MarkAllReadSummary { updated })
    }

    #[instrument(skip(self))]
    async fn delete(&self, notification_id: i64) -> Result<(), NotificationError> {
        if !self.notification_repo.delete(notification_id).await? {
            return Err(NotificationError::NotFound);
        }
        Ok(())
    }
}

//! Notification Fan-out
//!
//! Best-effort delivery of notifications after an interaction committed.
//! A failed write is logged and counted; it never reaches the caller.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::domain::{Notification, NotificationRepository, NotificationType};
use crate::infrastructure::metrics;
use crate::shared::snowflake::SnowflakeGenerator;

/// What should be delivered, before an id is assigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotificationDraft {
    pub recipient_id: i64,
    pub from_user_id: i64,
    pub notification_type: NotificationType,
    pub post_id: Option<i64>,
    pub comment_id: Option<i64>,
}

impl NotificationDraft {
    pub fn new(recipient_id: i64, from_user_id: i64, notification_type: NotificationType) -> Self {
        Self {
            recipient_id,
            from_user_id,
            notification_type,
            post_id: None,
            comment_id: None,
        }
    }

    pub fn post(mut self, post_id: i64) -> Self {
        self.post_id = Some(post_id);
        self
    }

    pub fn comment(mut self, comment_id: i64) -> Self {
        self.comment_id = Some(comment_id);
        self
    }
}

/// Outcome of one emit. Informational only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FanoutOutcome {
    /// Actor and recipient are the same user
    Skipped,
    Delivered,
    /// The store rejected the write
    Dropped,
}

impl FanoutOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Skipped => "skipped",
            Self::Delivered => "delivered",
            Self::Dropped => "dropped",
        }
    }
}

pub struct NotificationFanout<N>
where
    N: NotificationRepository,
{
    notification_repo: Arc<N>,
    id_generator: Arc<SnowflakeGenerator>,
}

impl<N> NotificationFanout<N>
where
    N: NotificationRepository,
{
    pub fn new(notification_repo: Arc<N>, id_generator: Arc<SnowflakeGenerator>) -> Self {
        Self {
            notification_repo,
            id_generator,
        }
    }

    pub async fn emit(&self, draft: NotificationDraft) -> FanoutOutcome {
        let outcome = self.deliver(draft).await;
        metrics::record_notification(draft.notification_type.as_str(), outcome.as_str());
        outcome
    }

    async fn deliver(&self, draft: NotificationDraft) -> FanoutOutcome {
        if draft.recipient_id == draft.from_user_id {
            return FanoutOutcome::Skipped;
        }

        let notification = Notification::new(
            self.id_generator.generate(),
            draft.recipient_id,
            draft.from_user_id,
            draft.notification_type,
            draft.post_id,
            draft.comment_id,
        );

        match self.notification_repo.create(&notification).await {
            Ok(stored) => {
                debug!(
                    notification_id = stored.id,
                    recipient_id = stored.recipient_id,
                    kind = %stored.notification_type,
                    "Notification delivered"
                );
                FanoutOutcome::Delivered
            }
            Err(e) => {
                warn!(
                    recipient_id = draft.recipient_id,
                    from_user_id = draft.from_user_id,
                    kind = %draft.notification_type,
                    post_id = ?draft.post_id,
                    error_kind = e.kind(),
                    error = %e,
                    "Failed to store notification"
                );
                FanoutOutcome::Dropped
            }
        }
    }
}

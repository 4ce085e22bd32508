//! In-memory Notification Repository

use async_trait::async_trait;
use dashmap::DashMap;

use crate::domain::{Notification, NotificationRepository};
use crate::shared::error::AppError;

#[derive(Default)]
pub struct InMemoryNotificationRepository {
    notifications: DashMap<i64, Notification>,
}

impl InMemoryNotificationRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of stored notifications, all recipients.
    pub fn len(&self) -> usize {
        self.notifications.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notifications.is_empty()
    }
}

#[async_trait]
impl NotificationRepository for InMemoryNotificationRepository {
    async fn create(&self, notification: &Notification) -> Result<Notification, AppError> {
        // Mirrors the CHECK constraint of the notifications table
        if notification.is_self_notification() {
            return Err(AppError::Validation(
                "notification recipient and sender must differ".into(),
            ));
        }
        self.notifications
            .insert(notification.id, notification.clone());
        Ok(notification.clone())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Notification>, AppError> {
        Ok(self.notifications.get(&id).map(|n| n.clone()))
    }

    async fn find_by_recipient(&self, recipient_id: i64) -> Result<Vec<Notification>, AppError> {
        let mut found: Vec<Notification> = self
            .notifications
            .iter()
            .filter(|entry| entry.recipient_id == recipient_id)
            .map(|entry| entry.value().clone())
            .collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(found)
    }

    async fn count_unread(&self, recipient_id: i64) -> Result<i64, AppError> {
        let count = self
            .notifications
            .iter()
            .filter(|entry| entry.recipient_id == recipient_id && !entry.read)
            .count();
        Ok(count as i64)
    }

    async fn mark_read(&self, id: i64) -> Result<bool, AppError> {
        Ok(self
            .notifications
            .get_mut(&id)
            .map(|mut n| n.read = true)
            .is_some())
    }

    async fn mark_all_read(&self, recipient_id: i64) -> Result<u64, AppError> {
        let mut flipped = 0;
        for mut entry in self.notifications.iter_mut() {
            if entry.recipient_id == recipient_id && !entry.read {
                entry.read = true;
                flipped += 1;
            }
        }
        Ok(flipped)
    }

    async fn delete(&self, id: i64) -> Result<bool, AppError> {
        Ok(self.notifications.remove(&id).is_some())
    }
}

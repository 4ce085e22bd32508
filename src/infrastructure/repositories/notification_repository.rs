//! Notification Repository Implementation
//!
//! PostgreSQL implementation of notification storage, read-state tracking and
//! unread counting.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::instrument;

use crate::domain::{Notification, NotificationRepository, NotificationType};
use crate::infrastructure::database::map_write_error;
use crate::shared::error::AppError;

/// PostgreSQL notification repository implementation.
pub struct PgNotificationRepository {
    pool: PgPool,
}

impl PgNotificationRepository {
    /// Creates a new PgNotificationRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Internal row type for notification queries.
#[derive(Debug, sqlx::FromRow)]
struct NotificationRow {
    id: i64,
    recipient_id: i64,
    from_user_id: i64,
    notification_type: String, // PostgreSQL enum maps to string
    post_id: Option<i64>,
    comment_id: Option<i64>,
    read: bool,
    created_at: DateTime<Utc>,
}

impl NotificationRow {
    fn into_notification(self) -> Result<Notification, AppError> {
        let notification_type = NotificationType::from_str(&self.notification_type).ok_or_else(|| {
            AppError::Internal(format!(
                "unknown notification type '{}'",
                self.notification_type
            ))
        })?;

        Ok(Notification {
            id: self.id,
            recipient_id: self.recipient_id,
            from_user_id: self.from_user_id,
            notification_type,
            post_id: self.post_id,
            comment_id: self.comment_id,
            read: self.read,
            created_at: self.created_at,
        })
    }
}

#[async_trait]
impl NotificationRepository for PgNotificationRepository {
    #[instrument(skip(self, notification), fields(recipient = notification.recipient_id), level = "debug")]
    async fn create(&self, notification: &Notification) -> Result<Notification, AppError> {
        sqlx::query(
            r#"
            INSERT INTO notifications (
                id, recipient_id, from_user_id, notification_type,
                post_id, comment_id, read, created_at
            )
            VALUES ($1, $2, $3, $4::notification_type, $5, $6, $7, $8)
            "#,
        )
        .bind(notification.id)
        .bind(notification.recipient_id)
        .bind(notification.from_user_id)
        .bind(notification.notification_type.as_str())
        .bind(notification.post_id)
        .bind(notification.comment_id)
        .bind(notification.read)
        .bind(notification.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_write_error(e, "notifications"))?;

        Ok(notification.clone())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Notification>, AppError> {
        let row = sqlx::query_as::<_, NotificationRow>(
            r#"
            SELECT id, recipient_id, from_user_id,
                   notification_type::text AS notification_type,
                   post_id, comment_id, read, created_at
            FROM notifications
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(NotificationRow::into_notification).transpose()
    }

    #[instrument(skip(self), level = "debug")]
    async fn find_by_recipient(&self, recipient_id: i64) -> Result<Vec<Notification>, AppError> {
        let rows = sqlx::query_as::<_, NotificationRow>(
            r#"
            SELECT id, recipient_id, from_user_id,
                   notification_type::text AS notification_type,
                   post_id, comment_id, read, created_at
            FROM notifications
            WHERE recipient_id = $1
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(recipient_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(NotificationRow::into_notification)
            .collect()
    }

    async fn count_unread(&self, recipient_id: i64) -> Result<i64, AppError> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM notifications WHERE recipient_id = $1 AND NOT read",
        )
        .bind(recipient_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn mark_read(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("UPDATE notifications SET read = TRUE WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| map_write_error(e, "notifications"))?;

        Ok(result.rows_affected() > 0)
    }

    async fn mark_all_read(&self, recipient_id: i64) -> Result<u64, AppError> {
        let result = sqlx::query(
            "UPDATE notifications SET read = TRUE WHERE recipient_id = $1 AND NOT read",
        )
        .bind(recipient_id)
        .execute(&self.pool)
        .await
        .map_err(|e| map_write_error(e, "notifications"))?;

        Ok(result.rows_affected())
    }

    async fn delete(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM notifications WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| map_write_error(e, "notifications"))?;

        Ok(result.rows_affected() > 0)
    }
}

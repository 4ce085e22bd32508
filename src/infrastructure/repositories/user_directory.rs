//! User Directory Implementation
//!
//! Read-only PostgreSQL lookups of public user profiles.

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::{UserDirectory, UserProfile};
use crate::shared::error::AppError;

/// PostgreSQL user directory.
pub struct PgUserDirectory {
    pool: PgPool,
}

impl PgUserDirectory {
    /// Creates a new PgUserDirectory with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct UserProfileRow {
    id: i64,
    username: String,
    avatar: Option<String>,
}

impl From<UserProfileRow> for UserProfile {
    fn from(row: UserProfileRow) -> Self {
        UserProfile::new(row.id, row.username, row.avatar)
    }
}

#[async_trait]
impl UserDirectory for PgUserDirectory {
    async fn resolve_by_id(&self, id: i64) -> Result<Option<UserProfile>, AppError> {
        let row = sqlx::query_as::<_, UserProfileRow>(
            "SELECT id, username, avatar FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(UserProfile::from))
    }

    async fn resolve_by_username(&self, username: &str) -> Result<Option<UserProfile>, AppError> {
        let row = sqlx::query_as::<_, UserProfileRow>(
            "SELECT id, username, avatar FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(UserProfile::from))
    }

    /// One round trip for the whole batch.
    async fn resolve_many(&self, ids: &[i64]) -> Result<HashMap<i64, UserProfile>, AppError> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = sqlx::query_as::<_, UserProfileRow>(
            "SELECT id, username, avatar FROM users WHERE id = ANY($1)",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| (row.id, UserProfile::from(row)))
            .collect())
    }
}

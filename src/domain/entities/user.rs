//! User display identity and the directory trait.
//!
//! Users are owned by the account subsystem; this crate only reads their
//! public profile from the `users` table.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::shared::error::AppError;

/// Username shown for references to users that no longer resolve.
pub const DELETED_USERNAME: &str = "[deleted]";

/// Public profile of a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: i64,
    pub username: String,
    pub avatar: Option<String>,
}

impl UserProfile {
    pub fn new(id: i64, username: impl Into<String>, avatar: Option<String>) -> Self {
        Self {
            id,
            username: username.into(),
            avatar,
        }
    }

    /// Placeholder identity for a dangling user reference.
    pub fn deleted(id: i64) -> Self {
        Self {
            id,
            username: DELETED_USERNAME.to_string(),
            avatar: None,
        }
    }
}

/// Resolves user ids and usernames to display identity.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Resolve a user by ID.
    async fn resolve_by_id(&self, id: i64) -> Result<Option<UserProfile>, AppError>;

    /// Resolve a user by username.
    async fn resolve_by_username(&self, username: &str) -> Result<Option<UserProfile>, AppError>;

    /// Resolve several users at once. Unknown ids are absent from the map.
    async fn resolve_many(&self, ids: &[i64]) -> Result<HashMap<i64, UserProfile>, AppError> {
        let lookups = ids.iter().map(|&id| self.resolve_by_id(id));
        let profiles = futures::future::try_join_all(lookups).await?;

        Ok(profiles
            .into_iter()
            .flatten()
            .map(|profile| (profile.id, profile))
            .collect())
    }
}

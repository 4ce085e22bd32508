//! In-memory User Directory

use async_trait::async_trait;
use dashmap::DashMap;

use crate::domain::{UserDirectory, UserProfile};
use crate::shared::error::AppError;

#[derive(Default)]
pub struct InMemoryUserDirectory {
    by_id: DashMap<i64, UserProfile>,
    by_username: DashMap<String, i64>,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or replace a profile.
    pub fn insert(&self, profile: UserProfile) {
        if let Some(previous) = self.by_id.insert(profile.id, profile.clone()) {
            self.by_username.remove(&previous.username);
        }
        self.by_username.insert(profile.username.clone(), profile.id);
    }

    /// Forget a user, leaving any references to it dangling.
    pub fn remove(&self, id: i64) {
        if let Some((_, profile)) = self.by_id.remove(&id) {
            self.by_username.remove(&profile.username);
        }
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn resolve_by_id(&self, id: i64) -> Result<Option<UserProfile>, AppError> {
        Ok(self.by_id.get(&id).map(|p| p.clone()))
    }

    async fn resolve_by_username(&self, username: &str) -> Result<Option<UserProfile>, AppError> {
        let id = self.by_username.get(username).map(|entry| *entry.value());
        Ok(id.and_then(|id| self.by_id.get(&id).map(|p| p.clone())))
    }
}

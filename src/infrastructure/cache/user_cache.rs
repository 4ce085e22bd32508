//! User Profile Cache
//!
//! Read-through cache in front of a `UserDirectory`. Every projection
//! resolves authors and actors, so profile lookups are the hottest read path.
//! Cache failures are logged and fall through to the directory; they never
//! fail a lookup.

use std::collections::HashMap;

use async_trait::async_trait;
use tracing::warn;

use super::cache_service::Cache;
use super::keys;
use crate::domain::{UserDirectory, UserProfile};
use crate::shared::error::AppError;

pub struct CachedUserDirectory<D, C>
where
    D: UserDirectory,
    C: Cache,
{
    inner: D,
    cache: C,
    ttl_secs: u64,
}

impl<D, C> CachedUserDirectory<D, C>
where
    D: UserDirectory,
    C: Cache,
{
    pub fn new(inner: D, cache: C, ttl_secs: u64) -> Self {
        Self {
            inner,
            cache,
            ttl_secs,
        }
    }

    async fn cached(&self, key: &str) -> Option<UserProfile> {
        match self.cache.get::<UserProfile>(key).await {
            Ok(hit) => hit,
            Err(e) => {
                warn!(key = %key, error_kind = e.kind(), error = %e, "Profile cache read failed");
                None
            }
        }
    }

    async fn store(&self, profile: &UserProfile) {
        for key in [keys::user(profile.id), keys::username(&profile.username)] {
            if let Err(e) = self.cache.set_ex(&key, profile, self.ttl_secs).await {
                warn!(key = %key, error_kind = e.kind(), error = %e, "Profile cache write failed");
            }
        }
    }
}

#[async_trait]
impl<D, C> UserDirectory for CachedUserDirectory<D, C>
where
    D: UserDirectory,
    C: Cache,
{
    async fn resolve_by_id(&self, id: i64) -> Result<Option<UserProfile>, AppError> {
        if let Some(profile) = self.cached(&keys::user(id)).await {
            return Ok(Some(profile));
        }

        let profile = self.inner.resolve_by_id(id).await?;
        if let Some(profile) = &profile {
            self.store(profile).await;
        }
        Ok(profile)
    }

    async fn resolve_by_username(&self, username: &str) -> Result<Option<UserProfile>, AppError> {
        if let Some(profile) = self.cached(&keys::username(username)).await {
            return Ok(Some(profile));
        }

        let profile = self.inner.resolve_by_username(username).await?;
        if let Some(profile) = &profile {
            self.store(profile).await;
        }
        Ok(profile)
    }

    async fn resolve_many(&self, ids: &[i64]) -> Result<HashMap<i64, UserProfile>, AppError> {
        let mut resolved = HashMap::with_capacity(ids.len());
        let mut misses = Vec::new();

        for &id in ids {
            match self.cached(&keys::user(id)).await {
                Some(profile) => {
                    resolved.insert(id, profile);
                }
                None => misses.push(id),
            }
        }

        if !misses.is_empty() {
            let fetched = self.inner.resolve_many(&misses).await?;
            for profile in fetched.into_values() {
                self.store(&profile).await;
                resolved.insert(profile.id, profile);
            }
        }

        Ok(resolved)
    }
}

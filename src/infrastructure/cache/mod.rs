//! Cache Module
//!
//! Redis connection management and the profile cache that sits in front of
//! the user directory.
//!
//! ```text
//! projection -> CachedUserDirectory -> Cache (RedisCache) -> ConnectionManager
//!                        |
//!                        +-> UserDirectory (PgUserDirectory) on miss
//! ```

mod cache_service;
mod user_cache;

pub use cache_service::{Cache, RedisCache};
pub use user_cache::CachedUserDirectory;

use redis::aio::ConnectionManager;
use redis::Client;
use tracing::{info, instrument};

use crate::config::RedisSettings;

/// Creates a Redis connection manager with automatic reconnection.
#[instrument(skip(settings), fields(url = %settings.url))]
pub async fn create_redis_client(
    settings: &RedisSettings,
) -> Result<ConnectionManager, redis::RedisError> {
    info!("Connecting to Redis...");
    let client = Client::open(settings.url.as_str())?;
    let manager = ConnectionManager::new(client).await?;
    info!("Redis connection established");
    Ok(manager)
}

/// Creates a `RedisCache` namespaced under `prefix`.
#[instrument(skip(settings), fields(url = %settings.url, prefix = %prefix))]
pub async fn create_redis_cache(
    settings: &RedisSettings,
    prefix: &str,
) -> Result<RedisCache, redis::RedisError> {
    let conn = create_redis_client(settings).await?;
    Ok(RedisCache::with_prefix(conn, prefix.to_string()))
}

/// Cache key prefixes.
pub mod keys {
    /// Prefix for user profiles by id (e.g., "user:user_id")
    pub const USER_PROFILE: &str = "user:";

    /// Prefix for user profiles by username (e.g., "username:alice")
    pub const USERNAME: &str = "username:";

    #[inline]
    pub fn user(user_id: impl std::fmt::Display) -> String {
        format!("{}{}", USER_PROFILE, user_id)
    }

    #[inline]
    pub fn username(username: &str) -> String {
        format!("{}{}", USERNAME, username)
    }
}

//! Engine Startup
//!
//! Wires repositories, the id generator and the three services together.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use sqlx::PgPool;

use crate::application::services::{
    InteractionServiceImpl, NotificationServiceImpl, PostQueryServiceImpl,
};
use crate::config::{InteractionSettings, Settings};
use crate::domain::{NotificationRepository, PostRepository, UserDirectory, UserProfile};
use crate::infrastructure::cache::{self, CachedUserDirectory, RedisCache};
use crate::infrastructure::database;
use crate::infrastructure::repositories::{
    PgNotificationRepository, PgPostRepository, PgUserDirectory,
};
use crate::shared::error::AppError;
use crate::shared::snowflake::SnowflakeGenerator;

/// Key prefix for everything this crate stores in Redis
const CACHE_PREFIX: &str = "social:v1:";

/// The three engine services over one set of repositories
pub struct CoreServices<P, N, U>
where
    P: PostRepository,
    N: NotificationRepository,
    U: UserDirectory,
{
    pub interactions: Arc<InteractionServiceImpl<P, N, U>>,
    pub notifications: Arc<NotificationServiceImpl<N, P, U>>,
    pub posts: Arc<PostQueryServiceImpl<P, U>>,
}

impl<P, N, U> CoreServices<P, N, U>
where
    P: PostRepository,
    N: NotificationRepository,
    U: UserDirectory,
{
    pub fn new(
        post_repo: Arc<P>,
        notification_repo: Arc<N>,
        user_directory: Arc<U>,
        id_generator: Arc<SnowflakeGenerator>,
        settings: &InteractionSettings,
    ) -> Self {
        Self {
            interactions: Arc::new(InteractionServiceImpl::new(
                Arc::clone(&post_repo),
                Arc::clone(&notification_repo),
                Arc::clone(&user_directory),
                id_generator,
                settings.conflict_retries,
            )),
            notifications: Arc::new(NotificationServiceImpl::new(
                notification_repo,
                Arc::clone(&post_repo),
                Arc::clone(&user_directory),
            )),
            posts: Arc::new(PostQueryServiceImpl::new(post_repo, user_directory)),
        }
    }
}

impl<P, N, U> Clone for CoreServices<P, N, U>
where
    P: PostRepository,
    N: NotificationRepository,
    U: UserDirectory,
{
    fn clone(&self) -> Self {
        Self {
            interactions: Arc::clone(&self.interactions),
            notifications: Arc::clone(&self.notifications),
            posts: Arc::clone(&self.posts),
        }
    }
}

/// User directory backing the PostgreSQL stack, with or without the Redis cache.
pub enum ProfileDirectory {
    Direct(PgUserDirectory),
    Cached(CachedUserDirectory<PgUserDirectory, RedisCache>),
}

#[async_trait]
impl UserDirectory for ProfileDirectory {
    async fn resolve_by_id(&self, id: i64) -> Result<Option<UserProfile>, AppError> {
        match self {
            Self::Direct(dir) => dir.resolve_by_id(id).await,
            Self::Cached(dir) => dir.resolve_by_id(id).await,
        }
    }

    async fn resolve_by_username(&self, username: &str) -> Result<Option<UserProfile>, AppError> {
        match self {
            Self::Direct(dir) => dir.resolve_by_username(username).await,
            Self::Cached(dir) => dir.resolve_by_username(username).await,
        }
    }

    async fn resolve_many(&self, ids: &[i64]) -> Result<HashMap<i64, UserProfile>, AppError> {
        match self {
            Self::Direct(dir) => dir.resolve_many(ids).await,
            Self::Cached(dir) => dir.resolve_many(ids).await,
        }
    }
}

pub type PgServices = CoreServices<PgPostRepository, PgNotificationRepository, ProfileDirectory>;

/// Engine instance over PostgreSQL and Redis
pub struct Application {
    pool: PgPool,
    services: PgServices,
    settings: Arc<Settings>,
}

impl Application {
    /// Build the engine from settings
    pub async fn build(settings: Settings) -> Result<Self> {
        let pool = database::create_pool(&settings.database).await?;
        tracing::info!("Database connection pool created");

        if settings.database.run_migrations {
            database::run_migrations(&pool).await?;
            tracing::info!("Database migrations applied");
        }

        let pg_directory = PgUserDirectory::new(pool.clone());
        let user_directory = if settings.user_cache.enabled {
            let redis = cache::create_redis_cache(&settings.redis, CACHE_PREFIX).await?;
            tracing::info!(ttl_secs = settings.user_cache.ttl_secs, "User profile cache enabled");
            ProfileDirectory::Cached(CachedUserDirectory::new(
                pg_directory,
                redis,
                settings.user_cache.ttl_secs,
            ))
        } else {
            ProfileDirectory::Direct(pg_directory)
        };

        let id_generator = Arc::new(SnowflakeGenerator::new(
            settings.snowflake.machine_id,
            settings.snowflake.epoch,
        ));

        let services = CoreServices::new(
            Arc::new(PgPostRepository::new(pool.clone())),
            Arc::new(PgNotificationRepository::new(pool.clone())),
            Arc::new(user_directory),
            id_generator,
            &settings.interactions,
        );

        tracing::info!(environment = %settings.environment, "Social engine ready");

        Ok(Self {
            pool,
            services,
            settings: Arc::new(settings),
        })
    }

    pub fn services(&self) -> &PgServices {
        &self.services
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Close the connection pool
    pub async fn shutdown(self) {
        self.pool.close().await;
        tracing::info!("Social engine stopped");
    }
}

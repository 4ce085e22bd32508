//! Engine settings and configuration structures.

use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use crate::shared::snowflake::{DEFAULT_EPOCH, MAX_MACHINE_ID};

/// Root configuration structure containing all engine settings.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Database configuration (PostgreSQL)
    pub database: DatabaseSettings,

    /// Redis configuration
    pub redis: RedisSettings,

    /// Snowflake ID generator settings
    pub snowflake: SnowflakeSettings,

    /// Interaction engine tuning
    pub interactions: InteractionSettings,

    /// Profile cache in front of the user directory
    pub user_cache: UserCacheSettings,

    /// Logging output
    pub telemetry: TelemetrySettings,

    /// Current environment (development, staging, production)
    pub environment: String,
}

/// PostgreSQL database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    /// Database connection URL
    pub url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections to maintain
    pub min_connections: u32,

    /// Connection acquire timeout in seconds
    pub acquire_timeout: u64,

    /// Apply pending migrations during startup
    pub run_migrations: bool,
}

/// Redis configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RedisSettings {
    /// Redis connection URL
    pub url: String,
}

/// Snowflake ID generator configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SnowflakeSettings {
    /// Machine/worker ID (0-1023)
    pub machine_id: u16,

    /// Custom epoch timestamp in milliseconds
    pub epoch: u64,
}

/// Interaction engine configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct InteractionSettings {
    /// How many times an operation is retried after a concurrent-write conflict
    pub conflict_retries: u32,

    /// Longest wait for a per-post lock in the in-memory store, in milliseconds
    pub lock_wait_ms: u64,
}

impl InteractionSettings {
    pub fn lock_wait(&self) -> Duration {
        Duration::from_millis(self.lock_wait_ms)
    }
}

impl Default for InteractionSettings {
    fn default() -> Self {
        Self {
            conflict_retries: 3,
            lock_wait_ms: 500,
        }
    }
}

/// User profile cache configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct UserCacheSettings {
    pub enabled: bool,

    /// Entry lifetime in seconds
    pub ttl_secs: u64,
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelemetrySettings {
    pub log_format: LogFormat,
}

impl Settings {
    /// Load settings from environment variables and configuration files.
    ///
    /// The loading order is:
    /// 1. config/default.toml (base configuration)
    /// 2. config/{RUN_ENV}.toml (environment-specific overrides)
    /// 3. Environment variables (highest priority)
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if configuration cannot be loaded or parsed,
    /// or if the snowflake machine id is out of range.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let environment = std::env::var("RUN_ENV").unwrap_or_else(|_| "development".into());

        Config::builder()
            .set_default("environment", environment.clone())?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default("database.acquire_timeout", 30)?
            .set_default("database.run_migrations", true)?
            .set_default("redis.url", "redis://127.0.0.1:6379")?
            .set_default("snowflake.machine_id", 1)?
            .set_default("snowflake.epoch", DEFAULT_EPOCH)?
            .set_default("interactions.conflict_retries", 3)?
            .set_default("interactions.lock_wait_ms", 500)?
            .set_default("user_cache.enabled", true)?
            .set_default("user_cache.ttl_secs", 300)?
            .set_default("telemetry.log_format", "pretty")?
            // Load from config files
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // APP__INTERACTIONS__CONFLICT_RETRIES=5 -> interactions.conflict_retries = 5
            .add_source(
                Environment::default()
                    .prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            // Map simple environment variables
            .set_override_option("database.url", std::env::var("DATABASE_URL").ok())?
            .set_override_option("redis.url", std::env::var("REDIS_URL").ok())?
            .set_override_option(
                "snowflake.machine_id",
                std::env::var("SNOWFLAKE_MACHINE_ID").ok(),
            )?
            .build()?
            .try_deserialize()
            .and_then(|settings: Self| {
                settings.validate()?;
                Ok(settings)
            })
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.snowflake.machine_id > MAX_MACHINE_ID {
            return Err(ConfigError::Message(format!(
                "snowflake.machine_id must be at most {}, got {}",
                MAX_MACHINE_ID, self.snowflake.machine_id
            )));
        }
        Ok(())
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

//! # Configuration Module
//!
//! Engine configuration loading. Sources, lowest priority first:
//! - Built-in defaults
//! - Configuration files (config/default.toml, config/{environment}.toml)
//! - Environment variables (prefixed with APP__, plus DATABASE_URL, REDIS_URL
//!   and SNOWFLAKE_MACHINE_ID)
//! - .env files (via dotenvy)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use social_engine::config::Settings;
//!
//! let settings = Settings::load()?;
//! println!("Retrying conflicts {} times", settings.interactions.conflict_retries);
//! ```

mod settings;

pub use settings::*;

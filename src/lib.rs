//! # Social Engine
//!
//! Interaction and notification consistency engine for a social feed:
//! - Likes, simple retweets, quote-retweets, comments, shares, edits and deletes
//!   applied atomically to a shared post aggregate
//! - Best-effort notification fan-out that never fails an interaction
//! - Read projections with author, actor and one-hop original resolution
//!
//! ## Architecture
//!
//! - **Domain Layer**: post and notification aggregates, repository traits
//! - **Application Layer**: engine services, projection and DTOs
//! - **Infrastructure Layer**: PostgreSQL, in-memory and Redis implementations
//!
//! ## Module Structure
//!
//! ```text
//! social_engine/
//! +-- config/         Configuration management
//! +-- domain/         Entities and repository traits
//! +-- application/    Services and DTOs
//! +-- infrastructure/ Database, memory store, cache, metrics
//! +-- shared/         Errors, snowflake IDs, validation helpers
//! ```

// Configuration module
pub mod config;

// Domain layer
pub mod domain;

// Application layer - engine services
pub mod application;

// Infrastructure layer - store implementations
pub mod infrastructure;

// Shared utilities
pub mod shared;

// Service wiring
pub mod startup;

// Telemetry and observability
pub mod telemetry;

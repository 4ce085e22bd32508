//! Infrastructure Layer
//!
//! Implementations of the domain traits:
//! - PostgreSQL repositories and the connection pool
//! - In-memory stores for embedding and tests
//! - Redis profile cache
//! - Prometheus metrics

pub mod cache;
pub mod database;
pub mod memory;
pub mod metrics;
pub mod repositories;

//! # Domain Layer
//!
//! Entities, invariants and repository contracts of the interaction engine.
//! Independent of storage and of any transport layer.
//!
//! ## Design Principles
//!
//! - No dependencies on infrastructure
//! - Repository traits define data access contracts; every mutation they
//!   expose is atomic per post
//! - Entities encapsulate their own rules (like toggling, comment removal rights)

pub mod entities;

// Re-export commonly used types
pub use entities::*;

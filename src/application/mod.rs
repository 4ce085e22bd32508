//! Application Layer
//!
//! Engine services and DTOs. Services orchestrate repository calls, the
//! notification fan-out and the projection step.

pub mod dto;
pub mod services;

//! Domain layer
//!
//! Contains the core business logic and domain models.

pub mod access;
pub mod build;
pub mod comments;
pub mod feedback;
pub mod graph;
pub mod metrics;
pub mod session;

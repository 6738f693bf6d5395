//! Infrastructure layer
//!
//! SQLite repositories and the HTTP extraction client.

pub mod access;
pub mod comments;
pub mod extraction;
pub mod feedback;
pub mod graph;
pub mod metrics;
pub mod sessions;

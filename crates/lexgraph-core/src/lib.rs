//! Lexgraph Core Library
//!
//! This crate provides the core functionality for Lexgraph, including:
//! - Graph store (SQLite) for per-session knowledge graphs
//! - Build orchestration against an external extraction service
//! - Ownership and share-based access control
//! - Feedback capture and graph corrections
//! - Daily metrics, accuracy analysis and insights
//! - Threaded comments on graphs, nodes and edges

pub mod api;
pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod storage;

#[cfg(test)]
mod test_support;

pub use error::{Error, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::api::LexGraph;
    pub use crate::config::Config;
    pub use crate::error::{Error, Result};
    pub use crate::storage::Database;
}

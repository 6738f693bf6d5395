//! Storage layer - SQLite
//!
//! Provides database management and migrations for lexgraph.
//!
//! # Architecture
//!
//! - `database`: Connection pool management and initialization
//! - `migrations`: Schema versioning and automatic migration
//! - `timestamp`: Sortable timestamp encoding and day buckets
//!
//! # Usage
//!
//! ```ignore
//! use lexgraph_core::storage::Database;
//!
//! let db = Database::in_memory().await?;
//! ```

pub mod database;
pub mod migrations;
pub mod timestamp;

pub use database::{Database, DatabaseConfig};
pub use migrations::{CURRENT_VERSION, MigrationStatus, migration_status, run_migrations};

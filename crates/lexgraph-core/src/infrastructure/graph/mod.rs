//! Graph store infrastructure
//!
//! SQLite implementation of the graph repository trait.

mod repository;

pub use repository::SqliteGraphRepository;

//! Daily metric and insight persistence

mod repository;

pub use repository::SqliteMetricsRepository;

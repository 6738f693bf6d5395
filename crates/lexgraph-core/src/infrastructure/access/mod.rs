//! Share persistence

mod repository;

pub use repository::SqliteShareRepository;

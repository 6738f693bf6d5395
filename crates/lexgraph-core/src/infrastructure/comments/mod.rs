//! Comment persistence

mod repository;

pub use repository::SqliteCommentRepository;

//! Session source backed by the chat product's tables

mod source;

pub use source::SqliteSessionSource;

//! Collaboration domain
//!
//! Threaded comments on a graph, its nodes or its edges.

mod entity;
mod repository;
mod service;

pub use entity::{
    Comment, CommentFilter, CommentView, MAX_COMMENT_CHARS, NewComment, validate_content,
};
pub use repository::CommentRepository;
pub use service::CommentService;

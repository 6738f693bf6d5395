//! Feedback domain
//!
//! Append-only judgments on nodes and edges, some of which mutate the graph.

mod event;
mod repository;
mod service;

pub use event::{FeedbackEvent, FeedbackSubmission, FeedbackType, MAX_FEEDBACK_COMMENT_CHARS};
pub use repository::FeedbackRepository;
pub use service::{FEEDBACK_HISTORY_LIMIT, FeedbackService};

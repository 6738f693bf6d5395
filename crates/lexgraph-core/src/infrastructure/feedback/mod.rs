//! Feedback event persistence

mod repository;

pub use repository::SqliteFeedbackRepository;

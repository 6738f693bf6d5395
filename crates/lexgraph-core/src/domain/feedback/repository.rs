//! Repository trait for feedback persistence

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;

use super::event::{FeedbackEvent, FeedbackType};

/// Append-only store of feedback events
#[async_trait]
pub trait FeedbackRepository: Send + Sync {
    /// Persist a new event. Events are never updated or deleted.
    async fn append(&self, event: &FeedbackEvent) -> Result<()>;

    /// Events for a session, newest first
    async fn list_for_session(&self, session_id: &str, limit: u32) -> Result<Vec<FeedbackEvent>>;

    /// Events of the given types created at or after `since`, oldest first
    async fn list_since(
        &self,
        since: DateTime<Utc>,
        types: &[FeedbackType],
    ) -> Result<Vec<FeedbackEvent>>;
}

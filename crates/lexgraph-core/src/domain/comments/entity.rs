//! Comment entities

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};

/// Longest comment body accepted
pub const MAX_COMMENT_CHARS: usize = 10_000;

/// A threaded annotation on a graph, node or edge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub graph_id: String,
    pub node_id: Option<String>,
    pub edge_id: Option<String>,
    /// Top-level comment this replies to
    pub parent_id: Option<String>,
    pub user_id: String,
    pub content: String,
    pub resolved: bool,
    pub resolved_at: Option<DateTime<Utc>>,
    pub resolved_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Comment {
    pub fn new(
        graph_id: impl Into<String>,
        user_id: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            graph_id: graph_id.into(),
            node_id: None,
            edge_id: None,
            parent_id: None,
            user_id: user_id.into(),
            content: content.into(),
            resolved: false,
            resolved_at: None,
            resolved_by: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_reply(&self) -> bool {
        self.parent_id.is_some()
    }

    pub fn is_authored_by(&self, user_id: &str) -> bool {
        self.user_id == user_id
    }

    pub fn set_resolved(&mut self, resolved: bool, by: &str) {
        let now = Utc::now();
        self.resolved = resolved;
        if resolved {
            self.resolved_at = Some(now);
            self.resolved_by = Some(by.to_string());
        } else {
            self.resolved_at = None;
            self.resolved_by = None;
        }
        self.updated_at = now;
    }
}

/// Trimmed comment body, or a ValidationError
pub fn validate_content(content: &str) -> Result<String> {
    let content = content.trim();
    if content.is_empty() {
        return Err(Error::invalid("Comment content must not be empty"));
    }
    if content.chars().count() > MAX_COMMENT_CHARS {
        return Err(Error::invalid(format!(
            "Comment content must be at most {} characters",
            MAX_COMMENT_CHARS
        )));
    }
    Ok(content.to_string())
}

/// A comment as submitted by a caller
#[derive(Debug, Clone, Default)]
pub struct NewComment {
    pub node_id: Option<String>,
    pub edge_id: Option<String>,
    pub parent_id: Option<String>,
    pub content: String,
}

/// Narrow a listing to one node or edge
#[derive(Debug, Clone, Default)]
pub struct CommentFilter {
    pub node_id: Option<String>,
    pub edge_id: Option<String>,
}

/// A listed comment with its reference state resolved at read time
#[derive(Debug, Clone, Serialize)]
pub struct CommentView {
    #[serde(flatten)]
    pub comment: Comment,
    /// The referenced node or edge no longer exists
    pub stale: bool,
}

//! Comments API

use serde::{Deserialize, Serialize};

use crate::domain::comments::{Comment, CommentFilter, CommentView, NewComment};
use crate::error::{Error, Result};

use super::LexGraph;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentRequest {
    pub node_id: Option<String>,
    pub edge_id: Option<String>,
    pub parent_id: Option<String>,
    pub content: String,
}

impl From<CommentRequest> for NewComment {
    fn from(req: CommentRequest) -> Self {
        Self {
            node_id: req.node_id,
            edge_id: req.edge_id,
            parent_id: req.parent_id,
            content: req.content,
        }
    }
}

/// Partial update; content and resolution may change together
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentUpdate {
    pub content: Option<String>,
    pub resolved: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentDto {
    pub id: String,
    pub node_id: Option<String>,
    pub edge_id: Option<String>,
    pub parent_id: Option<String>,
    pub user_id: String,
    pub content: String,
    pub resolved: bool,
    pub resolved_at: Option<String>,
    pub resolved_by: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    /// Anchor node or edge no longer exists
    pub stale: bool,
}

impl From<Comment> for CommentDto {
    fn from(c: Comment) -> Self {
        Self {
            id: c.id,
            node_id: c.node_id,
            edge_id: c.edge_id,
            parent_id: c.parent_id,
            user_id: c.user_id,
            content: c.content,
            resolved: c.resolved,
            resolved_at: c.resolved_at.map(|t| t.to_rfc3339()),
            resolved_by: c.resolved_by,
            created_at: c.created_at.to_rfc3339(),
            updated_at: c.updated_at.to_rfc3339(),
            stale: false,
        }
    }
}

impl From<CommentView> for CommentDto {
    fn from(view: CommentView) -> Self {
        let stale = view.stale;
        Self {
            stale,
            ..Self::from(view.comment)
        }
    }
}

impl LexGraph {
    pub async fn list_comments(
        &self,
        session_id: &str,
        actor_id: &str,
        filter: CommentFilter,
    ) -> Result<Vec<CommentDto>> {
        let views = self
            .comments
            .list_comments(session_id, actor_id, &filter)
            .await?;
        Ok(views.into_iter().map(CommentDto::from).collect())
    }

    pub async fn create_comment(
        &self,
        session_id: &str,
        actor_id: &str,
        request: CommentRequest,
    ) -> Result<CommentDto> {
        let comment = self
            .comments
            .create_comment(session_id, actor_id, request.into())
            .await?;
        Ok(comment.into())
    }

    pub async fn update_comment(
        &self,
        session_id: &str,
        actor_id: &str,
        comment_id: &str,
        update: CommentUpdate,
    ) -> Result<CommentDto> {
        if update.content.is_none() && update.resolved.is_none() {
            return Err(Error::invalid("Nothing to update"));
        }

        let mut updated = None;
        if let Some(content) = &update.content {
            updated = Some(
                self.comments
                    .update_content(session_id, actor_id, comment_id, content)
                    .await?,
            );
        }
        if let Some(resolved) = update.resolved {
            updated = Some(
                self.comments
                    .set_resolved(session_id, actor_id, comment_id, resolved)
                    .await?,
            );
        }

        updated
            .map(CommentDto::from)
            .ok_or_else(|| Error::not_found("comment", comment_id))
    }

    /// Returns how many comments were removed, replies included
    pub async fn delete_comment(
        &self,
        session_id: &str,
        actor_id: &str,
        comment_id: &str,
    ) -> Result<u64> {
        self.comments
            .delete_comment(session_id, actor_id, comment_id)
            .await
    }
}

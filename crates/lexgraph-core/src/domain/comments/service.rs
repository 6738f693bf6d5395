//! Comment service
//!
//! Who may do what:
//! - list: VIEW
//! - create: COMMENT
//! - edit content: the author, while they can still comment
//! - resolve/unresolve: the author, the owner, or an EDIT share
//! - delete: the author or the owner

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use crate::domain::access::{AccessGrant, AccessResolver, Action};
use crate::domain::graph::GraphRepository;
use crate::error::{Error, Result};

use super::entity::{Comment, CommentFilter, CommentView, NewComment, validate_content};
use super::repository::CommentRepository;

pub struct CommentService {
    comments: Arc<dyn CommentRepository>,
    graphs: Arc<dyn GraphRepository>,
    access: Arc<AccessResolver>,
}

impl CommentService {
    pub fn new(
        comments: Arc<dyn CommentRepository>,
        graphs: Arc<dyn GraphRepository>,
        access: Arc<AccessResolver>,
    ) -> Self {
        Self {
            comments,
            graphs,
            access,
        }
    }

    pub async fn list_comments(
        &self,
        session_id: &str,
        actor_id: &str,
        filter: &CommentFilter,
    ) -> Result<Vec<CommentView>> {
        let grant = self
            .access
            .authorize(session_id, actor_id, Action::ViewGraph)
            .await?;
        let Some(graph) = grant.graph else {
            return Ok(Vec::new());
        };

        let comments = self.comments.list_comments(&graph.id, filter).await?;

        let node_ids: HashSet<String> = self
            .graphs
            .list_nodes(session_id)
            .await?
            .into_iter()
            .map(|n| n.id)
            .collect();
        let edge_ids: HashSet<String> = self
            .graphs
            .list_edges(session_id)
            .await?
            .into_iter()
            .map(|e| e.id)
            .collect();

        Ok(comments
            .into_iter()
            .map(|comment| {
                let stale = comment.node_id.as_ref().is_some_and(|id| !node_ids.contains(id))
                    || comment.edge_id.as_ref().is_some_and(|id| !edge_ids.contains(id));
                CommentView { comment, stale }
            })
            .collect())
    }

    pub async fn create_comment(
        &self,
        session_id: &str,
        actor_id: &str,
        request: NewComment,
    ) -> Result<Comment> {
        let content = validate_content(&request.content)?;
        if request.node_id.is_some() && request.edge_id.is_some() {
            return Err(Error::invalid("A comment may reference a node or an edge, not both"));
        }

        let grant = self
            .access
            .authorize(session_id, actor_id, Action::Comment)
            .await?;
        let graph_id = grant.require_graph()?.id.clone();

        let mut comment = Comment::new(&graph_id, actor_id, content);
        comment.node_id = request.node_id;
        comment.edge_id = request.edge_id;

        if let Some(parent_id) = request.parent_id {
            let parent = self
                .comments
                .get_comment(&graph_id, &parent_id)
                .await?
                .ok_or_else(|| Error::not_found("comment", &parent_id))?;
            if parent.is_reply() {
                return Err(Error::invalid("Replies can only target top-level comments"));
            }
            // A reply shares its parent's anchor
            let anchored = comment.node_id.is_some() || comment.edge_id.is_some();
            if anchored && (comment.node_id != parent.node_id || comment.edge_id != parent.edge_id)
            {
                return Err(Error::invalid("A reply must reference the same node or edge as its parent"));
            }
            comment.node_id = parent.node_id;
            comment.edge_id = parent.edge_id;
            comment.parent_id = Some(parent.id);
        }

        if let Some(node_id) = &comment.node_id {
            if self.graphs.get_node(&graph_id, node_id).await?.is_none() {
                return Err(Error::not_found("node", node_id));
            }
        }
        if let Some(edge_id) = &comment.edge_id {
            if self.graphs.get_edge(&graph_id, edge_id).await?.is_none() {
                return Err(Error::not_found("edge", edge_id));
            }
        }

        self.comments.create_comment(&comment).await?;
        info!(
            comment_id = %comment.id,
            session_id = %session_id,
            reply = comment.is_reply(),
            "Comment created"
        );
        Ok(comment)
    }

    /// Replace the body of a comment; author only
    pub async fn update_content(
        &self,
        session_id: &str,
        actor_id: &str,
        comment_id: &str,
        content: &str,
    ) -> Result<Comment> {
        let content = validate_content(content)?;
        let (_, mut comment) = self.load(session_id, actor_id, comment_id, Action::Comment).await?;

        if !comment.is_authored_by(actor_id) {
            return Err(Error::denied("Only the author can edit a comment"));
        }

        comment.content = content;
        comment.updated_at = Utc::now();
        self.comments.update_comment(&comment).await?;
        Ok(comment)
    }

    pub async fn set_resolved(
        &self,
        session_id: &str,
        actor_id: &str,
        comment_id: &str,
        resolved: bool,
    ) -> Result<Comment> {
        let (grant, mut comment) = self
            .load(session_id, actor_id, comment_id, Action::ViewGraph)
            .await?;

        let may_resolve = grant.level.allows(Action::MutateGraph)
            || (comment.is_authored_by(actor_id) && grant.level.allows(Action::Comment));
        if !may_resolve {
            return Err(Error::denied(
                "Only the author, the owner or an editor can resolve a comment",
            ));
        }

        comment.set_resolved(resolved, actor_id);
        self.comments.update_comment(&comment).await?;
        info!(comment_id = %comment_id, resolved = resolved, "Comment resolution changed");
        Ok(comment)
    }

    /// Delete a comment; a top-level comment takes its replies with it
    pub async fn delete_comment(
        &self,
        session_id: &str,
        actor_id: &str,
        comment_id: &str,
    ) -> Result<u64> {
        let (grant, comment) = self
            .load(session_id, actor_id, comment_id, Action::ViewGraph)
            .await?;

        let may_delete = grant.level.is_owner()
            || (comment.is_authored_by(actor_id) && grant.level.allows(Action::Comment));
        if !may_delete {
            return Err(Error::denied("Only the author or the owner can delete a comment"));
        }

        let removed = self
            .comments
            .delete_comment(&comment.graph_id, &comment.id)
            .await?;
        info!(comment_id = %comment_id, removed = removed, "Comment deleted");
        Ok(removed)
    }

    async fn load(
        &self,
        session_id: &str,
        actor_id: &str,
        comment_id: &str,
        action: Action,
    ) -> Result<(AccessGrant, Comment)> {
        let grant = self.access.authorize(session_id, actor_id, action).await?;
        let graph_id = grant.require_graph()?.id.clone();
        let comment = self
            .comments
            .get_comment(&graph_id, comment_id)
            .await?
            .ok_or_else(|| Error::not_found("comment", comment_id))?;
        Ok((grant, comment))
    }
}

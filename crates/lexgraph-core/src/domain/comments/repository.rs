//! Repository trait for comment persistence

use async_trait::async_trait;

use crate::error::Result;

use super::entity::{Comment, CommentFilter};

#[async_trait]
pub trait CommentRepository: Send + Sync {
    async fn create_comment(&self, comment: &Comment) -> Result<()>;

    async fn get_comment(&self, graph_id: &str, comment_id: &str) -> Result<Option<Comment>>;

    /// Comments of a graph, oldest first
    async fn list_comments(&self, graph_id: &str, filter: &CommentFilter) -> Result<Vec<Comment>>;

    /// Persist content and resolution fields
    async fn update_comment(&self, comment: &Comment) -> Result<()>;

    /// Delete a comment and its replies in one transaction. Returns rows removed.
    async fn delete_comment(&self, graph_id: &str, comment_id: &str) -> Result<u64>;
}

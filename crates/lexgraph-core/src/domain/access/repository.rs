//! Repository trait for share persistence

use async_trait::async_trait;

use crate::error::Result;

use super::share::Share;

#[async_trait]
pub trait ShareRepository: Send + Sync {
    /// Persist a new share
    async fn create_share(&self, share: &Share) -> Result<()>;

    /// All shares of a graph, expired ones included, newest first
    async fn list_shares(&self, graph_id: &str) -> Result<Vec<Share>>;

    /// Shares naming `user_id` as recipient
    async fn list_shares_for_user(&self, graph_id: &str, user_id: &str) -> Result<Vec<Share>>;

    async fn find_by_token(&self, token: &str) -> Result<Option<Share>>;

    /// Delete a share of the given graph
    async fn delete_share(&self, graph_id: &str, share_id: &str) -> Result<bool>;
}

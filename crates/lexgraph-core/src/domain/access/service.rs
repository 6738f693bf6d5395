//! Share management
//!
//! Only the session owner may create, list or revoke shares.

use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::info;

use crate::error::{Error, Result};

use super::level::{Action, ShareAccess};
use super::repository::ShareRepository;
use super::resolver::AccessResolver;
use super::share::Share;

/// Longest expiry a share may be created with
pub const MAX_SHARE_DAYS: i64 = 365;

/// Request to share a graph
#[derive(Debug, Clone)]
pub struct ShareRequest {
    /// Recipient user; `None` creates a link-only share
    pub shared_with_id: Option<String>,
    pub access: ShareAccess,
    pub expires_in_days: Option<i64>,
}

/// A created share together with its shareable link
#[derive(Debug, Clone)]
pub struct CreatedShare {
    pub share: Share,
    pub link: String,
}

pub struct ShareService {
    shares: Arc<dyn ShareRepository>,
    access: Arc<AccessResolver>,
    link_base_url: String,
    token_bytes: usize,
}

impl ShareService {
    pub fn new(
        shares: Arc<dyn ShareRepository>,
        access: Arc<AccessResolver>,
        link_base_url: impl Into<String>,
        token_bytes: usize,
    ) -> Self {
        Self {
            shares,
            access,
            link_base_url: link_base_url.into(),
            token_bytes,
        }
    }

    /// Link a token holder opens to view the shared graph
    pub fn share_link(&self, token: &str) -> String {
        format!(
            "{}/shared/graph/{}",
            self.link_base_url.trim_end_matches('/'),
            token
        )
    }

    pub async fn create_share(
        &self,
        session_id: &str,
        actor_id: &str,
        request: ShareRequest,
    ) -> Result<CreatedShare> {
        let grant = self.access.authorize(session_id, actor_id, Action::Manage).await?;
        let graph = grant.require_graph()?;

        let mut share = Share::new(&graph.id, request.access, actor_id, self.token_bytes);

        if let Some(recipient) = request.shared_with_id {
            let recipient = recipient.trim();
            if recipient.is_empty() {
                return Err(Error::invalid("sharedWithId must not be blank"));
            }
            if grant.session.is_owned_by(recipient) {
                return Err(Error::invalid("Cannot share a graph with its owner"));
            }
            share = share.with_recipient(recipient);
        }

        if let Some(days) = request.expires_in_days {
            if !(1..=MAX_SHARE_DAYS).contains(&days) {
                return Err(Error::invalid(format!(
                    "expiresInDays must be between 1 and {}",
                    MAX_SHARE_DAYS
                )));
            }
            share = share.with_expiry(Utc::now() + Duration::days(days));
        }

        self.shares.create_share(&share).await?;

        info!(
            session_id = %session_id,
            share_id = %share.id,
            access = share.access.as_str(),
            link_only = share.shared_with_id.is_none(),
            "Share created"
        );

        let link = self.share_link(&share.token);
        Ok(CreatedShare { share, link })
    }

    pub async fn list_shares(&self, session_id: &str, actor_id: &str) -> Result<Vec<Share>> {
        let grant = self.access.authorize(session_id, actor_id, Action::Manage).await?;
        let Some(graph) = grant.graph else {
            return Ok(Vec::new());
        };
        self.shares.list_shares(&graph.id).await
    }

    pub async fn revoke_share(&self, session_id: &str, actor_id: &str, share_id: &str) -> Result<()> {
        let grant = self.access.authorize(session_id, actor_id, Action::Manage).await?;
        let graph = grant.require_graph()?;

        if !self.shares.delete_share(&graph.id, share_id).await? {
            return Err(Error::not_found("share", share_id));
        }

        info!(session_id = %session_id, share_id = %share_id, "Share revoked");
        Ok(())
    }
}

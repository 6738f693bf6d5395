//! Shares API

use serde::{Deserialize, Serialize};

use crate::domain::access::{CreatedShare, Share, ShareAccess, ShareRequest};
use crate::error::{Error, Result};

use super::LexGraph;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareRequestDto {
    /// Recipient; absent for a link share
    pub shared_with_id: Option<String>,
    /// `VIEW`, `COMMENT` or `EDIT`
    pub access: String,
    pub expires_in_days: Option<i64>,
}

impl TryFrom<ShareRequestDto> for ShareRequest {
    type Error = Error;

    fn try_from(req: ShareRequestDto) -> Result<Self> {
        let access = ShareAccess::parse(&req.access)
            .ok_or_else(|| Error::invalid(format!("Unknown access level: {}", req.access)))?;
        Ok(Self {
            shared_with_id: req.shared_with_id,
            access,
            expires_in_days: req.expires_in_days,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareDto {
    pub id: String,
    pub shared_with_id: Option<String>,
    pub access: String,
    pub token: String,
    pub link: String,
    pub expires_at: Option<String>,
    pub expired: bool,
    pub created_by: String,
    pub created_at: String,
}

impl ShareDto {
    fn new(share: Share, link: String) -> Self {
        Self {
            expired: !share.is_active(),
            id: share.id,
            shared_with_id: share.shared_with_id,
            access: share.access.as_str().to_string(),
            token: share.token,
            link,
            expires_at: share.expires_at.map(|t| t.to_rfc3339()),
            created_by: share.created_by,
            created_at: share.created_at.to_rfc3339(),
        }
    }
}

impl From<CreatedShare> for ShareDto {
    fn from(created: CreatedShare) -> Self {
        Self::new(created.share, created.link)
    }
}

impl LexGraph {
    pub async fn create_share(
        &self,
        session_id: &str,
        actor_id: &str,
        request: ShareRequestDto,
    ) -> Result<ShareDto> {
        let request = ShareRequest::try_from(request)?;
        let created = self
            .shares
            .create_share(session_id, actor_id, request)
            .await?;
        Ok(created.into())
    }

    /// All shares of a graph, expired ones included
    pub async fn list_shares(&self, session_id: &str, actor_id: &str) -> Result<Vec<ShareDto>> {
        let shares = self.shares.list_shares(session_id, actor_id).await?;
        Ok(shares
            .into_iter()
            .map(|share| {
                let link = self.shares.share_link(&share.token);
                ShareDto::new(share, link)
            })
            .collect())
    }

    pub async fn revoke_share(&self, session_id: &str, actor_id: &str, share_id: &str) -> Result<()> {
        self.shares.revoke_share(session_id, actor_id, share_id).await
    }
}

//! Share grants

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use rand::RngCore;
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::level::ShareAccess;

/// A grant of access on a graph to a user, or to anyone holding the token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Share {
    pub id: String,
    pub graph_id: String,
    /// `None` means link-only access via the token
    pub shared_with_id: Option<String>,
    pub access: ShareAccess,
    pub token: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

impl Share {
    /// Create a share with a fresh random token
    pub fn new(
        graph_id: impl Into<String>,
        access: ShareAccess,
        created_by: impl Into<String>,
        token_bytes: usize,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            graph_id: graph_id.into(),
            shared_with_id: None,
            access,
            token: generate_token(token_bytes),
            expires_at: None,
            created_by: created_by.into(),
            created_at: Utc::now(),
        }
    }

    pub fn with_recipient(mut self, user_id: impl Into<String>) -> Self {
        self.shared_with_id = Some(user_id.into());
        self
    }

    pub fn with_expiry(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    /// Expired shares stay in storage but grant nothing
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires| expires <= now)
    }

    pub fn is_active(&self) -> bool {
        !self.is_expired_at(Utc::now())
    }
}

/// Unguessable URL-safe token from the OS random source
pub fn generate_token(bytes: usize) -> String {
    let mut buf = vec![0u8; bytes];
    OsRng.fill_bytes(&mut buf);
    URL_SAFE_NO_PAD.encode(&buf)
}

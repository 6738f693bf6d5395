//! SQLite implementation of the ShareRepository

use async_trait::async_trait;
use sqlx::{FromRow, SqlitePool};
use tracing::debug;

use crate::domain::access::{Share, ShareAccess, ShareRepository};
use crate::error::{Error, Result};
use crate::storage::timestamp;

#[derive(Clone)]
pub struct SqliteShareRepository {
    pool: SqlitePool,
}

impl SqliteShareRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ShareRepository for SqliteShareRepository {
    async fn create_share(&self, share: &Share) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO graph_shares (
                id, graph_id, shared_with_id, access, token, expires_at, created_by, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&share.id)
        .bind(&share.graph_id)
        .bind(&share.shared_with_id)
        .bind(share.access.as_str())
        .bind(&share.token)
        .bind(share.expires_at.as_ref().map(timestamp::encode))
        .bind(&share.created_by)
        .bind(timestamp::encode(&share.created_at))
        .execute(&self.pool)
        .await?;

        debug!(share_id = %share.id, graph_id = %share.graph_id, "Share saved");
        Ok(())
    }

    async fn list_shares(&self, graph_id: &str) -> Result<Vec<Share>> {
        let rows: Vec<ShareRow> = sqlx::query_as(
            "SELECT * FROM graph_shares WHERE graph_id = ? ORDER BY created_at DESC",
        )
        .bind(graph_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(|r| r.into_share()).collect()
    }

    async fn list_shares_for_user(&self, graph_id: &str, user_id: &str) -> Result<Vec<Share>> {
        let rows: Vec<ShareRow> = sqlx::query_as(
            "SELECT * FROM graph_shares WHERE graph_id = ? AND shared_with_id = ?",
        )
        .bind(graph_id)
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(|r| r.into_share()).collect()
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<Share>> {
        let row: Option<ShareRow> = sqlx::query_as("SELECT * FROM graph_shares WHERE token = ?")
            .bind(token)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| r.into_share()).transpose()
    }

    async fn delete_share(&self, graph_id: &str, share_id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM graph_shares WHERE id = ? AND graph_id = ?")
            .bind(share_id)
            .bind(graph_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[derive(Debug, FromRow)]
struct ShareRow {
    id: String,
    graph_id: String,
    shared_with_id: Option<String>,
    access: String,
    token: String,
    expires_at: Option<String>,
    created_by: String,
    created_at: String,
}

impl ShareRow {
    fn into_share(self) -> Result<Share> {
        let access = ShareAccess::parse(&self.access)
            .ok_or_else(|| Error::Other(format!("Invalid share access: {}", self.access)))?;

        Ok(Share {
            id: self.id,
            graph_id: self.graph_id,
            shared_with_id: self.shared_with_id,
            access,
            token: self.token,
            expires_at: timestamp::decode_opt(self.expires_at.as_deref())?,
            created_by: self.created_by,
            created_at: timestamp::decode(&self.created_at)?,
        })
    }
}

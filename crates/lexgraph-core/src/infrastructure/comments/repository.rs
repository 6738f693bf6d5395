//! SQLite implementation of the CommentRepository

use async_trait::async_trait;
use sqlx::{FromRow, QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;

use crate::domain::comments::{Comment, CommentFilter, CommentRepository};
use crate::error::Result;
use crate::storage::timestamp;

#[derive(Clone)]
pub struct SqliteCommentRepository {
    pool: SqlitePool,
}

impl SqliteCommentRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CommentRepository for SqliteCommentRepository {
    async fn create_comment(&self, comment: &Comment) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO graph_comments (
                id, graph_id, node_id, edge_id, parent_id, user_id, content,
                resolved, resolved_at, resolved_by, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&comment.id)
        .bind(&comment.graph_id)
        .bind(&comment.node_id)
        .bind(&comment.edge_id)
        .bind(&comment.parent_id)
        .bind(&comment.user_id)
        .bind(&comment.content)
        .bind(comment.resolved)
        .bind(comment.resolved_at.as_ref().map(timestamp::encode))
        .bind(&comment.resolved_by)
        .bind(timestamp::encode(&comment.created_at))
        .bind(timestamp::encode(&comment.updated_at))
        .execute(&self.pool)
        .await?;

        debug!(comment_id = %comment.id, graph_id = %comment.graph_id, "Comment saved");
        Ok(())
    }

    async fn get_comment(&self, graph_id: &str, comment_id: &str) -> Result<Option<Comment>> {
        let row: Option<CommentRow> =
            sqlx::query_as("SELECT * FROM graph_comments WHERE id = ? AND graph_id = ?")
                .bind(comment_id)
                .bind(graph_id)
                .fetch_optional(&self.pool)
                .await?;

        row.map(|r| r.into_comment()).transpose()
    }

    async fn list_comments(&self, graph_id: &str, filter: &CommentFilter) -> Result<Vec<Comment>> {
        let mut query: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT * FROM graph_comments WHERE graph_id = ");
        query.push_bind(graph_id);
        if let Some(node_id) = &filter.node_id {
            query.push(" AND node_id = ").push_bind(node_id.as_str());
        }
        if let Some(edge_id) = &filter.edge_id {
            query.push(" AND edge_id = ").push_bind(edge_id.as_str());
        }
        query.push(" ORDER BY created_at, rowid");

        let rows: Vec<CommentRow> = query.build_query_as().fetch_all(&self.pool).await?;
        rows.into_iter().map(|r| r.into_comment()).collect()
    }

    async fn update_comment(&self, comment: &Comment) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE graph_comments SET
                content = ?,
                resolved = ?,
                resolved_at = ?,
                resolved_by = ?,
                updated_at = ?
            WHERE id = ? AND graph_id = ?
            "#,
        )
        .bind(&comment.content)
        .bind(comment.resolved)
        .bind(comment.resolved_at.as_ref().map(timestamp::encode))
        .bind(&comment.resolved_by)
        .bind(timestamp::encode(&comment.updated_at))
        .bind(&comment.id)
        .bind(&comment.graph_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete_comment(&self, graph_id: &str, comment_id: &str) -> Result<u64> {
        let mut tx = self.pool.begin().await?;

        let replies = sqlx::query("DELETE FROM graph_comments WHERE parent_id = ? AND graph_id = ?")
            .bind(comment_id)
            .bind(graph_id)
            .execute(&mut *tx)
            .await?;
        let comment = sqlx::query("DELETE FROM graph_comments WHERE id = ? AND graph_id = ?")
            .bind(comment_id)
            .bind(graph_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(replies.rows_affected() + comment.rows_affected())
    }
}

#[derive(Debug, FromRow)]
struct CommentRow {
    id: String,
    graph_id: String,
    node_id: Option<String>,
    edge_id: Option<String>,
    parent_id: Option<String>,
    user_id: String,
    content: String,
    resolved: bool,
    resolved_at: Option<String>,
    resolved_by: Option<String>,
    created_at: String,
    updated_at: String,
}

impl CommentRow {
    fn into_comment(self) -> Result<Comment> {
        Ok(Comment {
            id: self.id,
            graph_id: self.graph_id,
            node_id: self.node_id,
            edge_id: self.edge_id,
            parent_id: self.parent_id,
            user_id: self.user_id,
            content: self.content,
            resolved: self.resolved,
            resolved_at: timestamp::decode_opt(self.resolved_at.as_deref())?,
            resolved_by: self.resolved_by,
            created_at: timestamp::decode(&self.created_at)?,
            updated_at: timestamp::decode(&self.updated_at)?,
        })
    }
}

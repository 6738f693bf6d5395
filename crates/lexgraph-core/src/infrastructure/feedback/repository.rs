//! SQLite implementation of the FeedbackRepository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;

use crate::domain::feedback::{FeedbackEvent, FeedbackRepository, FeedbackType};
use crate::error::{Error, Result};
use crate::storage::timestamp;

#[derive(Clone)]
pub struct SqliteFeedbackRepository {
    pool: SqlitePool,
}

impl SqliteFeedbackRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn encode_value(value: &Option<serde_json::Value>) -> Result<Option<String>> {
    value
        .as_ref()
        .map(serde_json::to_string)
        .transpose()
        .map_err(Error::from)
}

#[async_trait]
impl FeedbackRepository for SqliteFeedbackRepository {
    async fn append(&self, event: &FeedbackEvent) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO feedback_events (
                id, session_id, node_id, edge_id, feedback_type, original_value,
                corrected_value, rating, comment, user_id, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&event.id)
        .bind(&event.session_id)
        .bind(&event.node_id)
        .bind(&event.edge_id)
        .bind(event.feedback_type.as_str())
        .bind(encode_value(&event.original_value)?)
        .bind(encode_value(&event.corrected_value)?)
        .bind(event.rating)
        .bind(&event.comment)
        .bind(&event.user_id)
        .bind(timestamp::encode(&event.created_at))
        .execute(&self.pool)
        .await?;

        debug!(feedback_id = %event.id, session_id = %event.session_id, "Feedback event appended");
        Ok(())
    }

    async fn list_for_session(&self, session_id: &str, limit: u32) -> Result<Vec<FeedbackEvent>> {
        let rows: Vec<FeedbackRow> = sqlx::query_as(
            r#"
            SELECT * FROM feedback_events
            WHERE session_id = ?
            ORDER BY created_at DESC, rowid DESC
            LIMIT ?
            "#,
        )
        .bind(session_id)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(|r| r.into_event()).collect()
    }

    async fn list_since(
        &self,
        since: DateTime<Utc>,
        types: &[FeedbackType],
    ) -> Result<Vec<FeedbackEvent>> {
        if types.is_empty() {
            return Ok(Vec::new());
        }

        let mut query: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT * FROM feedback_events WHERE created_at >= ");
        query.push_bind(timestamp::encode(&since));
        query.push(" AND feedback_type IN (");
        let mut separated = query.separated(", ");
        for feedback_type in types {
            separated.push_bind(feedback_type.as_str());
        }
        separated.push_unseparated(") ORDER BY created_at, rowid");

        let rows: Vec<FeedbackRow> = query.build_query_as().fetch_all(&self.pool).await?;
        rows.into_iter().map(|r| r.into_event()).collect()
    }
}

#[derive(Debug, FromRow)]
struct FeedbackRow {
    id: String,
    session_id: String,
    node_id: Option<String>,
    edge_id: Option<String>,
    feedback_type: String,
    original_value: Option<String>,
    corrected_value: Option<String>,
    rating: Option<i64>,
    comment: Option<String>,
    user_id: String,
    created_at: String,
}

impl FeedbackRow {
    fn into_event(self) -> Result<FeedbackEvent> {
        let feedback_type = FeedbackType::parse(&self.feedback_type)
            .ok_or_else(|| Error::Other(format!("Invalid feedback type: {}", self.feedback_type)))?;

        Ok(FeedbackEvent {
            id: self.id,
            session_id: self.session_id,
            node_id: self.node_id,
            edge_id: self.edge_id,
            feedback_type,
            original_value: self
                .original_value
                .as_deref()
                .map(serde_json::from_str)
                .transpose()?,
            corrected_value: self
                .corrected_value
                .as_deref()
                .map(serde_json::from_str)
                .transpose()?,
            rating: self.rating,
            comment: self.comment,
            user_id: self.user_id,
            created_at: timestamp::decode(&self.created_at)?,
        })
    }
}

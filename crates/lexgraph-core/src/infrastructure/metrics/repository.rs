//! SQLite implementation of the MetricsRepository

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use sqlx::{FromRow, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::domain::feedback::FeedbackType;
use crate::domain::metrics::{DailyMetric, Insight, InsightSeverity, MetricsRepository, NewInsight};
use crate::error::{Error, Result};
use crate::storage::timestamp;

#[derive(Clone)]
pub struct SqliteMetricsRepository {
    pool: SqlitePool,
}

impl SqliteMetricsRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

/// Per-counter increments for one feedback event: (accept, reject, edit, delete)
fn increments(feedback_type: FeedbackType) -> (i64, i64, i64, i64) {
    match feedback_type {
        FeedbackType::Accept => (1, 0, 0, 0),
        FeedbackType::Reject => (0, 1, 0, 0),
        FeedbackType::Edit => (0, 0, 1, 0),
        FeedbackType::DeleteNode | FeedbackType::DeleteEdge => (0, 0, 0, 1),
        FeedbackType::Rate => (0, 0, 0, 0),
    }
}

#[async_trait]
impl MetricsRepository for SqliteMetricsRepository {
    // ========== Daily Metrics ==========

    async fn record_feedback(&self, feedback_type: FeedbackType, day: NaiveDate) -> Result<()> {
        let (accept, reject, edit, delete) = increments(feedback_type);

        sqlx::query(
            r#"
            INSERT INTO daily_feedback_metrics (
                date, total_feedback, accept_count, reject_count, edit_count, delete_count
            ) VALUES (?, 1, ?, ?, ?, ?)
            ON CONFLICT(date) DO UPDATE SET
                total_feedback = total_feedback + 1,
                accept_count = accept_count + excluded.accept_count,
                reject_count = reject_count + excluded.reject_count,
                edit_count = edit_count + excluded.edit_count,
                delete_count = delete_count + excluded.delete_count
            "#,
        )
        .bind(day.format("%Y-%m-%d").to_string())
        .bind(accept)
        .bind(reject)
        .bind(edit)
        .bind(delete)
        .execute(&self.pool)
        .await?;

        debug!(day = %day, feedback_type = %feedback_type, "Daily metric incremented");
        Ok(())
    }

    async fn daily_metrics_since(&self, start: NaiveDate) -> Result<Vec<DailyMetric>> {
        let rows: Vec<DailyMetricRow> = sqlx::query_as(
            "SELECT * FROM daily_feedback_metrics WHERE date >= ? ORDER BY date",
        )
        .bind(start.format("%Y-%m-%d").to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(|r| r.into_metric()).collect()
    }

    // ========== Insights ==========

    async fn create_insight(&self, insight: &NewInsight) -> Result<Insight> {
        let created = new_insight(insight);

        sqlx::query(
            r#"
            INSERT INTO insights (
                id, insight_type, title, description, severity, actionable, resolved, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, 0, ?)
            "#,
        )
        .bind(&created.id)
        .bind(&created.insight_type)
        .bind(&created.title)
        .bind(&created.description)
        .bind(created.severity.as_str())
        .bind(created.actionable)
        .bind(timestamp::encode(&created.created_at))
        .execute(&self.pool)
        .await?;

        Ok(created)
    }

    async fn create_insight_if_absent(&self, insight: &NewInsight) -> Result<Option<Insight>> {
        let created = new_insight(insight);

        let result = sqlx::query(
            r#"
            INSERT INTO insights (
                id, insight_type, title, description, severity, actionable, resolved, created_at
            )
            SELECT ?, ?, ?, ?, ?, ?, 0, ?
            WHERE NOT EXISTS (SELECT 1 FROM insights WHERE title = ? AND resolved = 0)
            "#,
        )
        .bind(&created.id)
        .bind(&created.insight_type)
        .bind(&created.title)
        .bind(&created.description)
        .bind(created.severity.as_str())
        .bind(created.actionable)
        .bind(timestamp::encode(&created.created_at))
        .bind(&created.title)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            debug!(title = %created.title, "Unresolved insight already exists, skipping");
            return Ok(None);
        }
        Ok(Some(created))
    }

    async fn resolve_insight(&self, id: &str) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE insights SET resolved = 1, resolved_at = COALESCE(resolved_at, ?) WHERE id = ?",
        )
        .bind(timestamp::encode(&Utc::now()))
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_insights(&self, include_resolved: bool) -> Result<Vec<Insight>> {
        let sql = if include_resolved {
            "SELECT * FROM insights ORDER BY created_at DESC"
        } else {
            "SELECT * FROM insights WHERE resolved = 0 ORDER BY created_at DESC"
        };

        let rows: Vec<InsightRow> = sqlx::query_as(sql).fetch_all(&self.pool).await?;
        rows.into_iter().map(|r| r.into_insight()).collect()
    }
}

fn new_insight(insight: &NewInsight) -> Insight {
    Insight {
        id: Uuid::new_v4().to_string(),
        insight_type: insight.insight_type.trim().to_string(),
        title: insight.title.trim().to_string(),
        description: insight.description.clone(),
        severity: insight.severity,
        actionable: insight.actionable,
        resolved: false,
        resolved_at: None,
        created_at: Utc::now(),
    }
}

#[derive(Debug, FromRow)]
struct DailyMetricRow {
    date: String,
    total_feedback: i64,
    accept_count: i64,
    reject_count: i64,
    edit_count: i64,
    delete_count: i64,
}

impl DailyMetricRow {
    fn into_metric(self) -> Result<DailyMetric> {
        Ok(DailyMetric {
            date: timestamp::parse_day(&self.date)?,
            total_feedback: self.total_feedback,
            accept_count: self.accept_count,
            reject_count: self.reject_count,
            edit_count: self.edit_count,
            delete_count: self.delete_count,
        })
    }
}

#[derive(Debug, FromRow)]
struct InsightRow {
    id: String,
    insight_type: String,
    title: String,
    description: String,
    severity: String,
    actionable: bool,
    resolved: bool,
    resolved_at: Option<String>,
    created_at: String,
}

impl InsightRow {
    fn into_insight(self) -> Result<Insight> {
        let severity = InsightSeverity::parse(&self.severity)
            .ok_or_else(|| Error::Other(format!("Invalid insight severity: {}", self.severity)))?;

        Ok(Insight {
            id: self.id,
            insight_type: self.insight_type,
            title: self.title,
            description: self.description,
            severity,
            actionable: self.actionable,
            resolved: self.resolved,
            resolved_at: timestamp::decode_opt(self.resolved_at.as_deref())?,
            created_at: timestamp::decode(&self.created_at)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{Database, DatabaseConfig};
    use std::sync::Arc;

    async fn setup_test_db() -> SqliteMetricsRepository {
        let db = Database::in_memory()
            .await
            .expect("Failed to create test database");
        SqliteMetricsRepository::new(db.pool().clone())
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
    }

    #[tokio::test]
    async fn test_record_feedback_upserts() {
        let repo = setup_test_db().await;
        repo.record_feedback(FeedbackType::Accept, day(1)).await.unwrap();
        repo.record_feedback(FeedbackType::Edit, day(1)).await.unwrap();
        repo.record_feedback(FeedbackType::Rate, day(1)).await.unwrap();
        repo.record_feedback(FeedbackType::DeleteEdge, day(2)).await.unwrap();

        let metrics = repo.daily_metrics_since(day(1)).await.unwrap();
        assert_eq!(metrics.len(), 2);
        assert_eq!(metrics[0].date, day(1));
        assert_eq!(metrics[0].total_feedback, 3);
        assert_eq!(metrics[0].accept_count, 1);
        assert_eq!(metrics[0].edit_count, 1);
        assert_eq!(metrics[1].delete_count, 1);

        assert_eq!(repo.daily_metrics_since(day(2)).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_increments_are_not_lost() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(
            DatabaseConfig::with_path(dir.path().join("metrics.db")).max_connections(5),
        )
        .await
        .unwrap();
        let repo = Arc::new(SqliteMetricsRepository::new(db.pool().clone()));

        let mut handles = Vec::new();
        for i in 0..40 {
            let repo = repo.clone();
            let feedback_type = if i % 2 == 0 {
                FeedbackType::Accept
            } else {
                FeedbackType::Reject
            };
            handles.push(tokio::spawn(async move {
                repo.record_feedback(feedback_type, day(5)).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let metrics = repo.daily_metrics_since(day(5)).await.unwrap();
        assert_eq!(metrics[0].total_feedback, 40);
        assert_eq!(metrics[0].accept_count, 20);
        assert_eq!(metrics[0].reject_count, 20);
    }

    #[tokio::test]
    async fn test_insight_dedupe_by_unresolved_title() {
        let repo = setup_test_db().await;
        let insight = NewInsight::new("low_accuracy", "Low accuracy for DATE entities", "d", InsightSeverity::High);

        let first = repo.create_insight_if_absent(&insight).await.unwrap().unwrap();
        assert!(repo.create_insight_if_absent(&insight).await.unwrap().is_none());

        assert!(repo.resolve_insight(&first.id).await.unwrap());
        assert!(repo.create_insight_if_absent(&insight).await.unwrap().is_some());

        assert_eq!(repo.list_insights(false).await.unwrap().len(), 1);
        assert_eq!(repo.list_insights(true).await.unwrap().len(), 2);
        assert!(!repo.resolve_insight("missing").await.unwrap());
    }
}

//! Repository trait for metrics and insights

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::domain::feedback::FeedbackType;
use crate::error::Result;

use super::entity::{DailyMetric, Insight, NewInsight};

#[async_trait]
pub trait MetricsRepository: Send + Sync {
    // ========== Daily Metrics ==========

    /// Atomically bump the total and the type's counter for `day`,
    /// creating the row if absent
    async fn record_feedback(&self, feedback_type: FeedbackType, day: NaiveDate) -> Result<()>;

    /// Rows for `start` and later, oldest first
    async fn daily_metrics_since(&self, start: NaiveDate) -> Result<Vec<DailyMetric>>;

    // ========== Insights ==========

    async fn create_insight(&self, insight: &NewInsight) -> Result<Insight>;

    /// Create unless an unresolved insight with the same title exists
    async fn create_insight_if_absent(&self, insight: &NewInsight) -> Result<Option<Insight>>;

    /// Mark resolved; `false` when no such insight exists
    async fn resolve_insight(&self, id: &str) -> Result<bool>;

    /// Newest first; resolved insights only when asked for
    async fn list_insights(&self, include_resolved: bool) -> Result<Vec<Insight>>;
}

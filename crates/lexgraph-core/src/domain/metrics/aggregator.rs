//! Metrics aggregation service
//!
//! Reads daily counters and raw feedback events, and owns the insight
//! lifecycle. Nothing here runs on a schedule; insight generation happens
//! when an operator asks for it.

use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use tracing::info;

use crate::config::LearningConfig;
use crate::domain::feedback::{FeedbackRepository, FeedbackType};
use crate::error::{Error, Result};

use super::analysis;
use super::entity::{
    DailyMetric, EntityAccuracy, ErrorPattern, FeedbackSummary, Insight, LearningReport,
    NewInsight,
};
use super::repository::MetricsRepository;

const ACCURACY_TYPES: &[FeedbackType] =
    &[FeedbackType::Accept, FeedbackType::Reject, FeedbackType::Edit];

const ERROR_TYPES: &[FeedbackType] =
    &[FeedbackType::Reject, FeedbackType::Edit, FeedbackType::DeleteNode];

pub struct MetricsAggregator {
    metrics: Arc<dyn MetricsRepository>,
    feedback: Arc<dyn FeedbackRepository>,
    settings: LearningConfig,
}

fn start_of(day: NaiveDate) -> DateTime<Utc> {
    day.and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc())
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

impl MetricsAggregator {
    pub fn new(
        metrics: Arc<dyn MetricsRepository>,
        feedback: Arc<dyn FeedbackRepository>,
        settings: LearningConfig,
    ) -> Self {
        Self {
            metrics,
            feedback,
            settings,
        }
    }

    /// Count one feedback event against its day
    pub async fn record_feedback(&self, feedback_type: FeedbackType, day: NaiveDate) -> Result<()> {
        self.metrics.record_feedback(feedback_type, day).await
    }

    pub async fn daily_metrics(&self, start: NaiveDate) -> Result<Vec<DailyMetric>> {
        self.metrics.daily_metrics_since(start).await
    }

    pub async fn compute_summary(&self, start: NaiveDate) -> Result<FeedbackSummary> {
        let metrics = self.metrics.daily_metrics_since(start).await?;
        Ok(analysis::compute_summary(&metrics))
    }

    pub async fn compute_entity_accuracy(&self, start: NaiveDate) -> Result<Vec<EntityAccuracy>> {
        let events = self.feedback.list_since(start_of(start), ACCURACY_TYPES).await?;
        Ok(analysis::compute_entity_accuracy(&events))
    }

    pub async fn compute_common_errors(&self, start: NaiveDate) -> Result<Vec<ErrorPattern>> {
        let events = self.feedback.list_since(start_of(start), ERROR_TYPES).await?;
        Ok(analysis::compute_common_errors(&events))
    }

    // ========== Insights ==========

    pub async fn create_insight(&self, insight: NewInsight) -> Result<Insight> {
        if insight.title.trim().is_empty() {
            return Err(Error::invalid("Insight title must not be empty"));
        }
        if insight.insight_type.trim().is_empty() {
            return Err(Error::invalid("Insight type must not be empty"));
        }
        let created = self.metrics.create_insight(&insight).await?;
        info!(insight_id = %created.id, title = %created.title, "Insight created");
        Ok(created)
    }

    pub async fn resolve_insight(&self, id: &str) -> Result<()> {
        if !self.metrics.resolve_insight(id).await? {
            return Err(Error::not_found("insight", id));
        }
        info!(insight_id = %id, "Insight resolved");
        Ok(())
    }

    pub async fn list_insights(&self, include_resolved: bool) -> Result<Vec<Insight>> {
        self.metrics.list_insights(include_resolved).await
    }

    /// Derive insights from feedback since `start`, skipping any whose title
    /// matches an unresolved insight. Returns the newly created ones.
    pub async fn generate_insights(&self, start: NaiveDate) -> Result<Vec<Insight>> {
        let accuracy = self.compute_entity_accuracy(start).await?;
        let errors = self.compute_common_errors(start).await?;

        let mut created = Vec::new();
        for candidate in analysis::derive_insights(&accuracy, &errors, &self.settings) {
            if let Some(insight) = self.metrics.create_insight_if_absent(&candidate).await? {
                created.push(insight);
            }
        }

        info!(created = created.len(), start = %start, "Insights generated");
        Ok(created)
    }

    // ========== Reporting ==========

    /// Clamp a requested window to `1..=max_days`, defaulting when absent
    pub fn clamp_days(&self, days: Option<i64>) -> u32 {
        let max = i64::from(self.settings.max_days.max(1));
        let requested = days.unwrap_or(i64::from(self.settings.default_days));
        requested.clamp(1, max) as u32
    }

    /// Dashboard data for the last `days` days, today included
    pub async fn learning_report(&self, days: Option<i64>) -> Result<LearningReport> {
        let period_days = self.clamp_days(days);
        let start_date = Utc::now().date_naive() - Duration::days(i64::from(period_days) - 1);

        let daily_metrics = self.metrics.daily_metrics_since(start_date).await?;
        let summary = analysis::compute_summary(&daily_metrics);

        Ok(LearningReport {
            period_days,
            start_date,
            summary,
            entity_accuracy: self.compute_entity_accuracy(start_date).await?,
            daily_metrics,
            insights: self.metrics.list_insights(false).await?,
            common_errors: self.compute_common_errors(start_date).await?,
        })
    }
}

//! Learning API
//!
//! Admin-only access to feedback metrics and insights.

use chrono::{Duration, Utc};

use crate::domain::metrics::{Insight, LearningReport, NewInsight};
use crate::error::Result;

use super::LexGraph;

impl LexGraph {
    /// Learning dashboard over the last `days` days
    pub async fn learning_report(&self, actor_id: &str, days: Option<i64>) -> Result<LearningReport> {
        self.require_admin(actor_id)?;
        self.metrics.learning_report(days).await
    }

    pub async fn list_insights(&self, actor_id: &str, include_resolved: bool) -> Result<Vec<Insight>> {
        self.require_admin(actor_id)?;
        self.metrics.list_insights(include_resolved).await
    }

    pub async fn create_insight(&self, actor_id: &str, insight: NewInsight) -> Result<Insight> {
        self.require_admin(actor_id)?;
        self.metrics.create_insight(insight).await
    }

    pub async fn resolve_insight(&self, actor_id: &str, insight_id: &str) -> Result<()> {
        self.require_admin(actor_id)?;
        self.metrics.resolve_insight(insight_id).await
    }

    /// Derive insights from the last `days` days of feedback
    pub async fn generate_insights(&self, actor_id: &str, days: Option<i64>) -> Result<Vec<Insight>> {
        self.require_admin(actor_id)?;
        let days = self.metrics.clamp_days(days);
        let start = Utc::now().date_naive() - Duration::days(i64::from(days) - 1);
        self.metrics.generate_insights(start).await
    }
}

//! Metric, insight and report types

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::graph::NodeType;

/// Per-day rollup of feedback counts
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyMetric {
    pub date: NaiveDate,
    pub total_feedback: i64,
    pub accept_count: i64,
    pub reject_count: i64,
    pub edit_count: i64,
    /// DELETE_NODE and DELETE_EDGE combined
    pub delete_count: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsightSeverity {
    Low,
    Medium,
    High,
}

impl InsightSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            _ => None,
        }
    }
}

/// Insight type for entity types with poor acceptance
pub const LOW_ACCURACY_INSIGHT: &str = "low_accuracy";

/// Insight type for error patterns that keep recurring
pub const RECURRING_ERROR_INSIGHT: &str = "recurring_error";

/// A derived, actionable observation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Insight {
    pub id: String,
    #[serde(rename = "type")]
    pub insight_type: String,
    pub title: String,
    pub description: String,
    pub severity: InsightSeverity,
    pub actionable: bool,
    pub resolved: bool,
    pub resolved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// An insight about to be created
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewInsight {
    #[serde(rename = "type")]
    pub insight_type: String,
    pub title: String,
    pub description: String,
    pub severity: InsightSeverity,
    #[serde(default = "default_actionable")]
    pub actionable: bool,
}

fn default_actionable() -> bool {
    true
}

impl NewInsight {
    pub fn new(
        insight_type: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
        severity: InsightSeverity,
    ) -> Self {
        Self {
            insight_type: insight_type.into(),
            title: title.into(),
            description: description.into(),
            severity,
            actionable: true,
        }
    }
}

/// Feedback totals and rates over a period. Rates are percentages.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackSummary {
    pub total_feedback: i64,
    pub accept_count: i64,
    pub reject_count: i64,
    pub edit_count: i64,
    pub delete_count: i64,
    /// accept / (accept + reject + edit)
    pub overall_accuracy: f64,
    pub accept_rate: f64,
    pub reject_rate: f64,
    pub edit_rate: f64,
    pub delete_rate: f64,
}

/// Acceptance of one entity type
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityAccuracy {
    pub entity_type: NodeType,
    pub accepted: u32,
    pub rejected: u32,
    pub edited: u32,
    pub accuracy: f64,
}

impl EntityAccuracy {
    pub fn judgments(&self) -> u32 {
        self.accepted + self.rejected + self.edited
    }
}

/// A recurring kind of correction
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorPattern {
    pub pattern: String,
    pub count: u32,
    pub examples: Vec<ErrorExample>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorExample {
    pub feedback_id: String,
    pub node_id: Option<String>,
    pub original_value: Option<Value>,
    pub corrected_value: Option<Value>,
    pub created_at: DateTime<Utc>,
}

/// Everything the learning dashboard shows for a period
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningReport {
    pub period_days: u32,
    pub start_date: NaiveDate,
    pub summary: FeedbackSummary,
    pub entity_accuracy: Vec<EntityAccuracy>,
    pub daily_metrics: Vec<DailyMetric>,
    pub insights: Vec<Insight>,
    pub common_errors: Vec<ErrorPattern>,
}

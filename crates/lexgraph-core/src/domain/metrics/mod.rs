//! Metrics domain
//!
//! Daily feedback counters, accuracy analysis, error clustering and insights.

mod aggregator;
pub mod analysis;
mod entity;
mod repository;

pub use aggregator::MetricsAggregator;
pub use entity::{
    DailyMetric, EntityAccuracy, ErrorExample, ErrorPattern, FeedbackSummary, Insight,
    InsightSeverity, LOW_ACCURACY_INSIGHT, LearningReport, NewInsight, RECURRING_ERROR_INSIGHT,
};
pub use repository::MetricsRepository;

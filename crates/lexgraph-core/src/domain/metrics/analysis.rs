//! Pure aggregation over daily metrics and feedback events

use std::collections::{BTreeMap, HashMap};

use crate::config::LearningConfig;
use crate::domain::feedback::{FeedbackEvent, FeedbackType};
use crate::domain::graph::NodeType;

use super::entity::{
    DailyMetric, EntityAccuracy, ErrorExample, ErrorPattern, FeedbackSummary, InsightSeverity,
    LOW_ACCURACY_INSIGHT, NewInsight, RECURRING_ERROR_INSIGHT,
};

/// Most patterns returned by [`compute_common_errors`]
pub const MAX_ERROR_PATTERNS: usize = 10;

/// Examples kept per error pattern
pub const MAX_PATTERN_EXAMPLES: usize = 3;

/// Pattern for corrections that fit no other bucket
pub const UNKNOWN_ERROR: &str = "unknown_error";

/// Entity-type accuracy below this is reported as high severity
const HIGH_SEVERITY_ACCURACY: f64 = 50.0;

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// `part / whole` as a percentage rounded to one decimal; 0 for an empty whole
pub fn percentage(part: i64, whole: i64) -> f64 {
    if whole <= 0 {
        return 0.0;
    }
    round1(part as f64 / whole as f64 * 100.0)
}

/// Sum daily rows into totals and rates
pub fn compute_summary(metrics: &[DailyMetric]) -> FeedbackSummary {
    let mut summary = FeedbackSummary::default();
    for day in metrics {
        summary.total_feedback += day.total_feedback;
        summary.accept_count += day.accept_count;
        summary.reject_count += day.reject_count;
        summary.edit_count += day.edit_count;
        summary.delete_count += day.delete_count;
    }

    let judged = summary.accept_count + summary.reject_count + summary.edit_count;
    summary.overall_accuracy = percentage(summary.accept_count, judged);
    summary.accept_rate = percentage(summary.accept_count, summary.total_feedback);
    summary.reject_rate = percentage(summary.reject_count, summary.total_feedback);
    summary.edit_rate = percentage(summary.edit_count, summary.total_feedback);
    summary.delete_rate = percentage(summary.delete_count, summary.total_feedback);
    summary
}

/// Acceptance per entity type, one entry for each known type.
///
/// Only node-targeted ACCEPT, REJECT and EDIT events whose snapshot names a
/// known type are counted.
pub fn compute_entity_accuracy(events: &[FeedbackEvent]) -> Vec<EntityAccuracy> {
    let mut tallies: HashMap<NodeType, (u32, u32, u32)> = HashMap::new();

    for event in events.iter().filter(|e| e.node_id.is_some()) {
        let Some(node_type) = event.original_type().and_then(NodeType::parse) else {
            continue;
        };
        let tally = tallies.entry(node_type).or_default();
        match event.feedback_type {
            FeedbackType::Accept => tally.0 += 1,
            FeedbackType::Reject => tally.1 += 1,
            FeedbackType::Edit => tally.2 += 1,
            _ => {}
        }
    }

    NodeType::all()
        .iter()
        .map(|&entity_type| {
            let (accepted, rejected, edited) = tallies.get(&entity_type).copied().unwrap_or_default();
            EntityAccuracy {
                entity_type,
                accepted,
                rejected,
                edited,
                accuracy: percentage(
                    accepted as i64,
                    (accepted + rejected + edited) as i64,
                ),
            }
        })
        .collect()
}

fn type_token(raw: Option<&str>) -> Option<String> {
    raw.and_then(NodeType::parse)
        .map(|t| t.as_str().to_ascii_lowercase())
}

/// Bucket one correction into a pattern name
pub fn classify_error(event: &FeedbackEvent) -> String {
    let original = type_token(event.original_type());

    match event.feedback_type {
        FeedbackType::DeleteNode => match original {
            Some(t) => format!("false_positive_{}", t),
            None => UNKNOWN_ERROR.to_string(),
        },
        FeedbackType::Edit => {
            let corrected = type_token(event.corrected_type());
            let label_changed = event
                .corrected_value
                .as_ref()
                .and_then(|v| v.get("label"))
                .is_some_and(|label| {
                    event.original_value.as_ref().and_then(|v| v.get("label")) != Some(label)
                });

            match (original, corrected) {
                (Some(from), Some(to)) if from != to => format!("misclassified_{}_as_{}", from, to),
                (Some(t), _) if label_changed => format!("wrong_label_{}", t),
                _ => UNKNOWN_ERROR.to_string(),
            }
        }
        _ => UNKNOWN_ERROR.to_string(),
    }
}

/// Most frequent correction patterns among REJECT, EDIT and DELETE_NODE
/// events, by count descending then pattern name
pub fn compute_common_errors(events: &[FeedbackEvent]) -> Vec<ErrorPattern> {
    let mut buckets: BTreeMap<String, ErrorPattern> = BTreeMap::new();

    for event in events.iter().filter(|e| {
        matches!(
            e.feedback_type,
            FeedbackType::Reject | FeedbackType::Edit | FeedbackType::DeleteNode
        )
    }) {
        let pattern = classify_error(event);
        let bucket = buckets.entry(pattern.clone()).or_insert_with(|| ErrorPattern {
            pattern,
            count: 0,
            examples: Vec::new(),
        });
        bucket.count += 1;
        if bucket.examples.len() < MAX_PATTERN_EXAMPLES {
            bucket.examples.push(ErrorExample {
                feedback_id: event.id.clone(),
                node_id: event.node_id.clone(),
                original_value: event.original_value.clone(),
                corrected_value: event.corrected_value.clone(),
                created_at: event.created_at,
            });
        }
    }

    // BTreeMap iteration is name-ordered, so a stable sort by count keeps ties alphabetical
    let mut patterns: Vec<ErrorPattern> = buckets.into_values().collect();
    patterns.sort_by(|a, b| b.count.cmp(&a.count));
    patterns.truncate(MAX_ERROR_PATTERNS);
    patterns
}

/// Insights warranted by the current accuracy and error figures
pub fn derive_insights(
    accuracy: &[EntityAccuracy],
    errors: &[ErrorPattern],
    settings: &LearningConfig,
) -> Vec<NewInsight> {
    let mut insights = Vec::new();

    for entry in accuracy {
        if entry.judgments() < settings.min_samples
            || entry.accuracy >= settings.low_accuracy_threshold
        {
            continue;
        }
        let severity = if entry.accuracy < HIGH_SEVERITY_ACCURACY {
            InsightSeverity::High
        } else {
            InsightSeverity::Medium
        };
        insights.push(NewInsight::new(
            LOW_ACCURACY_INSIGHT,
            format!("Low accuracy for {} entities", entry.entity_type),
            format!(
                "{} entities were accepted {:.1}% of the time across {} judgments",
                entry.entity_type,
                entry.accuracy,
                entry.judgments()
            ),
            severity,
        ));
    }

    for error in errors {
        if error.pattern == UNKNOWN_ERROR || error.count < settings.recurring_error_threshold {
            continue;
        }
        insights.push(NewInsight::new(
            RECURRING_ERROR_INSIGHT,
            format!("Recurring error: {}", error.pattern),
            format!(
                "The correction pattern {} occurred {} times",
                error.pattern, error.count
            ),
            InsightSeverity::Medium,
        ));
    }

    insights
}

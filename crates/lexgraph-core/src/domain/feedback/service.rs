//! Feedback ingestion
//!
//! Order of effects for a submission:
//! 1. Authorize, then validate; a denied actor leaves no record and learns
//!    nothing about the request
//! 2. Append the event
//! 3. Apply the graph mutation, if any
//! 4. Count the event in the daily metrics
//!
//! The metric is recorded even when the mutation fails.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::domain::access::{AccessResolver, Action};
use crate::domain::graph::{GraphRepository, NodePatch};
use crate::domain::metrics::MetricsAggregator;
use crate::error::Result;

use super::event::{FeedbackEvent, FeedbackSubmission, FeedbackType};
use super::repository::FeedbackRepository;

/// Most events returned by a history listing
pub const FEEDBACK_HISTORY_LIMIT: u32 = 100;

pub struct FeedbackService {
    feedback: Arc<dyn FeedbackRepository>,
    graphs: Arc<dyn GraphRepository>,
    metrics: Arc<MetricsAggregator>,
    access: Arc<AccessResolver>,
}

impl FeedbackService {
    pub fn new(
        feedback: Arc<dyn FeedbackRepository>,
        graphs: Arc<dyn GraphRepository>,
        metrics: Arc<MetricsAggregator>,
        access: Arc<AccessResolver>,
    ) -> Self {
        Self {
            feedback,
            graphs,
            metrics,
            access,
        }
    }

    pub async fn submit_feedback(
        &self,
        session_id: &str,
        actor_id: &str,
        submission: FeedbackSubmission,
    ) -> Result<FeedbackEvent> {
        let grant = self
            .access
            .authorize(session_id, actor_id, submission.feedback_type.required_action())
            .await?;
        let patch = submission.validate()?;
        let graph_id = grant.require_graph()?.id.clone();

        let original_value = match submission.original_value.clone() {
            Some(value) => Some(value),
            None => self.snapshot(&graph_id, &submission).await,
        };

        let event = submission.into_event(session_id, actor_id, original_value);
        self.feedback.append(&event).await?;

        debug!(
            feedback_id = %event.id,
            session_id = %session_id,
            feedback_type = %event.feedback_type,
            "Feedback recorded"
        );

        let mutation = self.apply(&graph_id, &event, patch.as_ref()).await;
        if let Err(e) = &mutation {
            warn!(feedback_id = %event.id, error = %e, "Feedback mutation failed");
        }

        let day = event.created_at.date_naive();
        if let Err(e) = self.metrics.record_feedback(event.feedback_type, day).await {
            warn!(feedback_id = %event.id, error = %e, "Failed to record feedback metric");
            mutation?;
            return Err(e);
        }

        mutation?;
        Ok(event)
    }

    /// Audit trail for a session, newest first
    pub async fn list_feedback(&self, session_id: &str, actor_id: &str) -> Result<Vec<FeedbackEvent>> {
        self.access
            .authorize(session_id, actor_id, Action::ViewGraph)
            .await?;
        self.feedback
            .list_for_session(session_id, FEEDBACK_HISTORY_LIMIT)
            .await
    }

    /// Current state of the target, so the event stays meaningful after rebuilds
    async fn snapshot(&self, graph_id: &str, submission: &FeedbackSubmission) -> Option<Value> {
        let result = if let Some(node_id) = &submission.node_id {
            self.graphs
                .get_node(graph_id, node_id)
                .await
                .map(|node| node.map(|n| n.snapshot()))
        } else if let Some(edge_id) = &submission.edge_id {
            self.graphs
                .get_edge(graph_id, edge_id)
                .await
                .map(|edge| edge.map(|e| e.snapshot()))
        } else {
            Ok(None)
        };

        result.unwrap_or_else(|e| {
            warn!(graph_id = %graph_id, error = %e, "Feedback target snapshot failed");
            None
        })
    }

    async fn apply(
        &self,
        graph_id: &str,
        event: &FeedbackEvent,
        patch: Option<&NodePatch>,
    ) -> Result<()> {
        let applied = match (event.feedback_type, &event.node_id, &event.edge_id) {
            (FeedbackType::Edit, Some(node_id), _) => match patch {
                Some(patch) => self.graphs.update_node(graph_id, node_id, patch).await?.is_some(),
                None => false,
            },
            (FeedbackType::DeleteNode, Some(node_id), _) => {
                self.graphs.delete_node(graph_id, node_id).await?
            }
            (FeedbackType::DeleteEdge, _, Some(edge_id)) => {
                self.graphs.delete_edge(graph_id, edge_id).await?
            }
            _ => return Ok(()),
        };

        if applied {
            info!(
                feedback_id = %event.id,
                feedback_type = %event.feedback_type,
                "Feedback applied to graph"
            );
        } else {
            debug!(
                feedback_id = %event.id,
                "Feedback target no longer exists, mutation skipped"
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LearningConfig;
    use crate::domain::access::{Share, ShareAccess, ShareRepository};
    use crate::domain::graph::{GraphContents, GraphStatus, NewEdge, NewNode, NodeType};
    use crate::domain::metrics::MetricsRepository;
    use crate::error::Error;
    use crate::test_support::TestContext;
    use chrono::Utc;
    use serde_json::json;

    struct Fixture {
        ctx: TestContext,
        service: FeedbackService,
        x: String,
        y: String,
        edge: String,
    }

    async fn setup() -> Fixture {
        let ctx = TestContext::new().await;
        ctx.seed_session("s1", Some("owner")).await;
        let graph = ctx
            .graphs
            .upsert_graph_shell("s1", GraphStatus::Ready)
            .await
            .unwrap();

        let x = NewNode::new(NodeType::Person, "X");
        let y = NewNode::new(NodeType::Person, "Y");
        let edge = NewEdge::new(&x.id, &y.id, "SUED");
        let (x_id, y_id, edge_id) = (x.id.clone(), y.id.clone(), edge.id.clone());
        ctx.graphs
            .replace_nodes_and_edges(
                "s1",
                &GraphContents {
                    nodes: vec![x, y],
                    edges: vec![edge],
                },
            )
            .await
            .unwrap();

        let commenter = Share::new(&graph.id, ShareAccess::Comment, "owner", 32).with_recipient("carol");
        ctx.shares.create_share(&commenter).await.unwrap();

        let metrics = MetricsAggregator::new(
            ctx.metrics.clone(),
            ctx.feedback.clone(),
            LearningConfig::default(),
        );
        let service = FeedbackService::new(
            ctx.feedback.clone(),
            ctx.graphs.clone(),
            Arc::new(metrics),
            Arc::new(ctx.access_resolver()),
        );
        Fixture {
            ctx,
            service,
            x: x_id,
            y: y_id,
            edge: edge_id,
        }
    }

    #[tokio::test]
    async fn test_edit_patches_node_and_counts_metric() {
        let f = setup().await;

        let event = f
            .service
            .submit_feedback(
                "s1",
                "owner",
                FeedbackSubmission::new(FeedbackType::Edit)
                    .on_node(&f.y)
                    .corrected(json!({"label": "Y Corp", "type": "ORGANIZATION"})),
            )
            .await
            .unwrap();

        assert_eq!(event.original_type(), Some("PERSON"));
        let graph = f.ctx.graphs.get_graph("s1").await.unwrap().unwrap();
        let node = f.ctx.graphs.get_node(&graph.id, &f.y).await.unwrap().unwrap();
        assert_eq!(node.label, "Y Corp");
        assert_eq!(node.node_type, NodeType::Organization);

        let metrics = f
            .ctx
            .metrics
            .daily_metrics_since(Utc::now().date_naive())
            .await
            .unwrap();
        assert_eq!(metrics[0].edit_count, 1);
        assert_eq!(metrics[0].total_feedback, 1);
    }

    #[tokio::test]
    async fn test_delete_node_cascades_edges() {
        let f = setup().await;

        f.service
            .submit_feedback(
                "s1",
                "owner",
                FeedbackSubmission::new(FeedbackType::DeleteNode).on_node(&f.y),
            )
            .await
            .unwrap();

        let graph = f.ctx.graphs.get_graph("s1").await.unwrap().unwrap();
        assert_eq!((graph.node_count, graph.edge_count), (1, 0));
        assert!(f.ctx.graphs.list_edges("s1").await.unwrap().is_empty());
        assert_eq!(f.ctx.graphs.list_nodes("s1").await.unwrap()[0].id, f.x);
    }

    #[tokio::test]
    async fn test_delete_edge_keeps_snapshot() {
        let f = setup().await;

        let event = f
            .service
            .submit_feedback(
                "s1",
                "owner",
                FeedbackSubmission::new(FeedbackType::DeleteEdge).on_edge(&f.edge),
            )
            .await
            .unwrap();

        assert_eq!(event.original_value.as_ref().unwrap()["relation"], "SUED");
        let graph = f.ctx.graphs.get_graph("s1").await.unwrap().unwrap();
        assert_eq!(graph.edge_count, 0);
    }

    #[tokio::test]
    async fn test_missing_target_is_recorded_without_mutation() {
        let f = setup().await;

        let event = f
            .service
            .submit_feedback(
                "s1",
                "owner",
                FeedbackSubmission::new(FeedbackType::DeleteNode).on_node("gone"),
            )
            .await
            .unwrap();

        assert!(event.original_value.is_none());
        let history = f.service.list_feedback("s1", "owner").await.unwrap();
        assert_eq!(history.len(), 1);
        let graph = f.ctx.graphs.get_graph("s1").await.unwrap().unwrap();
        assert_eq!(graph.node_count, 2);
    }

    #[tokio::test]
    async fn test_commenter_can_signal_but_not_mutate() {
        let f = setup().await;

        f.service
            .submit_feedback(
                "s1",
                "carol",
                FeedbackSubmission::new(FeedbackType::Accept).on_node(&f.x),
            )
            .await
            .unwrap();

        let err = f
            .service
            .submit_feedback(
                "s1",
                "carol",
                FeedbackSubmission::new(FeedbackType::DeleteNode).on_node(&f.x),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::PermissionDenied(_)));

        // The denied attempt leaves no audit record
        let history = f.service.list_feedback("s1", "owner").await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].feedback_type, FeedbackType::Accept);
        assert_eq!(f.ctx.graphs.list_nodes("s1").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_stranger_is_denied_without_record() {
        let f = setup().await;

        let err = f
            .service
            .submit_feedback(
                "s1",
                "mallory",
                FeedbackSubmission::new(FeedbackType::Rate).on_node(&f.x).rated(1),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::PermissionDenied(_)));
        assert!(f.service.list_feedback("s1", "mallory").await.is_err());
        assert!(f.service.list_feedback("s1", "owner").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_submission_rejected() {
        let f = setup().await;

        let err = f
            .service
            .submit_feedback("s1", "owner", FeedbackSubmission::new(FeedbackType::Rate))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ValidationError(_)));
    }

    #[tokio::test]
    async fn test_stranger_with_malformed_request_is_denied() {
        let f = setup().await;

        let err = f
            .service
            .submit_feedback(
                "s1",
                "mallory",
                FeedbackSubmission::new(FeedbackType::Edit).on_node(&f.x),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::PermissionDenied(_)));

        let err = f
            .service
            .submit_feedback("s1", "mallory", FeedbackSubmission::new(FeedbackType::Rate))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::PermissionDenied(_)));
    }

    #[tokio::test]
    async fn test_history_newest_first() {
        let f = setup().await;
        for feedback_type in [FeedbackType::Accept, FeedbackType::Reject] {
            f.service
                .submit_feedback(
                    "s1",
                    "owner",
                    FeedbackSubmission::new(feedback_type).on_node(&f.x),
                )
                .await
                .unwrap();
        }

        let history = f.service.list_feedback("s1", "owner").await.unwrap();
        assert_eq!(history[0].feedback_type, FeedbackType::Reject);
        assert_eq!(history[1].feedback_type, FeedbackType::Accept);
    }
}

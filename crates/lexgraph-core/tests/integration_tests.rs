//! Lexgraph Core Integration Tests

mod common;

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use lexgraph_core::Error;
use lexgraph_core::api::{CommentRequest, FeedbackRequest, GraphView, ShareRequestDto};
use lexgraph_core::domain::build::{EdgeSpec, ExtractionResponse, NodeSpec};
use lexgraph_core::domain::comments::CommentFilter;
use serde_json::json;
use tempfile::TempDir;

use common::{ADMIN, CASE_TEXT, OWNER, section_420};

fn node_id(view: &GraphView, label: &str) -> String {
    view.nodes
        .iter()
        .find(|n| n.label == label)
        .map(|n| n.id.clone())
        .unwrap_or_else(|| panic!("no node labelled {}", label))
}

fn assert_edges_reference_nodes(view: &GraphView) {
    let ids: HashSet<&str> = view.nodes.iter().map(|n| n.id.as_str()).collect();
    for edge in &view.edges {
        assert!(ids.contains(edge.source_id.as_str()), "dangling source {}", edge.source_id);
        assert!(ids.contains(edge.target_id.as_str()), "dangling target {}", edge.target_id);
    }
}

#[tokio::test]
async fn test_build_edit_delete_scenario() {
    let app = common::in_memory_app(vec![section_420()]).await;
    common::seed_session(app.database(), "s1", OWNER, CASE_TEXT).await;

    // Build
    let built = app.build_graph("s1", OWNER).await.unwrap();
    assert_eq!(built.outcome, "COMPLETED");
    let view = app.get_graph("s1", OWNER).await.unwrap();
    assert_eq!(view.status, "READY");
    assert_eq!(view.node_count, 3);
    assert_eq!(view.edge_count, 2);
    assert_eq!(view.nodes.len() as u32, view.node_count);
    assert_eq!(view.edges.len() as u32, view.edge_count);
    assert_edges_reference_nodes(&view);

    // Edit Y
    let y = node_id(&view, "Y");
    let event = app
        .submit_feedback(
            "s1",
            OWNER,
            FeedbackRequest {
                node_id: Some(y.clone()),
                feedback_type: "EDIT".into(),
                corrected_value: Some(json!({ "label": "Y Corp", "type": "ORGANIZATION" })),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(event.feedback_type, "EDIT");

    let view = app.get_graph("s1", OWNER).await.unwrap();
    let edited = view.nodes.iter().find(|n| n.id == y).unwrap();
    assert_eq!(edited.label, "Y Corp");
    assert_eq!(edited.node_type, "ORGANIZATION");

    let report = app.learning_report(ADMIN, Some(1)).await.unwrap();
    let today = Utc::now().date_naive();
    let metric = report
        .daily_metrics
        .iter()
        .find(|m| m.date == today)
        .expect("metric for today");
    assert_eq!(metric.edit_count, 1);
    assert_eq!(metric.total_feedback, 1);

    // Delete Y Corp
    app.submit_feedback(
        "s1",
        OWNER,
        FeedbackRequest {
            node_id: Some(y.clone()),
            feedback_type: "DELETE_NODE".into(),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    let view = app.get_graph("s1", OWNER).await.unwrap();
    assert_eq!(view.node_count, 2);
    assert_eq!(view.edge_count, 1);
    assert!(view.nodes.iter().all(|n| n.id != y));
    assert_eq!(view.edges[0].relation, "CITES");
    assert_edges_reference_nodes(&view);

    let history = app.list_feedback("s1", OWNER).await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].feedback_type, "DELETE_NODE");
    assert_eq!(history[0].original_value.as_ref().unwrap()["label"], "Y Corp");
}

#[tokio::test]
async fn test_rebuild_replaces_previous_output() {
    let second = ExtractionResponse {
        summary: Some("A contract dispute".into()),
        nodes: vec![
            NodeSpec::new("ORGANIZATION", "Acme"),
            NodeSpec::new("DOCUMENT", "Supply agreement"),
        ],
        edges: vec![EdgeSpec::new("Acme", "Supply agreement", "SIGNED")],
    };
    let app = common::in_memory_app(vec![section_420(), second]).await;
    common::seed_session(app.database(), "s1", OWNER, CASE_TEXT).await;

    app.build_graph("s1", OWNER).await.unwrap();
    let first_ids: HashSet<String> = app
        .get_graph("s1", OWNER)
        .await
        .unwrap()
        .nodes
        .into_iter()
        .map(|n| n.id)
        .collect();

    app.build_graph("s1", OWNER).await.unwrap();
    let view = app.get_graph("s1", OWNER).await.unwrap();

    let labels: HashSet<&str> = view.nodes.iter().map(|n| n.label.as_str()).collect();
    assert_eq!(labels, HashSet::from(["Acme", "Supply agreement"]));
    assert!(view.nodes.iter().all(|n| !first_ids.contains(&n.id)));
    assert_eq!(view.summary.as_deref(), Some("A contract dispute"));
    assert_eq!(view.node_count, 2);
    assert_eq!(view.edge_count, 1);
    assert_edges_reference_nodes(&view);
}

#[tokio::test]
async fn test_failed_build_is_recorded() {
    // Nothing queued, so the extractor fails
    let app = common::in_memory_app(vec![]).await;
    common::seed_session(app.database(), "s1", OWNER, CASE_TEXT).await;

    let result = app.build_graph("s1", OWNER).await.unwrap();
    assert_eq!(result.outcome, "FAILED");
    assert!(result.error.is_some());

    let view = app.get_graph("s1", OWNER).await.unwrap();
    assert_eq!(view.status, "ERROR");
    assert!(view.error_message.is_some());
}

#[tokio::test]
async fn test_comment_threads_survive_rebuild_as_stale() {
    let app = common::in_memory_app(vec![section_420(), section_420()]).await;
    common::seed_session(app.database(), "s1", OWNER, CASE_TEXT).await;

    let built = app.build_graph("s1", OWNER).await.unwrap();
    let x = node_id(&built.graph, "X");

    let top = app
        .create_comment(
            "s1",
            OWNER,
            CommentRequest {
                node_id: Some(x.clone()),
                content: "Is X the complainant?".into(),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let reply = app
        .create_comment(
            "s1",
            OWNER,
            CommentRequest {
                parent_id: Some(top.id.clone()),
                content: "Yes, per the FIR".into(),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(reply.node_id.as_deref(), Some(x.as_str()));

    // Rebuilding issues fresh node ids
    app.build_graph("s1", OWNER).await.unwrap();
    let comments = app
        .list_comments("s1", OWNER, CommentFilter::default())
        .await
        .unwrap();
    assert_eq!(comments.len(), 2);
    assert!(comments.iter().all(|c| c.stale));

    assert_eq!(app.delete_comment("s1", OWNER, &top.id).await.unwrap(), 2);
    assert!(app
        .list_comments("s1", OWNER, CommentFilter::default())
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_share_levels() {
    let app = common::in_memory_app(vec![section_420()]).await;
    common::seed_session(app.database(), "s1", OWNER, CASE_TEXT).await;
    let built = app.build_graph("s1", OWNER).await.unwrap();
    let x = node_id(&built.graph, "X");

    for (user, access) in [("viewer", "VIEW"), ("commenter", "COMMENT"), ("editor", "EDIT")] {
        app.create_share(
            "s1",
            OWNER,
            ShareRequestDto {
                shared_with_id: Some(user.into()),
                access: access.into(),
                expires_in_days: None,
            },
        )
        .await
        .unwrap();
    }

    let accept = || FeedbackRequest {
        node_id: Some(x.clone()),
        feedback_type: "ACCEPT".into(),
        ..Default::default()
    };

    let err = app.submit_feedback("s1", "viewer", accept()).await.unwrap_err();
    assert!(matches!(err, Error::PermissionDenied(_)));
    app.submit_feedback("s1", "commenter", accept()).await.unwrap();

    let delete = FeedbackRequest {
        node_id: Some(x.clone()),
        feedback_type: "DELETE_NODE".into(),
        ..Default::default()
    };
    let err = app
        .submit_feedback("s1", "commenter", delete.clone())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::PermissionDenied(_)));
    app.submit_feedback("s1", "editor", delete).await.unwrap();

    // Only the owner manages shares
    let err = app.list_shares("s1", "editor").await.unwrap_err();
    assert!(matches!(err, Error::PermissionDenied(_)));
    assert_eq!(app.list_shares("s1", OWNER).await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_concurrent_feedback_counts_every_event() {
    let dir = TempDir::new().unwrap();
    let app = Arc::new(common::file_app(&dir, vec![section_420()]).await);
    common::seed_session(app.database(), "s1", OWNER, CASE_TEXT).await;
    app.build_graph("s1", OWNER).await.unwrap();

    let mut handles = Vec::new();
    for i in 0..100 {
        let app = app.clone();
        handles.push(tokio::spawn(async move {
            let feedback_type = if i % 2 == 0 { "ACCEPT" } else { "REJECT" };
            app.submit_feedback(
                "s1",
                OWNER,
                FeedbackRequest {
                    feedback_type: feedback_type.into(),
                    ..Default::default()
                },
            )
            .await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let report = app.learning_report(ADMIN, Some(1)).await.unwrap();
    assert_eq!(report.summary.total_feedback, 100);
    assert_eq!(report.summary.accept_count, 50);
    assert_eq!(report.summary.reject_count, 50);
}

#[tokio::test]
async fn test_concurrent_builds_across_sessions() {
    const SESSIONS: usize = 30;

    let dir = TempDir::new().unwrap();
    let responses = (0..SESSIONS).map(|_| section_420()).collect();
    let app = Arc::new(common::file_app(&dir, responses).await);
    for i in 0..SESSIONS {
        common::seed_session(app.database(), &format!("s{}", i), OWNER, CASE_TEXT).await;
    }

    let mut handles = Vec::new();
    for i in 0..SESSIONS {
        let app = app.clone();
        handles.push(tokio::spawn(async move {
            app.build_graph(&format!("s{}", i), OWNER).await
        }));
    }

    for handle in handles {
        let result = handle.await.unwrap().unwrap();
        assert_eq!(result.outcome, "COMPLETED", "build failed: {:?}", result.error);
        assert_eq!(result.graph.status, "READY");
        assert_eq!(result.graph.nodes.len(), 3);
        assert_eq!(result.graph.edges.len(), 2);
    }

    for i in 0..SESSIONS {
        let view = app.get_graph(&format!("s{}", i), OWNER).await.unwrap();
        assert_eq!(view.status, "READY");
        assert_edges_reference_nodes(&view);
    }
}

#[tokio::test]
async fn test_concurrent_edits_on_one_node_keep_both_fields() {
    let dir = TempDir::new().unwrap();
    let app = Arc::new(common::file_app(&dir, vec![section_420()]).await);
    common::seed_session(app.database(), "s1", OWNER, CASE_TEXT).await;
    let built = app.build_graph("s1", OWNER).await.unwrap();
    let y = node_id(&built.graph, "Y");

    let mut handles = Vec::new();
    for corrected in [json!({"label": "Y Corp"}), json!({"type": "ORGANIZATION"})] {
        let app = app.clone();
        let y = y.clone();
        handles.push(tokio::spawn(async move {
            app.submit_feedback(
                "s1",
                OWNER,
                FeedbackRequest {
                    node_id: Some(y),
                    feedback_type: "EDIT".into(),
                    corrected_value: Some(corrected),
                    ..Default::default()
                },
            )
            .await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let view = app.get_graph("s1", OWNER).await.unwrap();
    let node = view.nodes.iter().find(|n| n.id == y).unwrap();
    assert_eq!(node.label, "Y Corp");
    assert_eq!(node.node_type, "ORGANIZATION");
}

#[tokio::test]
async fn test_insight_generation_from_rejections() {
    let app = common::in_memory_app(vec![section_420()]).await;
    common::seed_session(app.database(), "s1", OWNER, CASE_TEXT).await;
    let built = app.build_graph("s1", OWNER).await.unwrap();
    let x = node_id(&built.graph, "X");

    for _ in 0..6 {
        app.submit_feedback(
            "s1",
            OWNER,
            FeedbackRequest {
                node_id: Some(x.clone()),
                feedback_type: "REJECT".into(),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    }

    let created = app.generate_insights(ADMIN, None).await.unwrap();
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].insight_type, "low_accuracy");

    // Same findings, no duplicates while unresolved
    assert!(app.generate_insights(ADMIN, None).await.unwrap().is_empty());

    app.resolve_insight(ADMIN, &created[0].id).await.unwrap();
    assert_eq!(app.generate_insights(ADMIN, None).await.unwrap().len(), 1);
}

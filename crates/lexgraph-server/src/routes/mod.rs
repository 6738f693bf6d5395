//! HTTP routes

mod admin;
mod comments;
mod feedback;
mod graph;
mod health;
mod shares;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, patch, post},
};
use lexgraph_core::api::LexGraph;
use serde::Deserialize;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub type AppState = Arc<LexGraph>;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionQuery {
    session_id: String,
}

pub fn router(app: AppState) -> Router {
    Router::new()
        .route(
            "/graph",
            get(graph::get_graph)
                .post(graph::build_graph)
                .patch(graph::save_layout)
                .delete(graph::delete_graph),
        )
        .route(
            "/feedback",
            get(feedback::list_feedback).post(feedback::submit_feedback),
        )
        .route(
            "/comments",
            get(comments::list_comments)
                .post(comments::create_comment)
                .patch(comments::update_comment)
                .delete(comments::delete_comment),
        )
        .route(
            "/shares",
            get(shares::list_shares)
                .post(shares::create_share)
                .delete(shares::revoke_share),
        )
        .route("/shares/{token}/graph", get(graph::shared_graph))
        .route("/admin/learning", get(admin::learning_report))
        .route(
            "/admin/insights",
            get(admin::list_insights).post(admin::create_insight),
        )
        .route("/admin/insights/generate", post(admin::generate_insights))
        .route("/admin/insights/{id}/resolve", patch(admin::resolve_insight))
        .route("/health", get(health::health))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(app)
}

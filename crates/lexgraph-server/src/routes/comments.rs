//! Comment routes

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use lexgraph_core::api::{CommentRequest, CommentUpdate};
use lexgraph_core::domain::comments::CommentFilter;
use serde::Deserialize;
use serde_json::json;

use super::AppState;
use crate::auth::Actor;
use crate::error::AppError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    session_id: String,
    node_id: Option<String>,
    edge_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBody {
    session_id: String,
    #[serde(flatten)]
    comment: CommentRequest,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBody {
    session_id: String,
    comment_id: String,
    #[serde(flatten)]
    update: CommentUpdate,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteQuery {
    session_id: String,
    comment_id: String,
}

pub async fn list_comments(
    State(app): State<AppState>,
    actor: Actor,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, AppError> {
    let filter = CommentFilter {
        node_id: query.node_id,
        edge_id: query.edge_id,
    };
    let comments = app
        .list_comments(&query.session_id, actor.id(), filter)
        .await?;
    Ok(Json(comments))
}

pub async fn create_comment(
    State(app): State<AppState>,
    actor: Actor,
    Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, AppError> {
    let comment = app
        .create_comment(&body.session_id, actor.id(), body.comment)
        .await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

pub async fn update_comment(
    State(app): State<AppState>,
    actor: Actor,
    Json(body): Json<UpdateBody>,
) -> Result<impl IntoResponse, AppError> {
    let comment = app
        .update_comment(&body.session_id, actor.id(), &body.comment_id, body.update)
        .await?;
    Ok(Json(comment))
}

pub async fn delete_comment(
    State(app): State<AppState>,
    actor: Actor,
    Query(query): Query<DeleteQuery>,
) -> Result<impl IntoResponse, AppError> {
    let removed = app
        .delete_comment(&query.session_id, actor.id(), &query.comment_id)
        .await?;
    Ok(Json(json!({ "removed": removed })))
}

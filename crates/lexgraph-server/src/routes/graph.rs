//! Graph routes

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use lexgraph_core::api::PositionUpdate;
use serde::Deserialize;

use super::{AppState, SessionQuery};
use crate::auth::Actor;
use crate::error::AppError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildBody {
    session_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutBody {
    session_id: String,
    nodes: Vec<PositionUpdate>,
}

pub async fn get_graph(
    State(app): State<AppState>,
    actor: Actor,
    Query(query): Query<SessionQuery>,
) -> Result<impl IntoResponse, AppError> {
    let view = app.get_graph(&query.session_id, actor.id()).await?;
    Ok(Json(view))
}

pub async fn build_graph(
    State(app): State<AppState>,
    actor: Actor,
    Json(body): Json<BuildBody>,
) -> Result<impl IntoResponse, AppError> {
    let result = app.build_graph(&body.session_id, actor.id()).await?;
    let status = if result.already_building() {
        StatusCode::ACCEPTED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(result)))
}

pub async fn save_layout(
    State(app): State<AppState>,
    actor: Actor,
    Json(body): Json<LayoutBody>,
) -> Result<impl IntoResponse, AppError> {
    let result = app
        .save_layout(&body.session_id, actor.id(), body.nodes)
        .await?;
    Ok(Json(result))
}

pub async fn delete_graph(
    State(app): State<AppState>,
    actor: Actor,
    Query(query): Query<SessionQuery>,
) -> Result<impl IntoResponse, AppError> {
    app.delete_graph(&query.session_id, actor.id()).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Read-only view through a share link; no actor required
pub async fn shared_graph(
    State(app): State<AppState>,
    Path(token): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let view = app.shared_graph(&token).await?;
    Ok(Json(view))
}

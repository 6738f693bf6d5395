//! Feedback routes

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use lexgraph_core::api::FeedbackRequest;
use serde::Deserialize;

use super::{AppState, SessionQuery};
use crate::auth::Actor;
use crate::error::AppError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackBody {
    session_id: String,
    #[serde(flatten)]
    feedback: FeedbackRequest,
}

pub async fn submit_feedback(
    State(app): State<AppState>,
    actor: Actor,
    Json(body): Json<FeedbackBody>,
) -> Result<impl IntoResponse, AppError> {
    let event = app
        .submit_feedback(&body.session_id, actor.id(), body.feedback)
        .await?;
    Ok((StatusCode::CREATED, Json(event)))
}

pub async fn list_feedback(
    State(app): State<AppState>,
    actor: Actor,
    Query(query): Query<SessionQuery>,
) -> Result<impl IntoResponse, AppError> {
    let events = app.list_feedback(&query.session_id, actor.id()).await?;
    Ok(Json(events))
}

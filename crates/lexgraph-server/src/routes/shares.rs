//! Share routes

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use lexgraph_core::api::ShareRequestDto;
use serde::Deserialize;

use super::{AppState, SessionQuery};
use crate::auth::Actor;
use crate::error::AppError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBody {
    session_id: String,
    #[serde(flatten)]
    share: ShareRequestDto,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevokeQuery {
    session_id: String,
    share_id: String,
}

pub async fn list_shares(
    State(app): State<AppState>,
    actor: Actor,
    Query(query): Query<SessionQuery>,
) -> Result<impl IntoResponse, AppError> {
    let shares = app.list_shares(&query.session_id, actor.id()).await?;
    Ok(Json(shares))
}

pub async fn create_share(
    State(app): State<AppState>,
    actor: Actor,
    Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, AppError> {
    let share = app
        .create_share(&body.session_id, actor.id(), body.share)
        .await?;
    Ok((StatusCode::CREATED, Json(share)))
}

pub async fn revoke_share(
    State(app): State<AppState>,
    actor: Actor,
    Query(query): Query<RevokeQuery>,
) -> Result<impl IntoResponse, AppError> {
    app.revoke_share(&query.session_id, actor.id(), &query.share_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

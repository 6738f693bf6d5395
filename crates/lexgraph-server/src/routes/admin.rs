//! Learning and insight routes; admin only

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use lexgraph_core::domain::metrics::NewInsight;
use serde::Deserialize;

use super::AppState;
use crate::auth::Actor;
use crate::error::AppError;

#[derive(Debug, Default, Deserialize)]
pub struct DaysQuery {
    days: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsightsQuery {
    #[serde(default)]
    include_resolved: bool,
}

pub async fn learning_report(
    State(app): State<AppState>,
    actor: Actor,
    Query(query): Query<DaysQuery>,
) -> Result<impl IntoResponse, AppError> {
    let report = app.learning_report(actor.id(), query.days).await?;
    Ok(Json(report))
}

pub async fn list_insights(
    State(app): State<AppState>,
    actor: Actor,
    Query(query): Query<InsightsQuery>,
) -> Result<impl IntoResponse, AppError> {
    let insights = app.list_insights(actor.id(), query.include_resolved).await?;
    Ok(Json(insights))
}

pub async fn create_insight(
    State(app): State<AppState>,
    actor: Actor,
    Json(body): Json<NewInsight>,
) -> Result<impl IntoResponse, AppError> {
    let insight = app.create_insight(actor.id(), body).await?;
    Ok((StatusCode::CREATED, Json(insight)))
}

pub async fn generate_insights(
    State(app): State<AppState>,
    actor: Actor,
    Query(query): Query<DaysQuery>,
) -> Result<impl IntoResponse, AppError> {
    let created = app.generate_insights(actor.id(), query.days).await?;
    Ok(Json(created))
}

pub async fn resolve_insight(
    State(app): State<AppState>,
    actor: Actor,
    Path(insight_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    app.resolve_insight(actor.id(), &insight_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

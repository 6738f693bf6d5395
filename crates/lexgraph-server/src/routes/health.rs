//! Health probe

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};

use super::AppState;

pub async fn health(State(app): State<AppState>) -> impl IntoResponse {
    let report = app.health().await;
    let status = if report.is_healthy() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(report))
}

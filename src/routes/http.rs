//! HTTP endpoint handlers. These are thin wrappers that forward to core logic.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use tracing::{error, instrument};

use crate::error::AppError;
use crate::logic::{evaluate_answer, generate_problem};
use crate::protocol::*;
use crate::state::AppState;

#[instrument(level = "info", skip(state))]
pub async fn http_health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.store.health().await {
        Ok(()) => (StatusCode::OK, Json(HealthOut { ok: true, error: None })),
        Err(e) => {
            error!(target: "pmath_backend", store = state.store.name(), error = %e, "Health check failed");
            (StatusCode::SERVICE_UNAVAILABLE, Json(HealthOut { ok: false, error: Some(e.to_string()) }))
        }
    }
}

#[instrument(level = "info", skip(state))]
pub async fn http_post_math_problem(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ProblemOut>, AppError> {
    generate_problem(&state)
        .await
        .map(Json)
        .map_err(|e| log_failure("problem", e))
}

#[instrument(level = "info", skip(state, body))]
pub async fn http_post_submit_answer(
    State(state): State<Arc<AppState>>,
    body: Result<Json<AnswerIn>, JsonRejection>,
) -> Result<Json<AnswerOut>, AppError> {
    let Json(body) = body?;
    let req = body.validate()?;
    evaluate_answer(&state, req)
        .await
        .map(Json)
        .map_err(|e| log_failure("answer", e))
}

fn log_failure(pipeline: &'static str, e: AppError) -> AppError {
    error!(target: "pmath_backend", %pipeline, error = %e, "Request failed");
    e
}

// src/handlers/attempt.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::{
    error::AppError,
    models::attempt::{AttemptResponse, FinishAttemptRequest},
    services::attempt::AttemptEngine,
    utils::jwt::Claims,
};

/// Starts an attempt on a quiz, or resumes the caller's open one.
///
/// * 201 Created when a new attempt was opened.
/// * 200 OK when an attempt was already in progress (returned unchanged).
#[utoipa::path(
    post,
    path = "/api/quizzes/{id}/start",
    params(("id" = i64, Path, description = "Quiz id")),
    responses(
        (status = 201, description = "Attempt created", body = AttemptResponse),
        (status = 200, description = "Attempt already in progress", body = AttemptResponse),
        (status = 404, description = "Quiz not found")
    )
)]
pub async fn start_attempt(
    State(engine): State<AttemptEngine>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let user = claims.identity()?;
    let outcome = engine.start(id, &user).await?;

    let status = if outcome.is_created() {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };

    Ok((status, Json(outcome.into_attempt())))
}

/// Submits answers for the caller's open attempt, scores it and closes it.
///
/// Answers referencing questions or options outside the quiz are ignored.
/// Returns 400 with `{"error": "No active attempts."}` when nothing is in
/// progress and `{"error": "No answer data."}` for an empty submission.
#[utoipa::path(
    post,
    path = "/api/quizzes/{id}/finish",
    params(("id" = i64, Path, description = "Quiz id")),
    request_body = FinishAttemptRequest,
    responses(
        (status = 200, description = "Attempt completed", body = AttemptResponse),
        (status = 400, description = "No active attempt or no answer data"),
        (status = 404, description = "Quiz not found")
    )
)]
pub async fn finish_attempt(
    State(engine): State<AttemptEngine>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    Json(req): Json<FinishAttemptRequest>,
) -> Result<Json<AttemptResponse>, AppError> {
    let user = claims.identity()?;
    let attempt = engine.finish(id, &user, req).await?;

    Ok(Json(attempt))
}

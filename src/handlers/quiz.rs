// src/handlers/quiz.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use validator::Validate;

use crate::{
    error::AppError,
    models::quiz::{CreateQuizRequest, QuizResponse, UpdateQuizRequest},
    services::catalog::Catalog,
    utils::jwt::Claims,
};

/// Lists every quiz, newest first, with questions and options inlined.
#[utoipa::path(
    get,
    path = "/api/quizzes",
    responses((status = 200, body = [QuizResponse]))
)]
pub async fn list_quizzes(
    State(catalog): State<Catalog>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user = claims.identity()?;
    let quizzes = catalog.list_quizzes(&user).await?;

    Ok(Json(quizzes))
}

/// Creates a quiz owned by the caller.
/// Nested questions and options are created in the same transaction.
#[utoipa::path(
    post,
    path = "/api/quizzes",
    request_body = CreateQuizRequest,
    responses(
        (status = 201, body = QuizResponse),
        (status = 400, description = "Validation failed")
    )
)]
pub async fn create_quiz(
    State(catalog): State<Catalog>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let user = claims.identity()?;
    let quiz = catalog.create_quiz(&user, payload).await?;

    Ok((StatusCode::CREATED, Json(quiz)))
}

#[utoipa::path(
    get,
    path = "/api/quizzes/{id}",
    params(("id" = i64, Path, description = "Quiz id")),
    responses(
        (status = 200, body = QuizResponse),
        (status = 404, description = "Quiz not found")
    )
)]
pub async fn get_quiz(
    State(catalog): State<Catalog>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let user = claims.identity()?;
    let quiz = catalog.get_quiz(&user, id).await?;

    Ok(Json(quiz))
}

/// Updates a quiz. Owner only.
#[utoipa::path(
    put,
    path = "/api/quizzes/{id}",
    params(("id" = i64, Path, description = "Quiz id")),
    request_body = UpdateQuizRequest,
    responses(
        (status = 200, body = QuizResponse),
        (status = 403, description = "Caller does not own the quiz"),
        (status = 404, description = "Quiz not found")
    )
)]
pub async fn update_quiz(
    State(catalog): State<Catalog>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let user = claims.identity()?;
    let quiz = catalog.update_quiz(&user, id, payload).await?;

    Ok(Json(quiz))
}

/// Deletes a quiz with all its questions, options, attempts and answers. Owner only.
#[utoipa::path(
    delete,
    path = "/api/quizzes/{id}",
    params(("id" = i64, Path, description = "Quiz id")),
    responses(
        (status = 204, description = "Quiz deleted"),
        (status = 403, description = "Caller does not own the quiz"),
        (status = 404, description = "Quiz not found")
    )
)]
pub async fn delete_quiz(
    State(catalog): State<Catalog>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let user = claims.identity()?;
    catalog.delete_quiz(&user, id).await?;

    Ok(StatusCode::NO_CONTENT)
}

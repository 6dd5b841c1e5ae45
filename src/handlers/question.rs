// src/handlers/question.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use validator::Validate;

use crate::{
    error::AppError,
    models::question::{CreateQuestionRequest, QuestionResponse, UpdateQuestionRequest},
    services::catalog::Catalog,
    utils::jwt::Claims,
};

/// Lists the questions of every quiz.
#[utoipa::path(
    get,
    path = "/api/quizzes/questions",
    responses((status = 200, body = [QuestionResponse]))
)]
pub async fn list_all_questions(
    State(catalog): State<Catalog>,
) -> Result<impl IntoResponse, AppError> {
    let questions = catalog.list_all_questions().await?;

    Ok(Json(questions))
}

#[utoipa::path(
    get,
    path = "/api/quizzes/{quiz_id}/questions",
    params(("quiz_id" = i64, Path, description = "Quiz id")),
    responses(
        (status = 200, body = [QuestionResponse]),
        (status = 404, description = "Quiz not found")
    )
)]
pub async fn list_questions(
    State(catalog): State<Catalog>,
    Path(quiz_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let questions = catalog.list_questions(quiz_id).await?;

    Ok(Json(questions))
}

/// Adds a question (and optionally its options) to a quiz. Quiz owner only.
#[utoipa::path(
    post,
    path = "/api/quizzes/{quiz_id}/questions",
    params(("quiz_id" = i64, Path, description = "Quiz id")),
    request_body = CreateQuestionRequest,
    responses(
        (status = 201, body = QuestionResponse),
        (status = 403, description = "Caller does not own the quiz"),
        (status = 404, description = "Quiz not found")
    )
)]
pub async fn create_question(
    State(catalog): State<Catalog>,
    Extension(claims): Extension<Claims>,
    Path(quiz_id): Path<i64>,
    Json(payload): Json<CreateQuestionRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let user = claims.identity()?;
    let question = catalog.create_question(&user, quiz_id, payload).await?;

    Ok((StatusCode::CREATED, Json(question)))
}

#[utoipa::path(
    get,
    path = "/api/quizzes/{quiz_id}/questions/{question_id}",
    params(
        ("quiz_id" = i64, Path, description = "Quiz id"),
        ("question_id" = i64, Path, description = "Question id")
    ),
    responses(
        (status = 200, body = QuestionResponse),
        (status = 404, description = "Question not found")
    )
)]
pub async fn get_question(
    State(catalog): State<Catalog>,
    Path((quiz_id, id)): Path<(i64, i64)>,
) -> Result<impl IntoResponse, AppError> {
    let question = catalog.get_question(quiz_id, id).await?;

    Ok(Json(question))
}

#[utoipa::path(
    put,
    path = "/api/quizzes/{quiz_id}/questions/{question_id}",
    params(
        ("quiz_id" = i64, Path, description = "Quiz id"),
        ("question_id" = i64, Path, description = "Question id")
    ),
    request_body = UpdateQuestionRequest,
    responses(
        (status = 200, body = QuestionResponse),
        (status = 403, description = "Caller does not own the quiz"),
        (status = 404, description = "Question not found")
    )
)]
pub async fn update_question(
    State(catalog): State<Catalog>,
    Extension(claims): Extension<Claims>,
    Path((quiz_id, id)): Path<(i64, i64)>,
    Json(payload): Json<UpdateQuestionRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let user = claims.identity()?;
    let question = catalog.update_question(&user, quiz_id, id, payload).await?;

    Ok(Json(question))
}

#[utoipa::path(
    delete,
    path = "/api/quizzes/{quiz_id}/questions/{question_id}",
    params(
        ("quiz_id" = i64, Path, description = "Quiz id"),
        ("question_id" = i64, Path, description = "Question id")
    ),
    responses(
        (status = 204, description = "Question deleted"),
        (status = 403, description = "Caller does not own the quiz"),
        (status = 404, description = "Question not found")
    )
)]
pub async fn delete_question(
    State(catalog): State<Catalog>,
    Extension(claims): Extension<Claims>,
    Path((quiz_id, id)): Path<(i64, i64)>,
) -> Result<impl IntoResponse, AppError> {
    let user = claims.identity()?;
    catalog.delete_question(&user, quiz_id, id).await?;

    Ok(StatusCode::NO_CONTENT)
}

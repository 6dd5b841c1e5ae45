// src/handlers/option.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use validator::Validate;

use crate::{
    error::AppError,
    models::answer_option::{AnswerOptionResponse, CreateOptionRequest, UpdateOptionRequest},
    services::catalog::Catalog,
    utils::jwt::Claims,
};

#[utoipa::path(
    get,
    path = "/api/quizzes/{quiz_id}/questions/{question_id}/options",
    params(
        ("quiz_id" = i64, Path, description = "Quiz id"),
        ("question_id" = i64, Path, description = "Question id")
    ),
    responses(
        (status = 200, body = [AnswerOptionResponse]),
        (status = 404, description = "Question not found")
    )
)]
pub async fn list_options(
    State(catalog): State<Catalog>,
    Path((quiz_id, question_id)): Path<(i64, i64)>,
) -> Result<impl IntoResponse, AppError> {
    let options = catalog.list_options(quiz_id, question_id).await?;

    Ok(Json(options))
}

/// Adds an answer option to a question. Quiz owner only.
///
/// Whether the question ends up with a correct option is left to the author.
#[utoipa::path(
    post,
    path = "/api/quizzes/{quiz_id}/questions/{question_id}/options",
    params(
        ("quiz_id" = i64, Path, description = "Quiz id"),
        ("question_id" = i64, Path, description = "Question id")
    ),
    request_body = CreateOptionRequest,
    responses(
        (status = 201, body = AnswerOptionResponse),
        (status = 403, description = "Caller does not own the quiz"),
        (status = 404, description = "Question not found")
    )
)]
pub async fn create_option(
    State(catalog): State<Catalog>,
    Extension(claims): Extension<Claims>,
    Path((quiz_id, question_id)): Path<(i64, i64)>,
    Json(payload): Json<CreateOptionRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let user = claims.identity()?;
    let option = catalog
        .create_option(&user, quiz_id, question_id, payload)
        .await?;

    Ok((StatusCode::CREATED, Json(option)))
}

#[utoipa::path(
    get,
    path = "/api/quizzes/{quiz_id}/questions/{question_id}/options/{option_id}",
    params(
        ("quiz_id" = i64, Path, description = "Quiz id"),
        ("question_id" = i64, Path, description = "Question id"),
        ("option_id" = i64, Path, description = "Answer option id")
    ),
    responses(
        (status = 200, body = AnswerOptionResponse),
        (status = 404, description = "Answer option not found")
    )
)]
pub async fn get_option(
    State(catalog): State<Catalog>,
    Path((quiz_id, question_id, id)): Path<(i64, i64, i64)>,
) -> Result<impl IntoResponse, AppError> {
    let option = catalog.get_option(quiz_id, question_id, id).await?;

    Ok(Json(option))
}

#[utoipa::path(
    put,
    path = "/api/quizzes/{quiz_id}/questions/{question_id}/options/{option_id}",
    params(
        ("quiz_id" = i64, Path, description = "Quiz id"),
        ("question_id" = i64, Path, description = "Question id"),
        ("option_id" = i64, Path, description = "Answer option id")
    ),
    request_body = UpdateOptionRequest,
    responses(
        (status = 200, body = AnswerOptionResponse),
        (status = 403, description = "Caller does not own the quiz"),
        (status = 404, description = "Answer option not found")
    )
)]
pub async fn update_option(
    State(catalog): State<Catalog>,
    Extension(claims): Extension<Claims>,
    Path((quiz_id, question_id, id)): Path<(i64, i64, i64)>,
    Json(payload): Json<UpdateOptionRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let user = claims.identity()?;
    let option = catalog
        .update_option(&user, quiz_id, question_id, id, payload)
        .await?;

    Ok(Json(option))
}

#[utoipa::path(
    delete,
    path = "/api/quizzes/{quiz_id}/questions/{question_id}/options/{option_id}",
    params(
        ("quiz_id" = i64, Path, description = "Quiz id"),
        ("question_id" = i64, Path, description = "Question id"),
        ("option_id" = i64, Path, description = "Answer option id")
    ),
    responses(
        (status = 204, description = "Answer option deleted"),
        (status = 403, description = "Caller does not own the quiz"),
        (status = 404, description = "Answer option not found")
    )
)]
pub async fn delete_option(
    State(catalog): State<Catalog>,
    Extension(claims): Extension<Claims>,
    Path((quiz_id, question_id, id)): Path<(i64, i64, i64)>,
) -> Result<impl IntoResponse, AppError> {
    let user = claims.identity()?;
    catalog
        .delete_option(&user, quiz_id, question_id, id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

// src/handlers/docs.rs

use axum::Json;
use utoipa::OpenApi;

use crate::{
    handlers::{attempt, option, question, quiz},
    models::{
        answer_option::{AnswerOptionResponse, CreateOptionRequest, UpdateOptionRequest},
        attempt::{AttemptResponse, FinishAttemptRequest, SubmittedAnswer, UserAnswerResponse},
        question::{CreateQuestionRequest, QuestionResponse, UpdateQuestionRequest},
        quiz::{CreateQuizRequest, QuizResponse, UpdateQuizRequest},
    },
};

#[derive(OpenApi)]
#[openapi(
    paths(
        attempt::start_attempt,
        attempt::finish_attempt,
        quiz::list_quizzes,
        quiz::create_quiz,
        quiz::get_quiz,
        quiz::update_quiz,
        quiz::delete_quiz,
        question::list_all_questions,
        question::list_questions,
        question::create_question,
        question::get_question,
        question::update_question,
        question::delete_question,
        option::list_options,
        option::create_option,
        option::get_option,
        option::update_option,
        option::delete_option,
    ),
    components(schemas(
        AttemptResponse,
        UserAnswerResponse,
        FinishAttemptRequest,
        SubmittedAnswer,
        QuizResponse,
        CreateQuizRequest,
        UpdateQuizRequest,
        QuestionResponse,
        CreateQuestionRequest,
        UpdateQuestionRequest,
        AnswerOptionResponse,
        CreateOptionRequest,
        UpdateOptionRequest,
    )),
    tags((name = "quizzes", description = "Quiz catalog and attempts"))
)]
pub struct ApiDoc;

/// Serves the OpenAPI document.
pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

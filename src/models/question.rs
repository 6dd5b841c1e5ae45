// src/models/question.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::models::answer_option::{AnswerOptionResponse, CreateOptionRequest};

/// Represents the 'questions' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Question {
    pub id: i64,
    pub quiz_id: i64,

    /// The text content of the question.
    pub text: String,

    /// Points awarded when the selected option is correct.
    pub points: i32,
}

/// DTO for sending a question to the client, options included.
#[derive(Debug, Serialize, ToSchema)]
pub struct QuestionResponse {
    pub id: i64,
    pub text: String,
    pub score: i32,
    pub options: Vec<AnswerOptionResponse>,
}

impl QuestionResponse {
    pub fn new(question: Question, options: Vec<AnswerOptionResponse>) -> Self {
        Self {
            id: question.id,
            text: question.text,
            score: question.points,
            options,
        }
    }
}

fn default_points() -> i32 {
    1
}

/// DTO for creating a new question, optionally with its answer options.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateQuestionRequest {
    #[validate(length(min = 1, max = 5000))]
    pub text: String,
    #[serde(default = "default_points")]
    #[validate(range(min = 0))]
    pub score: i32,
    #[serde(default)]
    #[validate(nested)]
    pub options: Vec<CreateOptionRequest>,
}

/// DTO for updating a question. Fields are optional.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateQuestionRequest {
    #[validate(length(min = 1, max = 5000))]
    pub text: Option<String>,
    #[validate(range(min = 0))]
    pub score: Option<i32>,
}

impl UpdateQuestionRequest {
    pub fn is_empty(&self) -> bool {
        self.text.is_none() && self.score.is_none()
    }
}

// src/models/quiz.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::models::question::{CreateQuestionRequest, QuestionResponse};

/// Represents the 'quizzes' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Quiz {
    pub id: i64,
    pub title: String,
    pub description: String,

    /// Identity-provider id of the creator. Only this user may mutate the quiz.
    pub owner_id: i64,
    pub owner_username: String,

    pub created_at: chrono::DateTime<chrono::Utc>,

    /// Informational only: attempts are accepted regardless of this flag.
    pub is_active: bool,
}

/// Quiz as returned to clients, with its questions and their options inlined.
#[derive(Debug, Serialize, ToSchema)]
pub struct QuizResponse {
    pub id: i64,
    pub title: String,
    pub description: String,
    /// Owner's username.
    pub owner: String,
    pub owner_id: i64,
    /// Whether the caller owns this quiz.
    pub is_owner: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub is_active: bool,
    pub questions: Vec<QuestionResponse>,
    pub questions_count: usize,
}

impl QuizResponse {
    pub fn new(quiz: Quiz, questions: Vec<QuestionResponse>, caller_id: i64) -> Self {
        Self {
            id: quiz.id,
            is_owner: quiz.owner_id == caller_id,
            title: quiz.title,
            description: quiz.description,
            owner: quiz.owner_username,
            owner_id: quiz.owner_id,
            created_at: quiz.created_at,
            is_active: quiz.is_active,
            questions_count: questions.len(),
            questions,
        }
    }
}

/// DTO for creating a quiz, optionally together with its questions and options.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateQuizRequest {
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    #[serde(default)]
    #[validate(length(max = 10000))]
    pub description: String,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    #[validate(nested)]
    pub questions: Vec<CreateQuestionRequest>,
}

/// DTO for updating a quiz. Fields are optional.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateQuizRequest {
    #[validate(length(min = 1, max = 255))]
    pub title: Option<String>,
    #[validate(length(max = 10000))]
    pub description: Option<String>,
    pub is_active: Option<bool>,
}

impl UpdateQuizRequest {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none() && self.is_active.is_none()
    }
}

// src/models/answer_option.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

/// Represents the 'answer_options' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct AnswerOption {
    pub id: i64,
    pub question_id: i64,
    pub answer: String,
    pub is_correct: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AnswerOptionResponse {
    pub id: i64,
    pub answer: String,
    pub is_correct: bool,
}

impl From<AnswerOption> for AnswerOptionResponse {
    fn from(option: AnswerOption) -> Self {
        Self {
            id: option.id,
            answer: option.answer,
            is_correct: option.is_correct,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateOptionRequest {
    #[validate(length(min = 1, max = 255))]
    pub answer: String,
    #[serde(default)]
    pub is_correct: bool,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateOptionRequest {
    #[validate(length(min = 1, max = 255))]
    pub answer: Option<String>,
    pub is_correct: Option<bool>,
}

impl UpdateOptionRequest {
    pub fn is_empty(&self) -> bool {
        self.answer.is_none() && self.is_correct.is_none()
    }
}

// src/models/attempt.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// Represents the 'attempts' table in the database.
/// One user's run through one quiz.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Attempt {
    pub id: i64,
    pub quiz_id: i64,
    pub user_id: i64,
    pub user_username: String,
    pub started_at: chrono::DateTime<chrono::Utc>,

    /// `None` while the attempt is in progress.
    pub completed_at: Option<chrono::DateTime<chrono::Utc>>,

    /// Only meaningful once `completed_at` is set.
    pub score: i32,
}

impl Attempt {
    pub fn is_in_progress(&self) -> bool {
        self.completed_at.is_none()
    }
}

/// A stored user answer joined with its question and the selected option.
#[derive(Debug, Clone, FromRow)]
pub struct AnswerDetail {
    pub question_id: i64,
    pub question_text: String,
    pub points: i32,
    pub option_id: i64,
    pub selected_answer: String,
    pub is_correct: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserAnswerResponse {
    pub question_text: String,
    pub selected_answer: String,
    pub is_correct: bool,
}

impl From<AnswerDetail> for UserAnswerResponse {
    fn from(detail: AnswerDetail) -> Self {
        Self {
            question_text: detail.question_text,
            selected_answer: detail.selected_answer,
            is_correct: detail.is_correct,
        }
    }
}

/// Attempt as returned by the start and finish endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AttemptResponse {
    pub id: i64,
    pub quiz_title: String,
    pub user_username: String,
    pub started_at: chrono::DateTime<chrono::Utc>,
    pub completed_at: Option<chrono::DateTime<chrono::Utc>>,
    pub score: i32,
    pub answers: Vec<UserAnswerResponse>,
}

impl AttemptResponse {
    pub fn new(attempt: Attempt, quiz_title: String, answers: Vec<AnswerDetail>) -> Self {
        Self {
            id: attempt.id,
            quiz_title,
            user_username: attempt.user_username,
            started_at: attempt.started_at,
            completed_at: attempt.completed_at,
            score: attempt.score,
            answers: answers.into_iter().map(UserAnswerResponse::from).collect(),
        }
    }
}

/// One entry of a finish submission.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema)]
pub struct SubmittedAnswer {
    pub question_id: i64,
    pub option_id: i64,
}

/// DTO for finishing an attempt. A missing `answers` key is treated as empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct FinishAttemptRequest {
    #[serde(default)]
    pub answers: Vec<SubmittedAnswer>,
}

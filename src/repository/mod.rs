// src/repository/mod.rs

//! Storage interfaces.
//!
//! Services only ever talk to these traits. Catalog repositories run each call
//! in its own implicit transaction; attempt work goes through an explicit
//! [`AttemptRepository`] obtained from [`Store::begin`], which either commits
//! as a whole or is discarded when dropped.

pub mod memory;
pub mod postgres;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{
    error::AppError,
    models::{
        answer_option::{AnswerOption, CreateOptionRequest, UpdateOptionRequest},
        attempt::{AnswerDetail, Attempt},
        question::{CreateQuestionRequest, Question, UpdateQuestionRequest},
        quiz::{CreateQuizRequest, Quiz, UpdateQuizRequest},
        user::Identity,
    },
};

pub use memory::MemoryStore;
pub use postgres::PgStore;

pub type SharedStore = Arc<dyn Store>;

#[async_trait]
pub trait QuizRepository: Send + Sync {
    /// All quizzes, newest first.
    async fn list_quizzes(&self) -> Result<Vec<Quiz>, AppError>;
    async fn find_quiz(&self, id: i64) -> Result<Option<Quiz>, AppError>;
    /// Inserts the quiz together with any nested questions and options, atomically.
    async fn insert_quiz(&self, owner: &Identity, quiz: &CreateQuizRequest) -> Result<Quiz, AppError>;
    async fn update_quiz(&self, id: i64, changes: &UpdateQuizRequest) -> Result<Option<Quiz>, AppError>;
    /// Removes the quiz and every row that hangs off it. Returns `false` if it did not exist.
    async fn delete_quiz(&self, id: i64) -> Result<bool, AppError>;
}

#[async_trait]
pub trait QuestionRepository: Send + Sync {
    /// Questions in id order, restricted to one quiz when `quiz_id` is given.
    async fn list_questions(&self, quiz_id: Option<i64>) -> Result<Vec<Question>, AppError>;
    async fn find_question(&self, id: i64) -> Result<Option<Question>, AppError>;
    async fn insert_question(
        &self,
        quiz_id: i64,
        question: &CreateQuestionRequest,
    ) -> Result<Question, AppError>;
    async fn update_question(
        &self,
        id: i64,
        changes: &UpdateQuestionRequest,
    ) -> Result<Option<Question>, AppError>;
    async fn delete_question(&self, id: i64) -> Result<bool, AppError>;
}

#[async_trait]
pub trait OptionRepository: Send + Sync {
    /// Options belonging to any of `question_ids`, in id order.
    async fn list_options(&self, question_ids: &[i64]) -> Result<Vec<AnswerOption>, AppError>;
    async fn find_option(&self, id: i64) -> Result<Option<AnswerOption>, AppError>;
    async fn insert_option(
        &self,
        question_id: i64,
        option: &CreateOptionRequest,
    ) -> Result<AnswerOption, AppError>;
    async fn update_option(
        &self,
        id: i64,
        changes: &UpdateOptionRequest,
    ) -> Result<Option<AnswerOption>, AppError>;
    async fn delete_option(&self, id: i64) -> Result<bool, AppError>;
}

/// Attempt and user-answer access, scoped to one open transaction.
#[async_trait]
pub trait AttemptRepository: Send {
    /// The in-progress attempt of `user_id` on `quiz_id`, locked for the rest of the transaction.
    async fn find_in_progress(
        &mut self,
        quiz_id: i64,
        user_id: i64,
    ) -> Result<Option<Attempt>, AppError>;

    /// Creates an in-progress attempt. Returns `None` when one already exists
    /// for the pair (the uniqueness guard fired).
    async fn insert_attempt(
        &mut self,
        quiz_id: i64,
        user: &Identity,
        started_at: DateTime<Utc>,
    ) -> Result<Option<Attempt>, AppError>;

    async fn find_question(&mut self, id: i64) -> Result<Option<Question>, AppError>;
    async fn find_option(&mut self, id: i64) -> Result<Option<AnswerOption>, AppError>;

    /// Creates or overwrites the answer for `(attempt_id, question_id)`.
    async fn upsert_answer(
        &mut self,
        attempt_id: i64,
        question_id: i64,
        option_id: i64,
    ) -> Result<(), AppError>;

    /// Every stored answer of the attempt, ordered by question id.
    async fn list_answers(&mut self, attempt_id: i64) -> Result<Vec<AnswerDetail>, AppError>;

    async fn complete_attempt(
        &mut self,
        attempt_id: i64,
        score: i32,
        completed_at: DateTime<Utc>,
    ) -> Result<Attempt, AppError>;

    async fn commit(self: Box<Self>) -> Result<(), AppError>;
}

#[async_trait]
pub trait Store: QuizRepository + QuestionRepository + OptionRepository {
    async fn begin(&self) -> Result<Box<dyn AttemptRepository>, AppError>;
}

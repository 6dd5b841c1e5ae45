// src/repository/postgres.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder, Transaction};

use super::{AttemptRepository, OptionRepository, QuestionRepository, QuizRepository, Store};
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

/// Store backed by Postgres. Cascades and the one-in-progress-attempt rule
/// are enforced by the schema in `migrations/`.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

async fn insert_question_row(
    conn: &mut PgConnection,
    quiz_id: i64,
    req: &CreateQuestionRequest,
) -> Result<Question, AppError> {
    let question = sqlx::query_as::<_, Question>(
        r#"
        INSERT INTO questions (quiz_id, text, points)
        VALUES ($1, $2, $3)
        RETURNING id, quiz_id, text, points
        "#,
    )
    .bind(quiz_id)
    .bind(&req.text)
    .bind(req.score)
    .fetch_one(&mut *conn)
    .await?;

    for option in &req.options {
        insert_option_row(&mut *conn, question.id, option).await?;
    }

    Ok(question)
}

async fn insert_option_row(
    conn: &mut PgConnection,
    question_id: i64,
    req: &CreateOptionRequest,
) -> Result<AnswerOption, AppError> {
    let option = sqlx::query_as::<_, AnswerOption>(
        r#"
        INSERT INTO answer_options (question_id, answer, is_correct)
        VALUES ($1, $2, $3)
        RETURNING id, question_id, answer, is_correct
        "#,
    )
    .bind(question_id)
    .bind(&req.answer)
    .bind(req.is_correct)
    .fetch_one(&mut *conn)
    .await?;

    Ok(option)
}

#[async_trait]
impl QuizRepository for PgStore {
    async fn list_quizzes(&self) -> Result<Vec<Quiz>, AppError> {
        let quizzes = sqlx::query_as::<_, Quiz>(
            r#"
            SELECT id, title, description, owner_id, owner_username, created_at, is_active
            FROM quizzes
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(quizzes)
    }

    async fn find_quiz(&self, id: i64) -> Result<Option<Quiz>, AppError> {
        let quiz = sqlx::query_as::<_, Quiz>(
            r#"
            SELECT id, title, description, owner_id, owner_username, created_at, is_active
            FROM quizzes
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(quiz)
    }

    async fn insert_quiz(&self, owner: &Identity, req: &CreateQuizRequest) -> Result<Quiz, AppError> {
        let mut tx = self.pool.begin().await?;

        let quiz = sqlx::query_as::<_, Quiz>(
            r#"
            INSERT INTO quizzes (title, description, owner_id, owner_username, is_active)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, title, description, owner_id, owner_username, created_at, is_active
            "#,
        )
        .bind(&req.title)
        .bind(&req.description)
        .bind(owner.id)
        .bind(&owner.username)
        .bind(req.is_active)
        .fetch_one(&mut *tx)
        .await?;

        for question in &req.questions {
            insert_question_row(&mut tx, quiz.id, question).await?;
        }

        tx.commit().await?;
        Ok(quiz)
    }

    async fn update_quiz(&self, id: i64, changes: &UpdateQuizRequest) -> Result<Option<Quiz>, AppError> {
        if changes.is_empty() {
            return self.find_quiz(id).await;
        }

        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE quizzes SET ");
        let mut separated = builder.separated(", ");

        if let Some(title) = &changes.title {
            separated.push("title = ");
            separated.push_bind_unseparated(title.clone());
        }

        if let Some(description) = &changes.description {
            separated.push("description = ");
            separated.push_bind_unseparated(description.clone());
        }

        if let Some(is_active) = changes.is_active {
            separated.push("is_active = ");
            separated.push_bind_unseparated(is_active);
        }

        builder.push(" WHERE id = ");
        builder.push_bind(id);
        builder.push(
            " RETURNING id, title, description, owner_id, owner_username, created_at, is_active",
        );

        let quiz = builder
            .build_query_as::<Quiz>()
            .fetch_optional(&self.pool)
            .await?;

        Ok(quiz)
    }

    async fn delete_quiz(&self, id: i64) -> Result<bool, AppError> {
        // Questions, options, attempts and answers go with it via ON DELETE CASCADE.
        let result = sqlx::query("DELETE FROM quizzes WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl QuestionRepository for PgStore {
    async fn list_questions(&self, quiz_id: Option<i64>) -> Result<Vec<Question>, AppError> {
        let questions = sqlx::query_as::<_, Question>(
            r#"
            SELECT id, quiz_id, text, points
            FROM questions
            WHERE ($1::BIGINT IS NULL OR quiz_id = $1)
            ORDER BY id
            "#,
        )
        .bind(quiz_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(questions)
    }

    async fn find_question(&self, id: i64) -> Result<Option<Question>, AppError> {
        let question = sqlx::query_as::<_, Question>(
            "SELECT id, quiz_id, text, points FROM questions WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(question)
    }

    async fn insert_question(
        &self,
        quiz_id: i64,
        question: &CreateQuestionRequest,
    ) -> Result<Question, AppError> {
        let mut tx = self.pool.begin().await?;
        let question = insert_question_row(&mut tx, quiz_id, question).await?;
        tx.commit().await?;
        Ok(question)
    }

    async fn update_question(
        &self,
        id: i64,
        changes: &UpdateQuestionRequest,
    ) -> Result<Option<Question>, AppError> {
        if changes.is_empty() {
            return QuestionRepository::find_question(self, id).await;
        }

        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE questions SET ");
        let mut separated = builder.separated(", ");

        if let Some(text) = &changes.text {
            separated.push("text = ");
            separated.push_bind_unseparated(text.clone());
        }

        if let Some(score) = changes.score {
            separated.push("points = ");
            separated.push_bind_unseparated(score);
        }

        builder.push(" WHERE id = ");
        builder.push_bind(id);
        builder.push(" RETURNING id, quiz_id, text, points");

        let question = builder
            .build_query_as::<Question>()
            .fetch_optional(&self.pool)
            .await?;

        Ok(question)
    }

    async fn delete_question(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM questions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl OptionRepository for PgStore {
    async fn list_options(&self, question_ids: &[i64]) -> Result<Vec<AnswerOption>, AppError> {
        let options = sqlx::query_as::<_, AnswerOption>(
            r#"
            SELECT id, question_id, answer, is_correct
            FROM answer_options
            WHERE question_id = ANY($1)
            ORDER BY id
            "#,
        )
        .bind(question_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(options)
    }

    async fn find_option(&self, id: i64) -> Result<Option<AnswerOption>, AppError> {
        let option = sqlx::query_as::<_, AnswerOption>(
            "SELECT id, question_id, answer, is_correct FROM answer_options WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(option)
    }

    async fn insert_option(
        &self,
        question_id: i64,
        option: &CreateOptionRequest,
    ) -> Result<AnswerOption, AppError> {
        let mut conn = self.pool.acquire().await?;
        insert_option_row(&mut conn, question_id, option).await
    }

    async fn update_option(
        &self,
        id: i64,
        changes: &UpdateOptionRequest,
    ) -> Result<Option<AnswerOption>, AppError> {
        if changes.is_empty() {
            return OptionRepository::find_option(self, id).await;
        }

        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE answer_options SET ");
        let mut separated = builder.separated(", ");

        if let Some(answer) = &changes.answer {
            separated.push("answer = ");
            separated.push_bind_unseparated(answer.clone());
        }

        if let Some(is_correct) = changes.is_correct {
            separated.push("is_correct = ");
            separated.push_bind_unseparated(is_correct);
        }

        builder.push(" WHERE id = ");
        builder.push_bind(id);
        builder.push(" RETURNING id, question_id, answer, is_correct");

        let option = builder
            .build_query_as::<AnswerOption>()
            .fetch_optional(&self.pool)
            .await?;

        Ok(option)
    }

    async fn delete_option(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM answer_options WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl Store for PgStore {
    async fn begin(&self) -> Result<Box<dyn AttemptRepository>, AppError> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgAttemptTransaction { tx }))
    }
}

struct PgAttemptTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl AttemptRepository for PgAttemptTransaction {
    async fn find_in_progress(
        &mut self,
        quiz_id: i64,
        user_id: i64,
    ) -> Result<Option<Attempt>, AppError> {
        let attempt = sqlx::query_as::<_, Attempt>(
            r#"
            SELECT id, quiz_id, user_id, user_username, started_at, completed_at, score
            FROM attempts
            WHERE quiz_id = $1 AND user_id = $2 AND completed_at IS NULL
            FOR UPDATE
            "#,
        )
        .bind(quiz_id)
        .bind(user_id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(attempt)
    }

    async fn insert_attempt(
        &mut self,
        quiz_id: i64,
        user: &Identity,
        started_at: DateTime<Utc>,
    ) -> Result<Option<Attempt>, AppError> {
        // attempts_one_in_progress is a partial unique index; a concurrent
        // starter blocks here until the other transaction finishes.
        let attempt = sqlx::query_as::<_, Attempt>(
            r#"
            INSERT INTO attempts (quiz_id, user_id, user_username, started_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (quiz_id, user_id) WHERE completed_at IS NULL DO NOTHING
            RETURNING id, quiz_id, user_id, user_username, started_at, completed_at, score
            "#,
        )
        .bind(quiz_id)
        .bind(user.id)
        .bind(&user.username)
        .bind(started_at)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(attempt)
    }

    async fn find_question(&mut self, id: i64) -> Result<Option<Question>, AppError> {
        let question = sqlx::query_as::<_, Question>(
            "SELECT id, quiz_id, text, points FROM questions WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(question)
    }

    async fn find_option(&mut self, id: i64) -> Result<Option<AnswerOption>, AppError> {
        let option = sqlx::query_as::<_, AnswerOption>(
            "SELECT id, question_id, answer, is_correct FROM answer_options WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(option)
    }

    async fn upsert_answer(
        &mut self,
        attempt_id: i64,
        question_id: i64,
        option_id: i64,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO user_answers (attempt_id, question_id, option_id)
            VALUES ($1, $2, $3)
            ON CONFLICT (attempt_id, question_id) DO UPDATE SET
                option_id = EXCLUDED.option_id
            "#,
        )
        .bind(attempt_id)
        .bind(question_id)
        .bind(option_id)
        .execute(&mut *self.tx)
        .await?;

        Ok(())
    }

    async fn list_answers(&mut self, attempt_id: i64) -> Result<Vec<AnswerDetail>, AppError> {
        let answers = sqlx::query_as::<_, AnswerDetail>(
            r#"
            SELECT
                ua.question_id,
                q.text AS question_text,
                q.points,
                ua.option_id,
                o.answer AS selected_answer,
                o.is_correct
            FROM user_answers ua
            JOIN questions q ON q.id = ua.question_id
            JOIN answer_options o ON o.id = ua.option_id
            WHERE ua.attempt_id = $1
            ORDER BY ua.question_id
            "#,
        )
        .bind(attempt_id)
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(answers)
    }

    async fn complete_attempt(
        &mut self,
        attempt_id: i64,
        score: i32,
        completed_at: DateTime<Utc>,
    ) -> Result<Attempt, AppError> {
        sqlx::query_as::<_, Attempt>(
            r#"
            UPDATE attempts
            SET completed_at = $2, score = $3
            WHERE id = $1
            RETURNING id, quiz_id, user_id, user_username, started_at, completed_at, score
            "#,
        )
        .bind(attempt_id)
        .bind(completed_at)
        .bind(score)
        .fetch_optional(&mut *self.tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Attempt not found".to_string()))
    }

    async fn commit(self: Box<Self>) -> Result<(), AppError> {
        let PgAttemptTransaction { tx } = *self;
        tx.commit().await?;
        Ok(())
    }
}

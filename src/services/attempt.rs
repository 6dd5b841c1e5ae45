// src/services/attempt.rs

//! Attempt lifecycle: start (or resume), record answers, score, complete.
//!
//! An attempt is in progress until it is finished; finishing is terminal.
//! Each operation runs inside one store transaction, so a failed finish
//! leaves neither stray answers nor a half-scored attempt behind.

use chrono::Utc;

use crate::{
    error::AppError,
    models::{
        attempt::{AnswerDetail, Attempt, AttemptResponse, FinishAttemptRequest, SubmittedAnswer},
        quiz::Quiz,
        user::Identity,
    },
    repository::{AttemptRepository, QuizRepository, SharedStore},
};

pub const NO_ACTIVE_ATTEMPT: &str = "No active attempts.";
pub const NO_ANSWER_DATA: &str = "No answer data.";

/// Result of starting an attempt.
#[derive(Debug, Clone)]
pub enum StartOutcome {
    /// A new attempt was opened.
    Created(AttemptResponse),
    /// The caller already had one in progress; it is returned untouched.
    Resumed(AttemptResponse),
}

impl StartOutcome {
    pub fn is_created(&self) -> bool {
        matches!(self, StartOutcome::Created(_))
    }

    pub fn attempt(&self) -> &AttemptResponse {
        match self {
            StartOutcome::Created(attempt) | StartOutcome::Resumed(attempt) => attempt,
        }
    }

    pub fn into_attempt(self) -> AttemptResponse {
        match self {
            StartOutcome::Created(attempt) | StartOutcome::Resumed(attempt) => attempt,
        }
    }
}

#[derive(Clone)]
pub struct AttemptEngine {
    store: SharedStore,
}

impl AttemptEngine {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    async fn load_quiz(&self, quiz_id: i64) -> Result<Quiz, AppError> {
        self.store
            .find_quiz(quiz_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Quiz not found".to_string()))
    }

    /// Opens an attempt for `user` on the quiz, or returns the one already in progress.
    ///
    /// Any authenticated user may attempt any existing quiz; `is_active` is not consulted.
    pub async fn start(&self, quiz_id: i64, user: &Identity) -> Result<StartOutcome, AppError> {
        let quiz = self.load_quiz(quiz_id).await?;
        let mut tx = self.store.begin().await?;

        if let Some(existing) = tx.find_in_progress(quiz.id, user.id).await? {
            let answers = tx.list_answers(existing.id).await?;
            tx.commit().await?;
            tracing::info!(attempt_id = existing.id, quiz_id, user_id = user.id, "attempt resumed");
            return Ok(StartOutcome::Resumed(AttemptResponse::new(
                existing, quiz.title, answers,
            )));
        }

        let outcome = match tx.insert_attempt(quiz.id, user, Utc::now()).await? {
            Some(created) => {
                tracing::info!(attempt_id = created.id, quiz_id, user_id = user.id, "attempt created");
                StartOutcome::Created(AttemptResponse::new(created, quiz.title, Vec::new()))
            }
            None => {
                // A concurrent start for the same pair committed first.
                let existing = tx
                    .find_in_progress(quiz.id, user.id)
                    .await?
                    .ok_or_else(|| {
                        AppError::InternalServerError(format!(
                            "in-progress attempt for quiz {} user {} disappeared",
                            quiz.id, user.id
                        ))
                    })?;
                let answers = tx.list_answers(existing.id).await?;
                tracing::info!(attempt_id = existing.id, quiz_id, user_id = user.id, "attempt resumed after race");
                StartOutcome::Resumed(AttemptResponse::new(existing, quiz.title, answers))
            }
        };

        tx.commit().await?;
        Ok(outcome)
    }

    /// Records the submitted answers, scores the attempt and closes it.
    ///
    /// Entries pointing outside the quiz are skipped. The score covers every
    /// answer stored for the attempt, not just this batch.
    pub async fn finish(
        &self,
        quiz_id: i64,
        user: &Identity,
        request: FinishAttemptRequest,
    ) -> Result<AttemptResponse, AppError> {
        let quiz = self.load_quiz(quiz_id).await?;
        let mut tx = self.store.begin().await?;

        let attempt = tx
            .find_in_progress(quiz.id, user.id)
            .await?
            .ok_or_else(|| AppError::BadRequest(NO_ACTIVE_ATTEMPT.to_string()))?;

        if request.answers.is_empty() {
            return Err(AppError::BadRequest(NO_ANSWER_DATA.to_string()));
        }

        let mut skipped = 0usize;
        for answer in &request.answers {
            if !record_answer(tx.as_mut(), &attempt, answer).await? {
                skipped += 1;
            }
        }

        let answers = tx.list_answers(attempt.id).await?;
        let score = score_answers(&answers);
        let completed = tx.complete_attempt(attempt.id, score, Utc::now()).await?;
        tx.commit().await?;

        tracing::info!(
            attempt_id = completed.id,
            quiz_id,
            user_id = user.id,
            score,
            submitted = request.answers.len(),
            skipped,
            "attempt completed"
        );

        Ok(AttemptResponse::new(completed, quiz.title, answers))
    }
}

/// Stores one answer for an in-progress attempt, replacing any earlier
/// selection for the same question.
///
/// Returns `Ok(false)` without touching the store when the question is not
/// part of the attempt's quiz or the option is not one of the question's.
pub async fn record_answer(
    tx: &mut dyn AttemptRepository,
    attempt: &Attempt,
    answer: &SubmittedAnswer,
) -> Result<bool, AppError> {
    if !attempt.is_in_progress() {
        return Err(AppError::BadRequest(NO_ACTIVE_ATTEMPT.to_string()));
    }

    let question = match tx.find_question(answer.question_id).await? {
        Some(question) if question.quiz_id == attempt.quiz_id => question,
        _ => {
            tracing::debug!(
                attempt_id = attempt.id,
                question_id = answer.question_id,
                "skipping answer: question is not part of this quiz"
            );
            return Ok(false);
        }
    };

    match tx.find_option(answer.option_id).await? {
        Some(option) if option.question_id == question.id => {}
        _ => {
            tracing::debug!(
                attempt_id = attempt.id,
                question_id = question.id,
                option_id = answer.option_id,
                "skipping answer: option does not belong to question"
            );
            return Ok(false);
        }
    }

    tx.upsert_answer(attempt.id, question.id, answer.option_id)
        .await?;
    Ok(true)
}

/// Sum of the question points of every correctly answered question.
///
/// Saturates at `i32::MAX`; point values are only bounded below.
pub fn score_answers(answers: &[AnswerDetail]) -> i32 {
    answers
        .iter()
        .filter(|answer| answer.is_correct)
        .fold(0i32, |total, answer| total.saturating_add(answer.points))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        models::{
            answer_option::CreateOptionRequest, question::CreateQuestionRequest,
            quiz::CreateQuizRequest,
        },
        repository::{MemoryStore, OptionRepository, QuestionRepository, QuizRepository},
    };

    struct Fixture {
        store: MemoryStore,
        engine: AttemptEngine,
        quiz_id: i64,
        /// (question id, [option ids]) in creation order
        questions: Vec<(i64, Vec<i64>)>,
        foreign_question: (i64, i64),
    }

    fn option(answer: &str, is_correct: bool) -> CreateOptionRequest {
        CreateOptionRequest {
            answer: answer.to_string(),
            is_correct,
        }
    }

    async fn question_ids(store: &MemoryStore, quiz_id: i64) -> Vec<(i64, Vec<i64>)> {
        let mut out = Vec::new();
        for question in store.list_questions(Some(quiz_id)).await.unwrap() {
            let options = store.list_options(&[question.id]).await.unwrap();
            out.push((question.id, options.into_iter().map(|o| o.id).collect()));
        }
        out
    }

    /// Question A (2 points, A1 correct) and question B (3 points, B2 correct),
    /// plus a second quiz owning one unrelated question.
    async fn fixture() -> Fixture {
        let store = MemoryStore::new();
        let owner = Identity::new(1, "owner");

        let quiz = store
            .insert_quiz(
                &owner,
                &CreateQuizRequest {
                    title: "Capitals".to_string(),
                    description: "European capitals".to_string(),
                    is_active: false,
                    questions: vec![
                        CreateQuestionRequest {
                            text: "Capital of France?".to_string(),
                            score: 2,
                            options: vec![option("Paris", true), option("Lyon", false)],
                        },
                        CreateQuestionRequest {
                            text: "Capital of Italy?".to_string(),
                            score: 3,
                            options: vec![option("Milan", false), option("Rome", true)],
                        },
                    ],
                },
            )
            .await
            .unwrap();

        let other = store
            .insert_quiz(
                &owner,
                &CreateQuizRequest {
                    title: "Rivers".to_string(),
                    description: String::new(),
                    is_active: true,
                    questions: vec![CreateQuestionRequest {
                        text: "Longest river?".to_string(),
                        score: 5,
                        options: vec![option("Nile", true)],
                    }],
                },
            )
            .await
            .unwrap();

        let questions = question_ids(&store, quiz.id).await;
        let foreign = question_ids(&store, other.id).await.remove(0);

        Fixture {
            engine: AttemptEngine::new(Arc::new(store.clone())),
            store,
            quiz_id: quiz.id,
            questions,
            foreign_question: (foreign.0, foreign.1[0]),
        }
    }

    fn taker() -> Identity {
        Identity::new(42, "taker")
    }

    fn submit(pairs: &[(i64, i64)]) -> FinishAttemptRequest {
        FinishAttemptRequest {
            answers: pairs
                .iter()
                .map(|&(question_id, option_id)| SubmittedAnswer {
                    question_id,
                    option_id,
                })
                .collect(),
        }
    }

    #[tokio::test]
    async fn test_start_is_idempotent() {
        let f = fixture().await;

        let first = f.engine.start(f.quiz_id, &taker()).await.unwrap();
        let second = f.engine.start(f.quiz_id, &taker()).await.unwrap();

        assert!(first.is_created());
        assert!(!second.is_created());
        assert_eq!(first.attempt().id, second.attempt().id);
        assert_eq!(f.store.attempt_count(f.quiz_id, 42).await, 1);
        assert!(first.attempt().answers.is_empty());
        assert_eq!(first.attempt().quiz_title, "Capitals");
        assert_eq!(first.attempt().user_username, "taker");
        assert!(first.attempt().completed_at.is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_starts_open_one_attempt() {
        let f = fixture().await;

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let engine = f.engine.clone();
                let quiz_id = f.quiz_id;
                tokio::spawn(async move { engine.start(quiz_id, &taker()).await.unwrap() })
            })
            .collect();

        let mut outcomes = Vec::new();
        for handle in handles {
            outcomes.push(handle.await.unwrap());
        }

        assert_eq!(outcomes.iter().filter(|o| o.is_created()).count(), 1);
        let id = outcomes[0].attempt().id;
        assert!(outcomes.iter().all(|o| o.attempt().id == id));
        assert_eq!(f.store.attempt_count(f.quiz_id, 42).await, 1);
    }

    #[tokio::test]
    async fn test_start_unknown_quiz_is_not_found() {
        let f = fixture().await;

        let err = f.engine.start(9999, &taker()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_inactive_quiz_can_be_started() {
        let f = fixture().await;
        let quiz = f.store.find_quiz(f.quiz_id).await.unwrap().unwrap();
        assert!(!quiz.is_active);

        assert!(f.engine.start(f.quiz_id, &taker()).await.unwrap().is_created());
    }

    #[tokio::test]
    async fn test_finish_scores_only_correct_answers() {
        let f = fixture().await;
        let (a, a_opts) = &f.questions[0];
        let (b, b_opts) = &f.questions[1];
        f.engine.start(f.quiz_id, &taker()).await.unwrap();

        // A1 correct (2 points), B1 incorrect.
        let result = f
            .engine
            .finish(f.quiz_id, &taker(), submit(&[(*a, a_opts[0]), (*b, b_opts[0])]))
            .await
            .unwrap();

        assert_eq!(result.score, 2);
        assert!(result.completed_at.is_some());
        assert_eq!(result.answers.len(), 2);
        assert_eq!(result.answers[0].selected_answer, "Paris");
        assert!(result.answers[0].is_correct);
        assert_eq!(result.answers[1].selected_answer, "Milan");
        assert!(!result.answers[1].is_correct);
    }

    #[tokio::test]
    async fn test_repeated_question_keeps_latest_selection() {
        let f = fixture().await;
        let (a, a_opts) = &f.questions[0];
        let started = f.engine.start(f.quiz_id, &taker()).await.unwrap();

        let result = f
            .engine
            .finish(f.quiz_id, &taker(), submit(&[(*a, a_opts[1]), (*a, a_opts[0])]))
            .await
            .unwrap();

        assert_eq!(f.store.answer_count(started.attempt().id).await, 1);
        assert_eq!(result.answers.len(), 1);
        assert_eq!(result.answers[0].selected_answer, "Paris");
        assert_eq!(result.score, 2);
    }

    #[tokio::test]
    async fn test_invalid_entries_are_skipped() {
        let f = fixture().await;
        let (a, a_opts) = &f.questions[0];
        let (b, _) = &f.questions[1];
        let (foreign_q, foreign_o) = f.foreign_question;
        f.engine.start(f.quiz_id, &taker()).await.unwrap();

        let result = f
            .engine
            .finish(
                f.quiz_id,
                &taker(),
                submit(&[
                    // question from another quiz
                    (foreign_q, foreign_o),
                    // option belongs to question A, not B
                    (*b, a_opts[0]),
                    // nonexistent ids
                    (-1, -1),
                    (*a, a_opts[0]),
                ]),
            )
            .await
            .unwrap();

        assert_eq!(result.score, 2);
        assert_eq!(result.answers.len(), 1);
    }

    #[tokio::test]
    async fn test_finish_without_attempt_is_rejected() {
        let f = fixture().await;
        let (a, a_opts) = &f.questions[0];

        let err = f
            .engine
            .finish(f.quiz_id, &taker(), submit(&[(*a, a_opts[0])]))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::BadRequest(ref msg) if msg == NO_ACTIVE_ATTEMPT));
    }

    #[tokio::test]
    async fn test_completed_attempt_is_terminal() {
        let f = fixture().await;
        let (a, a_opts) = &f.questions[0];
        let (b, b_opts) = &f.questions[1];
        let started = f.engine.start(f.quiz_id, &taker()).await.unwrap();

        let first = f
            .engine
            .finish(f.quiz_id, &taker(), submit(&[(*a, a_opts[0])]))
            .await
            .unwrap();
        assert_eq!(first.score, 2);

        let err = f
            .engine
            .finish(f.quiz_id, &taker(), submit(&[(*b, b_opts[1])]))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(ref msg) if msg == NO_ACTIVE_ATTEMPT));

        let stored = f.store.attempt(started.attempt().id).await.unwrap();
        assert_eq!(stored.score, 2);
        assert_eq!(f.store.answer_count(stored.id).await, 1);
    }

    #[tokio::test]
    async fn test_start_after_completion_opens_new_attempt() {
        let f = fixture().await;
        let (a, a_opts) = &f.questions[0];
        let first = f.engine.start(f.quiz_id, &taker()).await.unwrap();
        f.engine
            .finish(f.quiz_id, &taker(), submit(&[(*a, a_opts[0])]))
            .await
            .unwrap();

        let second = f.engine.start(f.quiz_id, &taker()).await.unwrap();

        assert!(second.is_created());
        assert_ne!(first.attempt().id, second.attempt().id);
        assert_eq!(second.attempt().score, 0);
        assert_eq!(f.store.attempt_count(f.quiz_id, 42).await, 2);
    }

    #[tokio::test]
    async fn test_empty_payload_is_rejected_and_attempt_stays_open() {
        let f = fixture().await;
        let (a, a_opts) = &f.questions[0];
        let started = f.engine.start(f.quiz_id, &taker()).await.unwrap();

        let err = f
            .engine
            .finish(f.quiz_id, &taker(), FinishAttemptRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(ref msg) if msg == NO_ANSWER_DATA));
        assert_eq!(f.store.answer_count(started.attempt().id).await, 0);

        let result = f
            .engine
            .finish(f.quiz_id, &taker(), submit(&[(*a, a_opts[0])]))
            .await
            .unwrap();
        assert_eq!(result.id, started.attempt().id);
    }

    #[tokio::test]
    async fn test_attempts_are_per_user() {
        let f = fixture().await;
        let other = Identity::new(7, "other");

        let mine = f.engine.start(f.quiz_id, &taker()).await.unwrap();
        let theirs = f.engine.start(f.quiz_id, &other).await.unwrap();

        assert!(theirs.is_created());
        assert_ne!(mine.attempt().id, theirs.attempt().id);
    }

    #[test]
    fn test_score_answers_sums_correct_points() {
        let detail = |points, is_correct| AnswerDetail {
            question_id: 1,
            question_text: "q".to_string(),
            points,
            option_id: 1,
            selected_answer: "a".to_string(),
            is_correct,
        };

        assert_eq!(score_answers(&[]), 0);
        assert_eq!(
            score_answers(&[detail(2, true), detail(3, false), detail(4, true)]),
            6
        );
        assert_eq!(score_answers(&[detail(0, true)]), 0);
        assert_eq!(
            score_answers(&[detail(i32::MAX, true), detail(i32::MAX, true)]),
            i32::MAX
        );
    }

    #[tokio::test]
    async fn test_finish_with_maximal_points_does_not_overflow() {
        let store = MemoryStore::new();
        let owner = Identity::new(1, "owner");
        let heavy = |text: &str| CreateQuestionRequest {
            text: text.to_string(),
            score: i32::MAX,
            options: vec![option("yes", true)],
        };

        let quiz = store
            .insert_quiz(
                &owner,
                &CreateQuizRequest {
                    title: "Heavy".to_string(),
                    description: String::new(),
                    is_active: true,
                    questions: vec![heavy("First?"), heavy("Second?")],
                },
            )
            .await
            .unwrap();
        let questions = question_ids(&store, quiz.id).await;

        let engine = AttemptEngine::new(Arc::new(store.clone()));
        let user = Identity::new(42, "taker");
        engine.start(quiz.id, &user).await.unwrap();

        let answers = questions
            .iter()
            .map(|(question_id, options)| SubmittedAnswer {
                question_id: *question_id,
                option_id: options[0],
            })
            .collect();
        let finished = engine
            .finish(quiz.id, &user, FinishAttemptRequest { answers })
            .await
            .unwrap();

        assert_eq!(finished.score, i32::MAX);
        assert_eq!(finished.answers.len(), 2);
    }
}

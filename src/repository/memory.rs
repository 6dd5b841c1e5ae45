// src/repository/memory.rs

//! In-process store.
//!
//! All tables sit behind one async mutex. Catalog calls take the lock for the
//! duration of a single operation; an attempt transaction holds it until it is
//! committed or dropped and works on a private copy of the tables, so nothing
//! it writes is visible unless `commit` runs.

use std::{collections::BTreeMap, sync::Arc};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, OwnedMutexGuard};

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

#[derive(Debug, Default, Clone)]
struct Tables {
    last_id: i64,
    quizzes: BTreeMap<i64, Quiz>,
    questions: BTreeMap<i64, Question>,
    options: BTreeMap<i64, AnswerOption>,
    attempts: BTreeMap<i64, Attempt>,
    /// (attempt_id, question_id) -> selected option id
    answers: BTreeMap<(i64, i64), i64>,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }

    fn insert_quiz(&mut self, owner: &Identity, req: &CreateQuizRequest) -> Quiz {
        let quiz = Quiz {
            id: self.next_id(),
            title: req.title.clone(),
            description: req.description.clone(),
            owner_id: owner.id,
            owner_username: owner.username.clone(),
            created_at: Utc::now(),
            is_active: req.is_active,
        };
        self.quizzes.insert(quiz.id, quiz.clone());
        for question in &req.questions {
            self.insert_question(quiz.id, question);
        }
        quiz
    }

    fn insert_question(&mut self, quiz_id: i64, req: &CreateQuestionRequest) -> Question {
        let question = Question {
            id: self.next_id(),
            quiz_id,
            text: req.text.clone(),
            points: req.score,
        };
        self.questions.insert(question.id, question.clone());
        for option in &req.options {
            self.insert_option(question.id, option);
        }
        question
    }

    fn insert_option(&mut self, question_id: i64, req: &CreateOptionRequest) -> AnswerOption {
        let option = AnswerOption {
            id: self.next_id(),
            question_id,
            answer: req.answer.clone(),
            is_correct: req.is_correct,
        };
        self.options.insert(option.id, option.clone());
        option
    }

    fn delete_quiz(&mut self, id: i64) -> bool {
        if self.quizzes.remove(&id).is_none() {
            return false;
        }
        let question_ids: Vec<i64> = self
            .questions
            .values()
            .filter(|q| q.quiz_id == id)
            .map(|q| q.id)
            .collect();
        for question_id in question_ids {
            self.delete_question(question_id);
        }
        self.attempts.retain(|_, a| a.quiz_id != id);
        let attempts = &self.attempts;
        self.answers
            .retain(|(attempt_id, _), _| attempts.contains_key(attempt_id));
        true
    }

    fn delete_question(&mut self, id: i64) -> bool {
        if self.questions.remove(&id).is_none() {
            return false;
        }
        self.options.retain(|_, o| o.question_id != id);
        self.answers.retain(|(_, question_id), _| *question_id != id);
        true
    }

    fn delete_option(&mut self, id: i64) -> bool {
        if self.options.remove(&id).is_none() {
            return false;
        }
        self.answers.retain(|_, option_id| *option_id != id);
        true
    }

    fn answer_details(&self, attempt_id: i64) -> Vec<AnswerDetail> {
        self.answers
            .iter()
            .filter(|((a_id, _), _)| *a_id == attempt_id)
            .filter_map(|((_, question_id), option_id)| {
                let question = self.questions.get(question_id)?;
                let option = self.options.get(option_id)?;
                Some(AnswerDetail {
                    question_id: question.id,
                    question_text: question.text.clone(),
                    points: question.points,
                    option_id: option.id,
                    selected_answer: option.answer.clone(),
                    is_correct: option.is_correct,
                })
            })
            .collect()
    }
}

/// Store backed by process memory. Cloning shares the same tables.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of attempts recorded for the pair, finished or not.
    pub async fn attempt_count(&self, quiz_id: i64, user_id: i64) -> usize {
        let tables = self.tables.lock().await;
        tables
            .attempts
            .values()
            .filter(|a| a.quiz_id == quiz_id && a.user_id == user_id)
            .count()
    }

    pub async fn attempt(&self, id: i64) -> Option<Attempt> {
        self.tables.lock().await.attempts.get(&id).cloned()
    }

    /// Number of stored user answers for the attempt.
    pub async fn answer_count(&self, attempt_id: i64) -> usize {
        let tables = self.tables.lock().await;
        tables
            .answers
            .keys()
            .filter(|(a_id, _)| *a_id == attempt_id)
            .count()
    }
}

#[async_trait]
impl QuizRepository for MemoryStore {
    async fn list_quizzes(&self) -> Result<Vec<Quiz>, AppError> {
        let tables = self.tables.lock().await;
        let mut quizzes: Vec<Quiz> = tables.quizzes.values().cloned().collect();
        quizzes.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(quizzes)
    }

    async fn find_quiz(&self, id: i64) -> Result<Option<Quiz>, AppError> {
        Ok(self.tables.lock().await.quizzes.get(&id).cloned())
    }

    async fn insert_quiz(&self, owner: &Identity, quiz: &CreateQuizRequest) -> Result<Quiz, AppError> {
        Ok(self.tables.lock().await.insert_quiz(owner, quiz))
    }

    async fn update_quiz(&self, id: i64, changes: &UpdateQuizRequest) -> Result<Option<Quiz>, AppError> {
        let mut tables = self.tables.lock().await;
        let Some(quiz) = tables.quizzes.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(title) = &changes.title {
            quiz.title = title.clone();
        }
        if let Some(description) = &changes.description {
            quiz.description = description.clone();
        }
        if let Some(is_active) = changes.is_active {
            quiz.is_active = is_active;
        }
        Ok(Some(quiz.clone()))
    }

    async fn delete_quiz(&self, id: i64) -> Result<bool, AppError> {
        Ok(self.tables.lock().await.delete_quiz(id))
    }
}

#[async_trait]
impl QuestionRepository for MemoryStore {
    async fn list_questions(&self, quiz_id: Option<i64>) -> Result<Vec<Question>, AppError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .questions
            .values()
            .filter(|q| quiz_id.is_none_or(|id| q.quiz_id == id))
            .cloned()
            .collect())
    }

    async fn find_question(&self, id: i64) -> Result<Option<Question>, AppError> {
        Ok(self.tables.lock().await.questions.get(&id).cloned())
    }

    async fn insert_question(
        &self,
        quiz_id: i64,
        question: &CreateQuestionRequest,
    ) -> Result<Question, AppError> {
        let mut tables = self.tables.lock().await;
        if !tables.quizzes.contains_key(&quiz_id) {
            return Err(AppError::NotFound("Quiz not found".to_string()));
        }
        Ok(tables.insert_question(quiz_id, question))
    }

    async fn update_question(
        &self,
        id: i64,
        changes: &UpdateQuestionRequest,
    ) -> Result<Option<Question>, AppError> {
        let mut tables = self.tables.lock().await;
        let Some(question) = tables.questions.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(text) = &changes.text {
            question.text = text.clone();
        }
        if let Some(score) = changes.score {
            question.points = score;
        }
        Ok(Some(question.clone()))
    }

    async fn delete_question(&self, id: i64) -> Result<bool, AppError> {
        Ok(self.tables.lock().await.delete_question(id))
    }
}

#[async_trait]
impl OptionRepository for MemoryStore {
    async fn list_options(&self, question_ids: &[i64]) -> Result<Vec<AnswerOption>, AppError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .options
            .values()
            .filter(|o| question_ids.contains(&o.question_id))
            .cloned()
            .collect())
    }

    async fn find_option(&self, id: i64) -> Result<Option<AnswerOption>, AppError> {
        Ok(self.tables.lock().await.options.get(&id).cloned())
    }

    async fn insert_option(
        &self,
        question_id: i64,
        option: &CreateOptionRequest,
    ) -> Result<AnswerOption, AppError> {
        let mut tables = self.tables.lock().await;
        if !tables.questions.contains_key(&question_id) {
            return Err(AppError::NotFound("Question not found".to_string()));
        }
        Ok(tables.insert_option(question_id, option))
    }

    async fn update_option(
        &self,
        id: i64,
        changes: &UpdateOptionRequest,
    ) -> Result<Option<AnswerOption>, AppError> {
        let mut tables = self.tables.lock().await;
        let Some(option) = tables.options.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(answer) = &changes.answer {
            option.answer = answer.clone();
        }
        if let Some(is_correct) = changes.is_correct {
            option.is_correct = is_correct;
        }
        Ok(Some(option.clone()))
    }

    async fn delete_option(&self, id: i64) -> Result<bool, AppError> {
        Ok(self.tables.lock().await.delete_option(id))
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn begin(&self) -> Result<Box<dyn AttemptRepository>, AppError> {
        let guard = self.tables.clone().lock_owned().await;
        let working = guard.clone();
        Ok(Box::new(MemoryTransaction { guard, working }))
    }
}

struct MemoryTransaction {
    guard: OwnedMutexGuard<Tables>,
    working: Tables,
}

#[async_trait]
impl AttemptRepository for MemoryTransaction {
    async fn find_in_progress(
        &mut self,
        quiz_id: i64,
        user_id: i64,
    ) -> Result<Option<Attempt>, AppError> {
        Ok(self
            .working
            .attempts
            .values()
            .find(|a| a.quiz_id == quiz_id && a.user_id == user_id && a.is_in_progress())
            .cloned())
    }

    async fn insert_attempt(
        &mut self,
        quiz_id: i64,
        user: &Identity,
        started_at: DateTime<Utc>,
    ) -> Result<Option<Attempt>, AppError> {
        if self.find_in_progress(quiz_id, user.id).await?.is_some() {
            return Ok(None);
        }
        if !self.working.quizzes.contains_key(&quiz_id) {
            return Err(AppError::NotFound("Quiz not found".to_string()));
        }
        let attempt = Attempt {
            id: self.working.next_id(),
            quiz_id,
            user_id: user.id,
            user_username: user.username.clone(),
            started_at,
            completed_at: None,
            score: 0,
        };
        self.working.attempts.insert(attempt.id, attempt.clone());
        Ok(Some(attempt))
    }

    async fn find_question(&mut self, id: i64) -> Result<Option<Question>, AppError> {
        Ok(self.working.questions.get(&id).cloned())
    }

    async fn find_option(&mut self, id: i64) -> Result<Option<AnswerOption>, AppError> {
        Ok(self.working.options.get(&id).cloned())
    }

    async fn upsert_answer(
        &mut self,
        attempt_id: i64,
        question_id: i64,
        option_id: i64,
    ) -> Result<(), AppError> {
        self.working.answers.insert((attempt_id, question_id), option_id);
        Ok(())
    }

    async fn list_answers(&mut self, attempt_id: i64) -> Result<Vec<AnswerDetail>, AppError> {
        Ok(self.working.answer_details(attempt_id))
    }

    async fn complete_attempt(
        &mut self,
        attempt_id: i64,
        score: i32,
        completed_at: DateTime<Utc>,
    ) -> Result<Attempt, AppError> {
        let attempt = self
            .working
            .attempts
            .get_mut(&attempt_id)
            .ok_or_else(|| AppError::NotFound("Attempt not found".to_string()))?;
        attempt.score = score;
        attempt.completed_at = Some(completed_at);
        Ok(attempt.clone())
    }

    async fn commit(self: Box<Self>) -> Result<(), AppError> {
        let MemoryTransaction { mut guard, working } = *self;
        *guard = working;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owner() -> Identity {
        Identity::new(1, "owner")
    }

    fn sample_quiz() -> CreateQuizRequest {
        CreateQuizRequest {
            title: "Rust basics".to_string(),
            description: String::new(),
            is_active: true,
            questions: vec![CreateQuestionRequest {
                text: "Which keyword declares a binding?".to_string(),
                score: 2,
                options: vec![
                    CreateOptionRequest {
                        answer: "let".to_string(),
                        is_correct: true,
                    },
                    CreateOptionRequest {
                        answer: "var".to_string(),
                        is_correct: false,
                    },
                ],
            }],
        }
    }

    #[tokio::test]
    async fn test_insert_quiz_creates_nested_rows() {
        let store = MemoryStore::new();
        let quiz = store.insert_quiz(&owner(), &sample_quiz()).await.unwrap();

        let questions = store.list_questions(Some(quiz.id)).await.unwrap();
        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].points, 2);

        let options = store.list_options(&[questions[0].id]).await.unwrap();
        assert_eq!(options.len(), 2);
        assert!(options[0].is_correct);
    }

    #[tokio::test]
    async fn test_delete_quiz_cascades() {
        let store = MemoryStore::new();
        let quiz = store.insert_quiz(&owner(), &sample_quiz()).await.unwrap();
        let question = store.list_questions(Some(quiz.id)).await.unwrap().remove(0);
        let option = store.list_options(&[question.id]).await.unwrap().remove(0);

        let mut tx = store.begin().await.unwrap();
        let attempt = tx
            .insert_attempt(quiz.id, &Identity::new(2, "taker"), Utc::now())
            .await
            .unwrap()
            .unwrap();
        tx.upsert_answer(attempt.id, question.id, option.id).await.unwrap();
        tx.commit().await.unwrap();
        assert_eq!(store.answer_count(attempt.id).await, 1);

        assert!(store.delete_quiz(quiz.id).await.unwrap());

        assert!(store.find_quiz(quiz.id).await.unwrap().is_none());
        assert!(store.find_question(question.id).await.unwrap().is_none());
        assert!(store.find_option(option.id).await.unwrap().is_none());
        assert_eq!(store.attempt_count(quiz.id, 2).await, 0);
        assert_eq!(store.answer_count(attempt.id).await, 0);
    }

    #[tokio::test]
    async fn test_dropped_transaction_discards_writes() {
        let store = MemoryStore::new();
        let quiz = store.insert_quiz(&owner(), &sample_quiz()).await.unwrap();

        {
            let mut tx = store.begin().await.unwrap();
            tx.insert_attempt(quiz.id, &Identity::new(2, "taker"), Utc::now())
                .await
                .unwrap();
        }

        assert_eq!(store.attempt_count(quiz.id, 2).await, 0);
    }

    #[tokio::test]
    async fn test_insert_attempt_refuses_second_in_progress() {
        let store = MemoryStore::new();
        let quiz = store.insert_quiz(&owner(), &sample_quiz()).await.unwrap();
        let taker = Identity::new(2, "taker");

        let mut tx = store.begin().await.unwrap();
        assert!(tx.insert_attempt(quiz.id, &taker, Utc::now()).await.unwrap().is_some());
        assert!(tx.insert_attempt(quiz.id, &taker, Utc::now()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_question_removes_options() {
        let store = MemoryStore::new();
        let quiz = store.insert_quiz(&owner(), &sample_quiz()).await.unwrap();
        let question = store.list_questions(Some(quiz.id)).await.unwrap().remove(0);

        assert!(store.delete_question(question.id).await.unwrap());
        assert!(store.list_options(&[question.id]).await.unwrap().is_empty());
        assert!(!store.delete_question(question.id).await.unwrap());
    }
}

// src/services/catalog.rs

use std::collections::HashMap;

use crate::{
    error::AppError,
    models::{
        answer_option::{
            AnswerOption, AnswerOptionResponse, CreateOptionRequest, UpdateOptionRequest,
        },
        question::{CreateQuestionRequest, Question, QuestionResponse, UpdateQuestionRequest},
        quiz::{CreateQuizRequest, Quiz, QuizResponse, UpdateQuizRequest},
        user::Identity,
    },
    repository::{OptionRepository, QuestionRepository, QuizRepository, SharedStore},
    services::policy::{Action, authorize},
    utils::html::clean_html,
};

/// Matches the `quizzes.title` column width.
pub const MAX_TITLE_CHARS: usize = 255;

/// Quiz, question and answer-option management.
///
/// Reads are open to every caller. Writes resolve the owning quiz first and
/// go through [`authorize`]. Child entities are always addressed through their
/// parents; a child reached through the wrong parent is reported as missing.
#[derive(Clone)]
pub struct Catalog {
    store: SharedStore,
}

impl Catalog {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    async fn quiz(&self, id: i64) -> Result<Quiz, AppError> {
        self.store
            .find_quiz(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Quiz not found".to_string()))
    }

    async fn question_in(&self, quiz_id: i64, id: i64) -> Result<Question, AppError> {
        self.store
            .find_question(id)
            .await?
            .filter(|q| q.quiz_id == quiz_id)
            .ok_or_else(|| AppError::NotFound("Question not found".to_string()))
    }

    async fn option_in(&self, question_id: i64, id: i64) -> Result<AnswerOption, AppError> {
        self.store
            .find_option(id)
            .await?
            .filter(|o| o.question_id == question_id)
            .ok_or_else(|| AppError::NotFound("Answer option not found".to_string()))
    }

    /// Attaches options to each question, keeping the question order.
    async fn render_questions(
        &self,
        questions: Vec<Question>,
    ) -> Result<Vec<QuestionResponse>, AppError> {
        let ids: Vec<i64> = questions.iter().map(|q| q.id).collect();
        let mut by_question: HashMap<i64, Vec<AnswerOptionResponse>> = HashMap::new();
        for option in self.store.list_options(&ids).await? {
            by_question
                .entry(option.question_id)
                .or_default()
                .push(option.into());
        }

        Ok(questions
            .into_iter()
            .map(|q| {
                let options = by_question.remove(&q.id).unwrap_or_default();
                QuestionResponse::new(q, options)
            })
            .collect())
    }

    async fn render_question(&self, question: Question) -> Result<QuestionResponse, AppError> {
        let options = self.store.list_options(&[question.id]).await?;
        Ok(QuestionResponse::new(
            question,
            options.into_iter().map(AnswerOptionResponse::from).collect(),
        ))
    }

    async fn render_quiz(&self, quiz: Quiz, caller: &Identity) -> Result<QuizResponse, AppError> {
        let questions = self.store.list_questions(Some(quiz.id)).await?;
        let questions = self.render_questions(questions).await?;
        Ok(QuizResponse::new(quiz, questions, caller.id))
    }

    // Quizzes

    pub async fn list_quizzes(&self, caller: &Identity) -> Result<Vec<QuizResponse>, AppError> {
        let quizzes = self.store.list_quizzes().await?;
        let questions = self.store.list_questions(None).await?;

        let quiz_ids: Vec<i64> = questions.iter().map(|q| q.quiz_id).collect();

        // render_questions preserves order, so ids and rendered questions line up.
        let mut grouped: HashMap<i64, Vec<QuestionResponse>> = HashMap::new();
        for (quiz_id, question) in quiz_ids.into_iter().zip(self.render_questions(questions).await?) {
            grouped.entry(quiz_id).or_default().push(question);
        }

        Ok(quizzes
            .into_iter()
            .map(|quiz| {
                let questions = grouped.remove(&quiz.id).unwrap_or_default();
                QuizResponse::new(quiz, questions, caller.id)
            })
            .collect())
    }

    pub async fn get_quiz(&self, caller: &Identity, id: i64) -> Result<QuizResponse, AppError> {
        let quiz = self.quiz(id).await?;
        self.render_quiz(quiz, caller).await
    }

    pub async fn create_quiz(
        &self,
        caller: &Identity,
        mut req: CreateQuizRequest,
    ) -> Result<QuizResponse, AppError> {
        req.title = sanitize_title(&req.title)?;
        req.description = clean_html(&req.description);

        let quiz = self.store.insert_quiz(caller, &req).await?;
        tracing::info!(quiz_id = quiz.id, owner_id = caller.id, "quiz created");
        self.render_quiz(quiz, caller).await
    }

    pub async fn update_quiz(
        &self,
        caller: &Identity,
        id: i64,
        mut req: UpdateQuizRequest,
    ) -> Result<QuizResponse, AppError> {
        let quiz = self.quiz(id).await?;
        authorize(caller, &quiz, Action::UpdateQuiz).into_result()?;

        if let Some(title) = &req.title {
            req.title = Some(sanitize_title(title)?);
        }
        if let Some(description) = &req.description {
            req.description = Some(clean_html(description));
        }

        let quiz = self
            .store
            .update_quiz(id, &req)
            .await?
            .ok_or_else(|| AppError::NotFound("Quiz not found".to_string()))?;
        tracing::info!(quiz_id = id, "quiz updated");
        self.render_quiz(quiz, caller).await
    }

    pub async fn delete_quiz(&self, caller: &Identity, id: i64) -> Result<(), AppError> {
        let quiz = self.quiz(id).await?;
        authorize(caller, &quiz, Action::DeleteQuiz).into_result()?;

        if !self.store.delete_quiz(id).await? {
            return Err(AppError::NotFound("Quiz not found".to_string()));
        }
        tracing::info!(quiz_id = id, "quiz deleted");
        Ok(())
    }

    // Questions

    pub async fn list_all_questions(&self) -> Result<Vec<QuestionResponse>, AppError> {
        let questions = self.store.list_questions(None).await?;
        self.render_questions(questions).await
    }

    pub async fn list_questions(&self, quiz_id: i64) -> Result<Vec<QuestionResponse>, AppError> {
        let quiz = self.quiz(quiz_id).await?;
        let questions = self.store.list_questions(Some(quiz.id)).await?;
        self.render_questions(questions).await
    }

    pub async fn get_question(&self, quiz_id: i64, id: i64) -> Result<QuestionResponse, AppError> {
        let question = self.question_in(quiz_id, id).await?;
        self.render_question(question).await
    }

    pub async fn create_question(
        &self,
        caller: &Identity,
        quiz_id: i64,
        req: CreateQuestionRequest,
    ) -> Result<QuestionResponse, AppError> {
        let quiz = self.quiz(quiz_id).await?;
        authorize(caller, &quiz, Action::CreateQuestion).into_result()?;

        let question = self.store.insert_question(quiz.id, &req).await?;
        tracing::info!(quiz_id, question_id = question.id, "question created");
        self.render_question(question).await
    }

    pub async fn update_question(
        &self,
        caller: &Identity,
        quiz_id: i64,
        id: i64,
        req: UpdateQuestionRequest,
    ) -> Result<QuestionResponse, AppError> {
        let quiz = self.quiz(quiz_id).await?;
        let question = self.question_in(quiz.id, id).await?;
        authorize(caller, &quiz, Action::UpdateQuestion).into_result()?;

        let question = self
            .store
            .update_question(question.id, &req)
            .await?
            .ok_or_else(|| AppError::NotFound("Question not found".to_string()))?;
        tracing::info!(quiz_id, question_id = id, "question updated");
        self.render_question(question).await
    }

    pub async fn delete_question(
        &self,
        caller: &Identity,
        quiz_id: i64,
        id: i64,
    ) -> Result<(), AppError> {
        let quiz = self.quiz(quiz_id).await?;
        let question = self.question_in(quiz.id, id).await?;
        authorize(caller, &quiz, Action::DeleteQuestion).into_result()?;

        if !self.store.delete_question(question.id).await? {
            return Err(AppError::NotFound("Question not found".to_string()));
        }
        tracing::info!(quiz_id, question_id = id, "question deleted");
        Ok(())
    }

    // Answer options

    pub async fn list_options(
        &self,
        quiz_id: i64,
        question_id: i64,
    ) -> Result<Vec<AnswerOptionResponse>, AppError> {
        let question = self.question_in(quiz_id, question_id).await?;
        let options = self.store.list_options(&[question.id]).await?;
        Ok(options.into_iter().map(AnswerOptionResponse::from).collect())
    }

    pub async fn get_option(
        &self,
        quiz_id: i64,
        question_id: i64,
        id: i64,
    ) -> Result<AnswerOptionResponse, AppError> {
        let question = self.question_in(quiz_id, question_id).await?;
        Ok(self.option_in(question.id, id).await?.into())
    }

    pub async fn create_option(
        &self,
        caller: &Identity,
        quiz_id: i64,
        question_id: i64,
        req: CreateOptionRequest,
    ) -> Result<AnswerOptionResponse, AppError> {
        let quiz = self.quiz(quiz_id).await?;
        let question = self.question_in(quiz.id, question_id).await?;
        authorize(caller, &quiz, Action::CreateOption).into_result()?;

        let option = self.store.insert_option(question.id, &req).await?;
        tracing::info!(quiz_id, question_id, option_id = option.id, "answer option created");
        Ok(option.into())
    }

    pub async fn update_option(
        &self,
        caller: &Identity,
        quiz_id: i64,
        question_id: i64,
        id: i64,
        req: UpdateOptionRequest,
    ) -> Result<AnswerOptionResponse, AppError> {
        let quiz = self.quiz(quiz_id).await?;
        let question = self.question_in(quiz.id, question_id).await?;
        let option = self.option_in(question.id, id).await?;
        authorize(caller, &quiz, Action::UpdateOption).into_result()?;

        let option = self
            .store
            .update_option(option.id, &req)
            .await?
            .ok_or_else(|| AppError::NotFound("Answer option not found".to_string()))?;
        tracing::info!(quiz_id, question_id, option_id = id, "answer option updated");
        Ok(option.into())
    }

    pub async fn delete_option(
        &self,
        caller: &Identity,
        quiz_id: i64,
        question_id: i64,
        id: i64,
    ) -> Result<(), AppError> {
        let quiz = self.quiz(quiz_id).await?;
        let question = self.question_in(quiz.id, question_id).await?;
        let option = self.option_in(question.id, id).await?;
        authorize(caller, &quiz, Action::DeleteOption).into_result()?;

        if !self.store.delete_option(option.id).await? {
            return Err(AppError::NotFound("Answer option not found".to_string()));
        }
        tracing::info!(quiz_id, question_id, option_id = id, "answer option deleted");
        Ok(())
    }
}

/// Titles are plain text: stored as entered apart from surrounding whitespace.
/// Markup is never interpreted, so no HTML cleaning (and no entity escaping).
fn sanitize_title(title: &str) -> Result<String, AppError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(AppError::BadRequest("Title cannot be empty".to_string()));
    }
    if title.chars().count() > MAX_TITLE_CHARS {
        return Err(AppError::BadRequest(format!(
            "Title cannot be longer than {} characters",
            MAX_TITLE_CHARS
        )));
    }
    Ok(title.to_string())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        models::attempt::{FinishAttemptRequest, SubmittedAnswer},
        repository::MemoryStore,
        services::attempt::AttemptEngine,
    };

    fn alice() -> Identity {
        Identity::new(1, "alice")
    }

    fn bob() -> Identity {
        Identity::new(2, "bob")
    }

    fn new_quiz(title: &str) -> CreateQuizRequest {
        CreateQuizRequest {
            title: title.to_string(),
            description: "<b>Warm-up</b><script>alert(1)</script>".to_string(),
            is_active: true,
            questions: vec![CreateQuestionRequest {
                text: "2 + 2?".to_string(),
                score: 1,
                options: vec![
                    CreateOptionRequest {
                        answer: "4".to_string(),
                        is_correct: true,
                    },
                    CreateOptionRequest {
                        answer: "5".to_string(),
                        is_correct: false,
                    },
                ],
            }],
        }
    }

    fn setup() -> (MemoryStore, Catalog) {
        let store = MemoryStore::new();
        let catalog = Catalog::new(Arc::new(store.clone()));
        (store, catalog)
    }

    #[tokio::test]
    async fn test_create_quiz_renders_nested_and_sanitizes() {
        let (_, catalog) = setup();

        let quiz = catalog.create_quiz(&alice(), new_quiz("Maths")).await.unwrap();

        assert_eq!(quiz.owner, "alice");
        assert!(quiz.is_owner);
        assert_eq!(quiz.questions_count, 1);
        assert_eq!(quiz.questions[0].options.len(), 2);
        assert_eq!(quiz.description, "<b>Warm-up</b>");

        let seen_by_bob = catalog.get_quiz(&bob(), quiz.id).await.unwrap();
        assert!(!seen_by_bob.is_owner);
    }

    #[tokio::test]
    async fn test_blank_title_is_rejected() {
        let (_, catalog) = setup();

        let err = catalog
            .create_quiz(&alice(), new_quiz("   "))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_title_is_stored_verbatim() {
        let (_, catalog) = setup();

        let quiz = catalog
            .create_quiz(&alice(), new_quiz("  Q&A: 1 < 2  "))
            .await
            .unwrap();
        assert_eq!(quiz.title, "Q&A: 1 < 2");

        let longest = "&".repeat(MAX_TITLE_CHARS);
        let quiz = catalog
            .create_quiz(&alice(), new_quiz(&longest))
            .await
            .unwrap();
        assert_eq!(quiz.title, longest);

        let quiz = catalog
            .update_quiz(
                &alice(),
                quiz.id,
                UpdateQuizRequest {
                    title: Some("<b>Bold</b> & brave".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(quiz.title, "<b>Bold</b> & brave");
    }

    #[tokio::test]
    async fn test_overlong_title_is_rejected() {
        let (_, catalog) = setup();

        let err = catalog
            .create_quiz(&alice(), new_quiz(&"x".repeat(MAX_TITLE_CHARS + 1)))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_non_owner_cannot_mutate() {
        let (_, catalog) = setup();
        let quiz = catalog.create_quiz(&alice(), new_quiz("Maths")).await.unwrap();
        let question_id = quiz.questions[0].id;
        let option_id = quiz.questions[0].options[0].id;

        let update = UpdateQuizRequest {
            title: Some("Hijacked".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            catalog.update_quiz(&bob(), quiz.id, update).await,
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(
            catalog.delete_quiz(&bob(), quiz.id).await,
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(
            catalog
                .create_question(
                    &bob(),
                    quiz.id,
                    CreateQuestionRequest {
                        text: "extra".to_string(),
                        score: 1,
                        options: vec![],
                    }
                )
                .await,
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(
            catalog
                .update_option(
                    &bob(),
                    quiz.id,
                    question_id,
                    option_id,
                    UpdateOptionRequest {
                        is_correct: Some(false),
                        ..Default::default()
                    }
                )
                .await,
            Err(AppError::Forbidden(_))
        ));

        // Reads stay open.
        assert_eq!(catalog.list_options(quiz.id, question_id).await.unwrap().len(), 2);
        assert_eq!(catalog.get_quiz(&alice(), quiz.id).await.unwrap().title, "Maths");
    }

    #[tokio::test]
    async fn test_owner_updates_question_and_option() {
        let (_, catalog) = setup();
        let quiz = catalog.create_quiz(&alice(), new_quiz("Maths")).await.unwrap();
        let question_id = quiz.questions[0].id;
        let wrong_id = quiz.questions[0].options[1].id;

        let question = catalog
            .update_question(
                &alice(),
                quiz.id,
                question_id,
                UpdateQuestionRequest {
                    score: Some(5),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(question.score, 5);
        assert_eq!(question.text, "2 + 2?");

        let option = catalog
            .update_option(
                &alice(),
                quiz.id,
                question_id,
                wrong_id,
                UpdateOptionRequest {
                    answer: Some("four".to_string()),
                    is_correct: Some(true),
                },
            )
            .await
            .unwrap();
        assert!(option.is_correct);
        assert_eq!(option.answer, "four");
    }

    #[tokio::test]
    async fn test_child_through_wrong_parent_is_not_found() {
        let (_, catalog) = setup();
        let maths = catalog.create_quiz(&alice(), new_quiz("Maths")).await.unwrap();
        let other = catalog.create_quiz(&alice(), new_quiz("Other")).await.unwrap();
        let question_id = maths.questions[0].id;
        let foreign_option = other.questions[0].options[0].id;

        assert!(matches!(
            catalog.get_question(other.id, question_id).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            catalog.get_option(maths.id, question_id, foreign_option).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            catalog.delete_question(&alice(), other.id, question_id).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_quiz_cascades_to_attempts() {
        let (store, catalog) = setup();
        let engine = AttemptEngine::new(Arc::new(store.clone()));
        let quiz = catalog.create_quiz(&alice(), new_quiz("Maths")).await.unwrap();
        let question = &quiz.questions[0];

        let started = engine.start(quiz.id, &bob()).await.unwrap();
        engine
            .finish(
                quiz.id,
                &bob(),
                FinishAttemptRequest {
                    answers: vec![SubmittedAnswer {
                        question_id: question.id,
                        option_id: question.options[0].id,
                    }],
                },
            )
            .await
            .unwrap();
        let attempt_id = started.attempt().id;
        assert_eq!(store.answer_count(attempt_id).await, 1);

        catalog.delete_quiz(&alice(), quiz.id).await.unwrap();

        assert!(matches!(
            catalog.get_quiz(&alice(), quiz.id).await,
            Err(AppError::NotFound(_))
        ));
        assert!(catalog.list_all_questions().await.unwrap().is_empty());
        assert!(store.attempt(attempt_id).await.is_none());
        assert_eq!(store.answer_count(attempt_id).await, 0);
    }

    #[tokio::test]
    async fn test_list_quizzes_groups_questions() {
        let (_, catalog) = setup();
        let first = catalog.create_quiz(&alice(), new_quiz("First")).await.unwrap();
        let second = catalog.create_quiz(&bob(), new_quiz("Second")).await.unwrap();
        catalog
            .create_question(
                &bob(),
                second.id,
                CreateQuestionRequest {
                    text: "3 + 3?".to_string(),
                    score: 2,
                    options: vec![],
                },
            )
            .await
            .unwrap();

        let quizzes = catalog.list_quizzes(&alice()).await.unwrap();

        assert_eq!(quizzes.len(), 2);
        let first_view = quizzes.iter().find(|q| q.id == first.id).unwrap();
        let second_view = quizzes.iter().find(|q| q.id == second.id).unwrap();
        assert_eq!(first_view.questions_count, 1);
        assert_eq!(second_view.questions_count, 2);
        assert!(first_view.is_owner);
        assert!(!second_view.is_owner);
    }
}

// src/services/policy.rs

//! Ownership rules for catalog mutations.
//!
//! Reading quizzes, questions and options is open to any authenticated
//! caller and never consults this module. Every write does, and is allowed
//! only for the owner of the quiz the entity ultimately belongs to.

use crate::{
    error::AppError,
    models::{quiz::Quiz, user::Identity},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    UpdateQuiz,
    DeleteQuiz,
    CreateQuestion,
    UpdateQuestion,
    DeleteQuestion,
    CreateOption,
    UpdateOption,
    DeleteOption,
}

impl Action {
    pub fn describe(self) -> &'static str {
        match self {
            Action::UpdateQuiz => "update this quiz",
            Action::DeleteQuiz => "delete this quiz",
            Action::CreateQuestion => "add questions to this quiz",
            Action::UpdateQuestion => "update questions of this quiz",
            Action::DeleteQuestion => "delete questions of this quiz",
            Action::CreateOption => "add answer options to this quiz",
            Action::UpdateOption => "update answer options of this quiz",
            Action::DeleteOption => "delete answer options of this quiz",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    /// Carries the reason shown to the caller.
    Deny(String),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }

    pub fn into_result(self) -> Result<(), AppError> {
        match self {
            Decision::Allow => Ok(()),
            Decision::Deny(reason) => Err(AppError::Forbidden(reason)),
        }
    }
}

/// Decides whether `actor` may perform `action` on `quiz` or on something it owns.
///
/// For question and option actions, pass the parent quiz of the entity.
pub fn authorize(actor: &Identity, quiz: &Quiz, action: Action) -> Decision {
    if quiz.owner_id == actor.id {
        return Decision::Allow;
    }

    tracing::debug!(
        user_id = actor.id,
        quiz_id = quiz.id,
        action = ?action,
        "policy denied mutation"
    );
    Decision::Deny(format!("Only the quiz owner can {}.", action.describe()))
}

// src/models/user.rs

use serde::{Deserialize, Serialize};

/// The authenticated caller, as asserted by the identity provider's token.
///
/// There is no local users table: the numeric id is the stable key and the
/// username is captured onto quizzes and attempts when they are created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: i64,
    pub username: String,
}

impl Identity {
    pub fn new(id: i64, username: impl Into<String>) -> Self {
        Self {
            id,
            username: username.into(),
        }
    }
}

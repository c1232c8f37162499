use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};

pub const QUIZ_LINK_TOKEN_TYPE: &str = "quiz_link";

/// Signed student session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentClaims {
    pub sub: String, // Subject (student email)
    pub name: String,
    pub exp: usize, // Expiration time (as UTC timestamp)
    pub iat: usize, // Issued at (as UTC timestamp)
}

impl StudentClaims {
    pub fn new(email: &str, name: &str, expiration_hours: i64) -> Self {
        let now = Utc::now();
        let exp = now + Duration::hours(expiration_hours);

        Self {
            sub: email.to_string(),
            name: name.to_string(),
            iat: now.timestamp() as usize,
            exp: exp.timestamp() as usize,
        }
    }
}

/// Self-describing link mailed to a roster member: who may attempt which quiz.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizLinkClaims {
    pub email: String,
    pub quiz_id: String,
    pub token_type: String, // "quiz_link"
    pub exp: usize,
    pub iat: usize,
}

impl QuizLinkClaims {
    pub fn new(email: &str, quiz_id: &str, expiration_hours: i64) -> Self {
        let now = Utc::now();
        let exp = now + Duration::hours(expiration_hours);

        Self {
            email: email.to_string(),
            quiz_id: quiz_id.to_string(),
            token_type: QUIZ_LINK_TOKEN_TYPE.to_string(),
            iat: now.timestamp() as usize,
            exp: exp.timestamp() as usize,
        }
    }
}

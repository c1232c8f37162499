use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::{
    errors::{AppError, AppResult},
    models::{
        domain::{quiz_attempt::normalize_email, Quiz},
        dto::response::SharedQuizDto,
    },
    repositories::QuizRepository,
    services::accessibility,
};

pub struct QuizService {
    repository: Arc<dyn QuizRepository>,
}

impl QuizService {
    pub fn new(repository: Arc<dyn QuizRepository>) -> Self {
        Self { repository }
    }

    pub async fn get_quiz(&self, id: &str) -> AppResult<Quiz> {
        let quiz = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Quiz with id '{}' not found", id)))?;

        Ok(quiz)
    }

    /// One quiz as a roster member sees it before starting. Students off the
    /// roster get the same answer as for a missing quiz.
    pub async fn get_shared_quiz(
        &self,
        id: &str,
        email: &str,
        now: DateTime<Utc>,
    ) -> AppResult<SharedQuizDto> {
        let quiz = self.get_quiz(id).await?;
        if !quiz.has_recipient(email) {
            return Err(AppError::NotFound(format!("Quiz with id '{}' not found", id)));
        }

        Ok(SharedQuizDto::new(
            &quiz,
            accessibility::evaluate(&quiz.schedule, now),
        ))
    }

    /// Quizzes whose roster includes `email`, with their current availability.
    pub async fn list_shared_with(
        &self,
        email: &str,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<SharedQuizDto>> {
        let email = normalize_email(email);
        let quizzes = self.repository.find_shared_with(&email).await?;

        Ok(quizzes
            .iter()
            .map(|quiz| SharedQuizDto::new(quiz, accessibility::evaluate(&quiz.schedule, now)))
            .collect())
    }
}

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{
    models::domain::{
        quiz_question::Difficulty, AnswerRecord, AttemptStatus, Quiz, QuizAttempt, QuizQuestion,
        SubmittedAnswer,
    },
    services::{
        accessibility::{Accessibility, WindowBoundary},
        quiz_attempt_service::AttemptSession,
    },
};

/// A question as a student sees it before submitting: no answer, no explanation.
#[derive(Debug, Clone, Serialize)]
pub struct PublicQuestionDto {
    pub id: String,
    pub prompt: String,
    pub question_type: &'static str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    pub marks: f64,
    pub difficulty: Difficulty,
}

impl From<&QuizQuestion> for PublicQuestionDto {
    fn from(question: &QuizQuestion) -> Self {
        PublicQuestionDto {
            id: question.id.clone(),
            prompt: question.prompt.clone(),
            question_type: question.kind.label(),
            options: question.kind.options().to_vec(),
            marks: question.marks,
            difficulty: question.difficulty,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PublicQuizDto {
    pub id: String,
    pub title: String,
    pub description: String,
    pub duration_minutes: i64,
    pub num_questions: usize,
    pub total_marks: f64,
    pub questions: Vec<PublicQuestionDto>,
}

impl From<&Quiz> for PublicQuizDto {
    fn from(quiz: &Quiz) -> Self {
        PublicQuizDto {
            id: quiz.id.clone(),
            title: quiz.title.clone(),
            description: quiz.description.clone(),
            duration_minutes: quiz.duration_minutes,
            num_questions: quiz.num_questions,
            total_marks: quiz.total_marks,
            questions: quiz.questions.iter().map(PublicQuestionDto::from).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AttemptSessionResponse {
    pub attempt_id: String,
    pub token: String,
    pub status: AttemptStatus,
    pub resumed: bool,
    pub started_at: DateTime<Utc>,
    pub remaining_seconds: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ends_at: Option<DateTime<Utc>>,
    pub saved_answers: Vec<SubmittedAnswer>,
    pub quiz: PublicQuizDto,
}

impl From<AttemptSession> for AttemptSessionResponse {
    fn from(session: AttemptSession) -> Self {
        let quiz = PublicQuizDto::from(&session.quiz);
        let attempt = session.attempt;
        AttemptSessionResponse {
            attempt_id: attempt.id,
            token: attempt.token,
            status: attempt.status,
            resumed: session.resumed,
            started_at: attempt.started_at,
            remaining_seconds: session.remaining_seconds,
            ends_at: session.ends_at,
            saved_answers: attempt.responses,
            quiz,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SaveProgressResponse {
    pub attempt_id: String,
    pub saved_answers: usize,
    pub time_spent: i64,
    pub message: String,
}

impl From<QuizAttempt> for SaveProgressResponse {
    fn from(attempt: QuizAttempt) -> Self {
        SaveProgressResponse {
            attempt_id: attempt.id,
            saved_answers: attempt.responses.len(),
            time_spent: attempt.time_spent,
            message: "Progress saved".to_string(),
        }
    }
}

/// Outcome of a finished attempt. Blocked attempts withhold their score and
/// breakdown and report the violation instead.
#[derive(Debug, Clone, Serialize)]
pub struct AttemptResultResponse {
    pub attempt_id: String,
    pub status: AttemptStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_marks: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_marks: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percentage: Option<f64>,
    pub time_spent: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submitted_at: Option<DateTime<Utc>>,
    pub is_auto_submit: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub violation_reason: Option<String>,
    pub breakdown: Vec<AnswerRecord>,
}

impl From<QuizAttempt> for AttemptResultResponse {
    fn from(attempt: QuizAttempt) -> Self {
        let show_score = matches!(attempt.status, AttemptStatus::Graded);
        AttemptResultResponse {
            attempt_id: attempt.id,
            status: attempt.status,
            total_marks: show_score.then_some(attempt.total_marks),
            max_marks: show_score.then_some(attempt.max_marks),
            percentage: show_score.then(|| round_for_display(attempt.percentage)),
            time_spent: attempt.time_spent,
            submitted_at: attempt.submitted_at,
            is_auto_submit: attempt.is_auto_submit,
            violation_reason: attempt.violation_reason,
            breakdown: if show_score { attempt.answers } else { Vec::new() },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SharedQuizDto {
    pub id: String,
    pub title: String,
    pub description: String,
    pub duration_minutes: i64,
    pub num_questions: usize,
    pub total_marks: f64,
    pub accessible: bool,
    pub availability: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub window: Option<WindowBoundary>,
}

impl SharedQuizDto {
    pub fn new(quiz: &Quiz, accessibility: Accessibility) -> Self {
        SharedQuizDto {
            id: quiz.id.clone(),
            title: quiz.title.clone(),
            description: quiz.description.clone(),
            duration_minutes: quiz.duration_minutes,
            num_questions: quiz.num_questions,
            total_marks: quiz.total_marks,
            accessible: accessibility.accessible,
            availability: accessibility.reason,
            window: accessibility.boundary,
        }
    }
}

fn round_for_display(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

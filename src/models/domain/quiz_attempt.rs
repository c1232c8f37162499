use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::domain::Quiz;

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct QuizAttempt {
    pub id: String,
    pub quiz_id: String,
    pub student: StudentIdentity,
    pub status: AttemptStatus,
    /// Raw answers from the latest progress save; cleared once graded.
    #[serde(default)]
    pub responses: Vec<SubmittedAnswer>,
    /// Graded answer records, written exactly once on submission.
    #[serde(default)]
    pub answers: Vec<AnswerRecord>,
    pub total_marks: f64,
    pub max_marks: f64,
    pub percentage: f64,
    pub duration_minutes: i64,
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submitted_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub graded_at: Option<DateTime<Utc>>,
    pub time_spent: i64, // seconds
    pub token: String,
    pub is_auto_submit: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub violation_reason: Option<String>,
    /// Present only while live; backs the one-live-attempt unique index.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub live_slot: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct StudentIdentity {
    pub email: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roll_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptStatus {
    Started,
    InProgress,
    Submitted,
    Graded,
    Expired,
    Blocked,
}

impl AttemptStatus {
    pub const LIVE: [AttemptStatus; 2] = [AttemptStatus::Started, AttemptStatus::InProgress];
    pub const TERMINAL: [AttemptStatus; 4] = [
        AttemptStatus::Submitted,
        AttemptStatus::Graded,
        AttemptStatus::Expired,
        AttemptStatus::Blocked,
    ];

    pub fn is_live(self) -> bool {
        Self::LIVE.contains(&self)
    }

    pub fn is_terminal(self) -> bool {
        !self.is_live()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AttemptStatus::Started => "started",
            AttemptStatus::InProgress => "in_progress",
            AttemptStatus::Submitted => "submitted",
            AttemptStatus::Graded => "graded",
            AttemptStatus::Expired => "expired",
            AttemptStatus::Blocked => "blocked",
        }
    }
}

impl std::fmt::Display for AttemptStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An answer as the student sent it.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct SubmittedAnswer {
    pub question_id: String,
    #[serde(default)]
    pub answer: String,
}

/// Graded result for one question, denormalized for audit and export.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct AnswerRecord {
    pub question_id: String,
    pub prompt: String,
    pub question_type: String,
    #[serde(default)]
    pub options: Vec<String>,
    pub student_answer: String,
    pub correct_answer: String,
    pub is_correct: bool,
    pub marks_awarded: f64,
    pub feedback: String,
}

impl QuizAttempt {
    pub fn start(quiz: &Quiz, student: StudentIdentity, now: DateTime<Utc>) -> Self {
        let live_slot = Some(Self::live_slot_for(&quiz.id, &student.email));
        QuizAttempt {
            id: Uuid::new_v4().to_string(),
            quiz_id: quiz.id.clone(),
            student,
            status: AttemptStatus::Started,
            responses: Vec::new(),
            answers: Vec::new(),
            total_marks: 0.0,
            max_marks: quiz.total_marks,
            percentage: 0.0,
            duration_minutes: quiz.duration_minutes,
            started_at: now,
            submitted_at: None,
            graded_at: None,
            time_spent: 0,
            token: Uuid::new_v4().simple().to_string(),
            is_auto_submit: false,
            violation_reason: None,
            live_slot,
        }
    }

    pub fn live_slot_for(quiz_id: &str, email: &str) -> String {
        format!("{}:{}", quiz_id, normalize_email(email))
    }

    pub fn elapsed_seconds(&self, now: DateTime<Utc>) -> i64 {
        (now - self.started_at).num_seconds().max(0)
    }

    pub fn remaining_seconds(&self, now: DateTime<Utc>) -> i64 {
        (self.duration_minutes * 60 - self.elapsed_seconds(now)).max(0)
    }

    /// Live and out of time. Terminal attempts are never "expired" here.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.status.is_live() && self.elapsed_seconds(now) >= self.duration_minutes * 60
    }

    /// Moves the attempt into a terminal state and releases its live slot.
    pub fn finish(&mut self, status: AttemptStatus, now: DateTime<Utc>) {
        debug_assert!(status.is_terminal());
        self.status = status;
        self.time_spent = self.elapsed_seconds(now);
        self.live_slot = None;
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

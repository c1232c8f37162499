use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::domain::quiz_question::QuizQuestion;

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Quiz {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub created_by: String,
    pub questions: Vec<QuizQuestion>,
    pub duration_minutes: i64,
    pub num_questions: usize, // derived from questions
    pub total_marks: f64,     // derived, sum of question marks
    #[serde(default)]
    pub schedule: QuizSchedule,
    #[serde(default)]
    pub recipients: Vec<String>, // roster of student emails
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<DateTime<Utc>>,
}

/// When a quiz may be started. Boundaries are local to `timezone`.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct QuizSchedule {
    pub is_scheduled: bool,
    #[serde(default)]
    pub start: Option<ScheduleBoundary>,
    #[serde(default)]
    pub end: Option<ScheduleBoundary>,
    #[serde(default = "default_timezone")]
    pub timezone: String, // IANA name, e.g. "Asia/Kolkata"
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct ScheduleBoundary {
    pub date: NaiveDate,
    #[serde(default)]
    pub time: Option<NaiveTime>,
}

fn default_timezone() -> String {
    "UTC".to_string()
}

impl Default for QuizSchedule {
    fn default() -> Self {
        QuizSchedule {
            is_scheduled: false,
            start: None,
            end: None,
            timezone: default_timezone(),
        }
    }
}

impl Quiz {
    pub fn new(
        title: &str,
        created_by: &str,
        questions: Vec<QuizQuestion>,
        duration_minutes: i64,
        recipients: Vec<String>,
    ) -> Self {
        let mut quiz = Quiz {
            id: uuid::Uuid::new_v4().to_string(),
            title: title.to_string(),
            description: String::new(),
            created_by: created_by.to_string(),
            questions,
            duration_minutes,
            num_questions: 0,
            total_marks: 0.0,
            schedule: QuizSchedule::default(),
            recipients,
            created_at: Some(Utc::now()),
            modified_at: Some(Utc::now()),
        };
        quiz.recompute_totals();
        quiz
    }

    /// Keeps `num_questions` and `total_marks` in step with `questions`.
    pub fn recompute_totals(&mut self) {
        self.num_questions = self.questions.len();
        self.total_marks = self.questions.iter().map(|q| q.marks).sum();
    }

    pub fn has_recipient(&self, email: &str) -> bool {
        let wanted = email.trim();
        self.recipients
            .iter()
            .any(|r| r.trim().eq_ignore_ascii_case(wanted))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_quiz() -> Quiz {
        Quiz::new(
            "Capitals",
            "teacher@example.com",
            vec![
                QuizQuestion::objective("q-1", &["London", "Paris"], "B", 2.0),
                QuizQuestion::free_text("q-2", "Because of the river", 3.0),
            ],
            30,
            vec!["Student@Example.com".to_string()],
        )
    }

    #[test]
    fn totals_are_derived_from_questions() {
        let mut quiz = sample_quiz();
        assert_eq!(quiz.num_questions, 2);
        assert_eq!(quiz.total_marks, 5.0);

        quiz.questions.pop();
        quiz.recompute_totals();

        assert_eq!(quiz.num_questions, 1);
        assert_eq!(quiz.total_marks, 2.0);
    }

    #[test]
    fn roster_lookup_ignores_case_and_padding() {
        let quiz = sample_quiz();

        assert!(quiz.has_recipient(" student@example.com "));
        assert!(!quiz.has_recipient("other@example.com"));
    }

    #[test]
    fn schedule_defaults_to_unscheduled_utc() {
        let json = r#"{"is_scheduled": false}"#;
        let schedule: QuizSchedule = serde_json::from_str(json).expect("schedule should parse");

        assert_eq!(schedule, QuizSchedule::default());
    }

    #[test]
    fn schedule_boundary_time_is_optional() {
        let json = r#"{"date": "2025-01-10"}"#;
        let boundary: ScheduleBoundary = serde_json::from_str(json).expect("boundary should parse");

        assert_eq!(boundary.date, NaiveDate::from_ymd_opt(2025, 1, 10).unwrap());
        assert!(boundary.time.is_none());
    }
}

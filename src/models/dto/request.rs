use serde::Deserialize;
use validator::Validate;

use crate::models::domain::{StudentIdentity, SubmittedAnswer};

/// Academic details a student supplies when starting a quiz. The email always
/// comes from the session or the quiz link, never from the body.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct StudentDetailsRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,

    #[validate(length(max = 50))]
    pub roll_number: Option<String>,

    #[validate(length(max = 100))]
    pub department: Option<String>,

    #[validate(length(max = 20))]
    pub year: Option<String>,
}

impl StudentDetailsRequest {
    pub fn into_identity(self, email: &str) -> StudentIdentity {
        StudentIdentity {
            email: email.to_string(),
            name: self.name.trim().to_string(),
            roll_number: self.roll_number,
            department: self.department,
            year: self.year,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct BeginAttemptRequest {
    #[serde(flatten)]
    #[validate(nested)]
    pub student: StudentDetailsRequest,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LinkAttemptRequest {
    #[validate(length(min = 1))]
    pub token: String,

    #[serde(flatten)]
    #[validate(nested)]
    pub student: StudentDetailsRequest,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AnswerInput {
    #[validate(length(min = 1, max = 100))]
    pub question_id: String,

    #[serde(default)]
    #[validate(length(max = 10000))]
    pub answer: String,
}

impl From<AnswerInput> for SubmittedAnswer {
    fn from(input: AnswerInput) -> Self {
        SubmittedAnswer {
            question_id: input.question_id,
            answer: input.answer,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SaveProgressRequest {
    #[validate(nested)]
    pub answers: Vec<AnswerInput>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SubmitAttemptRequest {
    #[serde(default)]
    #[validate(nested)]
    pub answers: Vec<AnswerInput>,

    #[validate(length(max = 500))]
    pub violation_reason: Option<String>,

    #[serde(default)]
    pub is_auto_submit: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn begin_request_reads_flattened_student_details() {
        let request: BeginAttemptRequest = serde_json::from_str(
            r#"{"name": " Ada Lovelace ", "roll_number": "CS-01", "year": "2"}"#,
        )
        .expect("request should parse");

        assert!(request.validate().is_ok());
        let identity = request.student.into_identity("ada@example.com");
        assert_eq!(identity.name, "Ada Lovelace");
        assert_eq!(identity.email, "ada@example.com");
        assert_eq!(identity.roll_number.as_deref(), Some("CS-01"));
        assert!(identity.department.is_none());
    }

    #[test]
    fn empty_name_fails_validation() {
        let request: LinkAttemptRequest =
            serde_json::from_str(r#"{"token": "abc", "name": ""}"#).expect("request should parse");

        assert!(request.validate().is_err());
    }

    #[test]
    fn answers_without_question_id_fail_validation() {
        let request: SubmitAttemptRequest = serde_json::from_str(
            r#"{"answers": [{"question_id": "", "answer": "A"}], "is_auto_submit": true}"#,
        )
        .expect("request should parse");

        assert!(request.validate().is_err());
    }

    #[test]
    fn submit_request_defaults() {
        let request: SubmitAttemptRequest =
            serde_json::from_str("{}").expect("request should parse");

        assert!(request.validate().is_ok());
        assert!(request.answers.is_empty());
        assert!(request.violation_reason.is_none());
        assert!(!request.is_auto_submit);
    }
}

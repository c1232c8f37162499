//! External scoring of free-text answers.

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::prompts::{free_text_grading_request, FREE_TEXT_GRADER_PROMPT};

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FreeTextGrade {
    pub is_correct: bool,
    pub marks: f64,
    #[serde(default)]
    pub feedback: String,
}

#[derive(Debug, Clone, Error)]
pub enum GraderError {
    #[error("grader timed out after {0:?}")]
    Timeout(Duration),

    #[error("network error: {0}")]
    Network(String),

    #[error("grader API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("malformed grader response: {0}")]
    MalformedResponse(String),
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SemanticGrader: Send + Sync {
    async fn grade_free_text(
        &self,
        prompt: &str,
        canonical_answer: &str,
        student_answer: &str,
        max_marks: f64,
    ) -> Result<FreeTextGrade, GraderError>;
}

/// Grader backed by an OpenAI-compatible chat completions endpoint.
pub struct OpenAiSemanticGrader {
    api_key: SecretString,
    base_url: String,
    model: String,
    timeout: Duration,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f64,
    response_format: ResponseFormat,
    messages: Vec<ChatMessage>,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl OpenAiSemanticGrader {
    pub fn new(
        api_key: SecretString,
        base_url: &str,
        model: &str,
        timeout: Duration,
    ) -> Result<Self, GraderError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GraderError::Network(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            timeout,
            client,
        })
    }
}

#[async_trait]
impl SemanticGrader for OpenAiSemanticGrader {
    async fn grade_free_text(
        &self,
        prompt: &str,
        canonical_answer: &str,
        student_answer: &str,
        max_marks: f64,
    ) -> Result<FreeTextGrade, GraderError> {
        let body = ChatRequest {
            model: &self.model,
            temperature: 0.0,
            response_format: ResponseFormat {
                kind: "json_object",
            },
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: FREE_TEXT_GRADER_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: free_text_grading_request(
                        prompt,
                        canonical_answer,
                        student_answer,
                        max_marks,
                    ),
                },
            ],
        };

        let response = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .bearer_auth(self.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GraderError::Timeout(self.timeout)
                } else {
                    GraderError::Network(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(GraderError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| GraderError::MalformedResponse(e.to_string()))?;

        let content = chat
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| GraderError::MalformedResponse("response had no content".to_string()))?;

        let grade: FreeTextGrade = serde_json::from_str(content.trim())
            .map_err(|e| GraderError::MalformedResponse(e.to_string()))?;

        if !grade.marks.is_finite() {
            return Err(GraderError::MalformedResponse(format!(
                "marks is not a number: {}",
                grade.marks
            )));
        }

        Ok(grade)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn grader_for(server: &MockServer, timeout: Duration) -> OpenAiSemanticGrader {
        OpenAiSemanticGrader::new(
            SecretString::from("test-key".to_string()),
            &server.uri(),
            "test-model",
            timeout,
        )
        .expect("client should build")
    }

    fn completion(content: &str) -> serde_json::Value {
        json!({
            "choices": [{ "message": { "role": "assistant", "content": content } }]
        })
    }

    #[tokio::test]
    async fn parses_grade_from_completion_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion(
                r#"{"isCorrect": true, "marks": 2.5, "feedback": "Good explanation"}"#,
            )))
            .expect(1)
            .mount(&server)
            .await;

        let grade = grader_for(&server, Duration::from_secs(2))
            .grade_free_text("Why is the sky blue?", "Rayleigh scattering", "Scattering", 3.0)
            .await
            .expect("grade should parse");

        assert!(grade.is_correct);
        assert_eq!(grade.marks, 2.5);
        assert_eq!(grade.feedback, "Good explanation");
    }

    #[tokio::test]
    async fn api_failure_is_reported_with_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
            .mount(&server)
            .await;

        let err = grader_for(&server, Duration::from_secs(2))
            .grade_free_text("q", "a", "b", 1.0)
            .await
            .unwrap_err();

        match err {
            GraderError::Api { status, message } => {
                assert_eq!(status, 503);
                assert_eq!(message, "overloaded");
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn non_json_content_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion("looks fine to me")))
            .mount(&server)
            .await;

        let err = grader_for(&server, Duration::from_secs(2))
            .grade_free_text("q", "a", "b", 1.0)
            .await
            .unwrap_err();

        assert!(matches!(err, GraderError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn slow_grader_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(completion(r#"{"isCorrect": true, "marks": 1}"#))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let err = grader_for(&server, Duration::from_millis(50))
            .grade_free_text("q", "a", "b", 1.0)
            .await
            .unwrap_err();

        assert!(matches!(err, GraderError::Timeout(_)));
    }
}

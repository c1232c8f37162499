use serde::{Deserialize, Serialize};

fn default_marks() -> f64 {
    1.0
}

/// One question inside a published quiz.
///
/// Question ids are stable once a quiz is published; grading looks answers up
/// by id, so edits to a live quiz go out as a new quiz version.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct QuizQuestion {
    pub id: String,
    pub prompt: String,
    #[serde(flatten)]
    pub kind: QuestionKind,
    pub correct_answer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    #[serde(default = "default_marks")]
    pub marks: f64,
    #[serde(default)]
    pub difficulty: Difficulty,
}

/// Kind-specific question data, tagged by `type` on the wire.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum QuestionKind {
    Objective { options: Vec<String> },
    FreeText,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl QuestionKind {
    pub fn label(&self) -> &'static str {
        match self {
            QuestionKind::Objective { .. } => "objective",
            QuestionKind::FreeText => "free_text",
        }
    }

    pub fn options(&self) -> &[String] {
        match self {
            QuestionKind::Objective { options } => options,
            QuestionKind::FreeText => &[],
        }
    }
}

#[cfg(test)]
impl QuizQuestion {
    pub fn objective(id: &str, options: &[&str], answer: &str, marks: f64) -> Self {
        QuizQuestion {
            id: id.to_string(),
            prompt: format!("Question {}", id),
            kind: QuestionKind::Objective {
                options: options.iter().map(|o| o.to_string()).collect(),
            },
            correct_answer: answer.to_string(),
            explanation: None,
            marks,
            difficulty: Difficulty::Medium,
        }
    }

    pub fn free_text(id: &str, answer: &str, marks: f64) -> Self {
        QuizQuestion {
            id: id.to_string(),
            prompt: format!("Explain {}", id),
            kind: QuestionKind::FreeText,
            correct_answer: answer.to_string(),
            explanation: None,
            marks,
            difficulty: Difficulty::Medium,
        }
    }
}

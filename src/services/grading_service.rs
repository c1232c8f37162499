use std::{collections::HashMap, sync::Arc, time::Duration};

use crate::{
    models::domain::{AnswerRecord, QuestionKind, QuizQuestion, SubmittedAnswer},
    services::{
        answer_matcher,
        semantic_grader::{GraderError, SemanticGrader},
    },
};

const CORRECT_FEEDBACK: &str = "Correct answer.";
const INCORRECT_FEEDBACK: &str = "Incorrect answer.";
const NO_ANSWER_FEEDBACK: &str = "No answer submitted.";
const GRADING_UNAVAILABLE_FEEDBACK: &str =
    "Automatic grading could not be completed for this answer. It has been scored 0.";

#[derive(Debug, Clone, PartialEq)]
pub struct GradingOutcome {
    pub answers: Vec<AnswerRecord>,
    pub total_marks: f64,
    pub max_marks: f64,
    pub percentage: f64,
}

/// Single grading path shared by every submission flow.
pub struct GradingEngine {
    grader: Arc<dyn SemanticGrader>,
    timeout: Duration,
}

impl GradingEngine {
    pub fn new(grader: Arc<dyn SemanticGrader>, timeout: Duration) -> Self {
        Self { grader, timeout }
    }

    /// Grades every question in quiz order. Never fails: a missing answer is
    /// graded as blank and a grader failure scores that question 0.
    pub async fn grade_attempt(
        &self,
        questions: &[QuizQuestion],
        submitted: &[SubmittedAnswer],
    ) -> GradingOutcome {
        let by_question: HashMap<&str, &str> = submitted
            .iter()
            .map(|a| (a.question_id.as_str(), a.answer.as_str()))
            .collect();

        let mut answers = Vec::with_capacity(questions.len());
        let mut total_marks = 0.0;
        let mut max_marks = 0.0;

        for question in questions {
            let student_answer = by_question.get(question.id.as_str()).copied().unwrap_or("");

            let record = match &question.kind {
                QuestionKind::Objective { options } => {
                    Self::grade_objective(question, options, student_answer)
                }
                QuestionKind::FreeText => self.grade_free_text(question, student_answer).await,
            };

            total_marks += record.marks_awarded;
            max_marks += Self::ceiling(question);
            answers.push(record);
        }

        let percentage = if max_marks > 0.0 {
            total_marks / max_marks * 100.0
        } else {
            0.0
        };

        GradingOutcome {
            answers,
            total_marks,
            max_marks,
            percentage,
        }
    }

    /// Most a question can award. Negative or NaN marks count as 0.
    fn ceiling(question: &QuizQuestion) -> f64 {
        question.marks.max(0.0)
    }

    fn grade_objective(question: &QuizQuestion, options: &[String], student_answer: &str) -> AnswerRecord {
        let is_correct = answer_matcher::matches(student_answer, &question.correct_answer, options);
        let feedback = match &question.explanation {
            Some(explanation) if !explanation.trim().is_empty() => explanation.clone(),
            _ if is_correct => CORRECT_FEEDBACK.to_string(),
            _ => INCORRECT_FEEDBACK.to_string(),
        };

        Self::record(
            question,
            student_answer,
            is_correct,
            if is_correct { Self::ceiling(question) } else { 0.0 },
            feedback,
        )
    }

    async fn grade_free_text(&self, question: &QuizQuestion, student_answer: &str) -> AnswerRecord {
        if student_answer.trim().is_empty() {
            return Self::record(question, student_answer, false, 0.0, NO_ANSWER_FEEDBACK.to_string());
        }

        let call = self.grader.grade_free_text(
            &question.prompt,
            &question.correct_answer,
            student_answer,
            question.marks,
        );

        let result = match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(GraderError::Timeout(self.timeout)),
        };

        match result {
            Ok(grade) => {
                let marks = if grade.marks.is_finite() {
                    grade.marks.clamp(0.0, Self::ceiling(question))
                } else {
                    0.0
                };
                Self::record(question, student_answer, grade.is_correct, marks, grade.feedback)
            }
            Err(err) => {
                log::warn!(
                    "Free-text grading failed for question {}: {}",
                    question.id,
                    err
                );
                Self::record(
                    question,
                    student_answer,
                    false,
                    0.0,
                    GRADING_UNAVAILABLE_FEEDBACK.to_string(),
                )
            }
        }
    }

    fn record(
        question: &QuizQuestion,
        student_answer: &str,
        is_correct: bool,
        marks_awarded: f64,
        feedback: String,
    ) -> AnswerRecord {
        AnswerRecord {
            question_id: question.id.clone(),
            prompt: question.prompt.clone(),
            question_type: question.kind.label().to_string(),
            options: question.kind.options().to_vec(),
            student_answer: student_answer.to_string(),
            correct_answer: question.correct_answer.clone(),
            is_correct,
            marks_awarded,
            feedback,
        }
    }
}

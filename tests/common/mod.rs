#![allow(dead_code)]

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use async_trait::async_trait;
use tokio::sync::RwLock;

use quizgate_server::{
    errors::{AppError, AppResult},
    models::domain::{
        quiz_question::Difficulty, AttemptStatus, QuestionKind, Quiz, QuizAttempt, QuizQuestion,
        StudentIdentity, SubmittedAnswer,
    },
    repositories::{AttemptLookup, QuizAttemptRepository, QuizRepository},
    services::{
        grading_service::GradingEngine,
        quiz_attempt_service::QuizAttemptService,
        semantic_grader::{FreeTextGrade, GraderError, SemanticGrader},
    },
};

pub const STUDENT_EMAIL: &str = "ada@example.com";

pub struct InMemoryQuizRepository {
    quizzes: Arc<RwLock<HashMap<String, Quiz>>>,
}

impl InMemoryQuizRepository {
    pub fn with_quizzes(quizzes: Vec<Quiz>) -> Self {
        Self {
            quizzes: Arc::new(RwLock::new(
                quizzes.into_iter().map(|q| (q.id.clone(), q)).collect(),
            )),
        }
    }
}

#[async_trait]
impl QuizRepository for InMemoryQuizRepository {
    async fn find_by_id(&self, id: &str) -> AppResult<Option<Quiz>> {
        let quizzes = self.quizzes.read().await;
        Ok(quizzes.get(id).cloned())
    }

    async fn find_shared_with(&self, email: &str) -> AppResult<Vec<Quiz>> {
        let quizzes = self.quizzes.read().await;
        let mut shared: Vec<_> = quizzes
            .values()
            .filter(|q| q.has_recipient(email))
            .cloned()
            .collect();
        shared.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(shared)
    }
}

/// Mirrors the Mongo indexes: unique id, unique token, unique live slot, and
/// status-guarded replace.
pub struct InMemoryQuizAttemptRepository {
    attempts: Arc<RwLock<HashMap<String, QuizAttempt>>>,
}

impl InMemoryQuizAttemptRepository {
    pub fn new() -> Self {
        Self {
            attempts: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn all(&self) -> Vec<QuizAttempt> {
        self.attempts.read().await.values().cloned().collect()
    }

    pub async fn get(&self, id: &str) -> Option<QuizAttempt> {
        self.attempts.read().await.get(id).cloned()
    }
}

fn matches_lookup(attempt: &QuizAttempt, lookup: &AttemptLookup) -> bool {
    match lookup {
        AttemptLookup::Id(id) => &attempt.id == id,
        AttemptLookup::Token(token) => &attempt.token == token,
        AttemptLookup::QuizAndStudent {
            quiz_id,
            email,
            statuses,
        } => {
            &attempt.quiz_id == quiz_id
                && &attempt.student.email == email
                && statuses.contains(&attempt.status)
        }
    }
}

#[async_trait]
impl QuizAttemptRepository for InMemoryQuizAttemptRepository {
    async fn find_attempt(&self, lookup: AttemptLookup) -> AppResult<Option<QuizAttempt>> {
        let attempts = self.attempts.read().await;
        Ok(attempts
            .values()
            .filter(|a| matches_lookup(a, &lookup))
            .max_by_key(|a| a.started_at)
            .cloned())
    }

    async fn create(&self, attempt: QuizAttempt) -> AppResult<QuizAttempt> {
        let mut attempts = self.attempts.write().await;
        let duplicate = attempts.values().any(|existing| {
            existing.id == attempt.id
                || existing.token == attempt.token
                || (attempt.live_slot.is_some() && existing.live_slot == attempt.live_slot)
        });
        if duplicate {
            return Err(AppError::Conflict(
                "A live attempt already exists for this quiz and student".to_string(),
            ));
        }
        attempts.insert(attempt.id.clone(), attempt.clone());
        Ok(attempt)
    }

    async fn save(
        &self,
        attempt: QuizAttempt,
        expected: Vec<AttemptStatus>,
    ) -> AppResult<QuizAttempt> {
        let mut attempts = self.attempts.write().await;
        match attempts.get(&attempt.id) {
            Some(current) if expected.contains(&current.status) => {
                attempts.insert(attempt.id.clone(), attempt.clone());
                Ok(attempt)
            }
            _ => Err(AppError::Conflict(format!(
                "Attempt '{}' changed concurrently",
                attempt.id
            ))),
        }
    }
}

/// Grader returning a fixed grade and counting its calls.
pub struct FixedGrader {
    pub marks: f64,
    pub delay: Duration,
    pub calls: AtomicUsize,
}

impl FixedGrader {
    pub fn new(marks: f64) -> Self {
        Self {
            marks,
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn slow(marks: f64, delay: Duration) -> Self {
        Self {
            delay,
            ..Self::new(marks)
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SemanticGrader for FixedGrader {
    async fn grade_free_text(
        &self,
        _prompt: &str,
        _canonical_answer: &str,
        _student_answer: &str,
        _max_marks: f64,
    ) -> Result<FreeTextGrade, GraderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        Ok(FreeTextGrade {
            is_correct: true,
            marks: self.marks,
            feedback: "Matches the expected answer.".to_string(),
        })
    }
}

pub struct FailingGrader;

#[async_trait]
impl SemanticGrader for FailingGrader {
    async fn grade_free_text(
        &self,
        _prompt: &str,
        _canonical_answer: &str,
        _student_answer: &str,
        _max_marks: f64,
    ) -> Result<FreeTextGrade, GraderError> {
        Err(GraderError::Api {
            status: 500,
            message: "upstream exploded".to_string(),
        })
    }
}

pub fn objective(id: &str, options: &[&str], answer: &str, marks: f64) -> QuizQuestion {
    QuizQuestion {
        id: id.to_string(),
        prompt: format!("Question {}", id),
        kind: QuestionKind::Objective {
            options: options.iter().map(|o| o.to_string()).collect(),
        },
        correct_answer: answer.to_string(),
        explanation: None,
        marks,
        difficulty: Difficulty::Easy,
    }
}

pub fn free_text(id: &str, answer: &str, marks: f64) -> QuizQuestion {
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

/// One 2-mark objective question and one 3-mark free-text question.
pub fn sample_quiz(duration_minutes: i64) -> Quiz {
    let mut quiz = Quiz::new(
        "Rust ownership",
        "teacher@example.com",
        vec![
            objective("q-1", &["Copy", "Move", "Clone"], "B", 2.0),
            free_text("q-2", "The value is moved and the old binding is invalid", 3.0),
        ],
        duration_minutes,
        vec![STUDENT_EMAIL.to_string()],
    );
    quiz.id = "quiz-1".to_string();
    quiz
}

pub fn student() -> StudentIdentity {
    StudentIdentity {
        email: STUDENT_EMAIL.to_string(),
        name: "Ada Lovelace".to_string(),
        roll_number: Some("CS-01".to_string()),
        department: Some("Computing".to_string()),
        year: Some("2".to_string()),
    }
}

pub fn answer(question_id: &str, answer: &str) -> SubmittedAnswer {
    SubmittedAnswer {
        question_id: question_id.to_string(),
        answer: answer.to_string(),
    }
}

pub fn correct_answers() -> Vec<SubmittedAnswer> {
    vec![
        answer("q-1", "Move"),
        answer("q-2", "It gets moved, the original can no longer be used"),
    ]
}

/// Wraps the in-memory store and fails exactly one `save`, the `fail_on`-th.
pub struct FailingSaveRepository {
    pub inner: InMemoryQuizAttemptRepository,
    fail_on: usize,
    saves: AtomicUsize,
}

impl FailingSaveRepository {
    pub fn failing_save(fail_on: usize) -> Self {
        Self {
            inner: InMemoryQuizAttemptRepository::new(),
            fail_on,
            saves: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl QuizAttemptRepository for FailingSaveRepository {
    async fn find_attempt(&self, lookup: AttemptLookup) -> AppResult<Option<QuizAttempt>> {
        self.inner.find_attempt(lookup).await
    }

    async fn create(&self, attempt: QuizAttempt) -> AppResult<QuizAttempt> {
        self.inner.create(attempt).await
    }

    async fn save(
        &self,
        attempt: QuizAttempt,
        expected: Vec<AttemptStatus>,
    ) -> AppResult<QuizAttempt> {
        let count = self.saves.fetch_add(1, Ordering::SeqCst) + 1;
        if count == self.fail_on {
            return Err(AppError::DatabaseError("connection reset".to_string()));
        }
        self.inner.save(attempt, expected).await
    }
}

pub fn attempt_service(
    quiz: Quiz,
    attempts: Arc<dyn QuizAttemptRepository>,
    grader: Arc<dyn SemanticGrader>,
    grader_timeout: Duration,
) -> QuizAttemptService {
    let quizzes = Arc::new(InMemoryQuizRepository::with_quizzes(vec![quiz]));
    QuizAttemptService::new(
        quizzes,
        attempts,
        GradingEngine::new(grader, grader_timeout),
    )
}

pub struct Harness {
    pub attempts: Arc<InMemoryQuizAttemptRepository>,
    pub service: Arc<QuizAttemptService>,
}

pub fn harness(quiz: Quiz, grader: Arc<dyn SemanticGrader>, grader_timeout: Duration) -> Harness {
    harness_with_grace(quiz, grader, grader_timeout, 0)
}

pub fn harness_with_grace(
    quiz: Quiz,
    grader: Arc<dyn SemanticGrader>,
    grader_timeout: Duration,
    grace_secs: i64,
) -> Harness {
    let attempts = Arc::new(InMemoryQuizAttemptRepository::new());
    let service = attempt_service(
        quiz,
        Arc::clone(&attempts) as Arc<dyn QuizAttemptRepository>,
        grader,
        grader_timeout,
    )
    .with_submission_grace(grace_secs);

    Harness {
        attempts,
        service: Arc::new(service),
    }
}

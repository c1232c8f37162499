use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::{
    errors::{AppError, AppResult},
    models::domain::{
        quiz_attempt::normalize_email, AttemptStatus, Quiz, QuizAttempt, StudentIdentity,
        SubmittedAnswer,
    },
    repositories::{AttemptLookup, QuizAttemptRepository, QuizRepository},
    services::{accessibility, grading_service::GradingEngine},
};

const ALREADY_SUBMITTED: &str = "Quiz already submitted";
const EXPIRED: &str = "Quiz attempt has expired";

/// Statuses that stop a student from starting the quiz again. Expired attempts
/// are left out: a timed-out attempt is replaced by a fresh one.
const FINALIZED: [AttemptStatus; 3] = [
    AttemptStatus::Submitted,
    AttemptStatus::Graded,
    AttemptStatus::Blocked,
];

/// A live attempt handed back from begin or resume.
#[derive(Debug, Clone)]
pub struct AttemptSession {
    pub attempt: QuizAttempt,
    pub quiz: Quiz,
    pub remaining_seconds: i64,
    pub ends_at: Option<DateTime<Utc>>,
    pub resumed: bool,
}

#[derive(Debug, Clone, Default)]
pub struct Submission {
    pub answers: Vec<SubmittedAnswer>,
    pub violation_reason: Option<String>,
    pub is_auto_submit: bool,
}

pub struct QuizAttemptService {
    quizzes: Arc<dyn QuizRepository>,
    attempts: Arc<dyn QuizAttemptRepository>,
    grading: GradingEngine,
    submission_grace_secs: i64,
}

impl QuizAttemptService {
    pub fn new(
        quizzes: Arc<dyn QuizRepository>,
        attempts: Arc<dyn QuizAttemptRepository>,
        grading: GradingEngine,
    ) -> Self {
        Self {
            quizzes,
            attempts,
            grading,
            submission_grace_secs: 0,
        }
    }

    /// Extra seconds after the deadline during which a submit is still taken.
    pub fn with_submission_grace(mut self, seconds: i64) -> Self {
        self.submission_grace_secs = seconds.max(0);
        self
    }

    pub fn is_expired(attempt: &QuizAttempt, now: DateTime<Utc>) -> bool {
        attempt.is_expired(now)
    }

    /// Starts a new attempt or returns the student's live one.
    pub async fn begin(
        &self,
        quiz_id: &str,
        mut student: StudentIdentity,
        now: DateTime<Utc>,
    ) -> AppResult<AttemptSession> {
        let quiz = self.load_quiz(quiz_id).await?;
        let window = accessibility::evaluate(&quiz.schedule, now).ensure_accessible()?;

        student.email = normalize_email(&student.email);
        if !quiz.has_recipient(&student.email) {
            return Err(AppError::NotFound(format!(
                "'{}' is not on the roster for quiz '{}'",
                student.email, quiz.id
            )));
        }

        if let Some(done) = self
            .find_for_student(&quiz.id, &student.email, FINALIZED.to_vec())
            .await?
        {
            log::info!(
                "Rejected begin for {} on quiz {}: attempt {} is {}",
                student.email,
                quiz.id,
                done.id,
                done.status
            );
            return Err(AppError::Conflict(ALREADY_SUBMITTED.to_string()));
        }

        if let Some(live) = self
            .find_for_student(&quiz.id, &student.email, AttemptStatus::LIVE.to_vec())
            .await?
        {
            if Self::is_expired(&live, now) {
                self.expire(live, now).await?;
            } else {
                log::info!("Resumed attempt {} for quiz {}", live.id, quiz.id);
                return Ok(Self::session(live, quiz, window.ends_at(), now, true));
            }
        }

        let email = student.email.clone();
        let attempt = QuizAttempt::start(&quiz, student, now);
        match self.attempts.create(attempt).await {
            Ok(created) => {
                log::info!("Created attempt {} for quiz {}", created.id, quiz.id);
                Ok(Self::session(created, quiz, window.ends_at(), now, false))
            }
            Err(AppError::Conflict(_)) => {
                // A concurrent begin inserted the live attempt first; hand that one back.
                let winner = self
                    .find_for_student(&quiz.id, &email, AttemptStatus::LIVE.to_vec())
                    .await?
                    .ok_or_else(|| AppError::Conflict(ALREADY_SUBMITTED.to_string()))?;
                log::info!("Resumed concurrently created attempt {}", winner.id);
                Ok(Self::session(winner, quiz, window.ends_at(), now, true))
            }
            Err(err) => Err(err),
        }
    }

    /// Re-locates a live attempt from its resumption token.
    pub async fn resume(&self, token: &str, now: DateTime<Utc>) -> AppResult<AttemptSession> {
        let attempt = self.load_attempt(AttemptLookup::Token(token.to_string())).await?;
        let attempt = self.ensure_live(attempt, now).await?;

        self.begin(&attempt.quiz_id, attempt.student, now).await
    }

    /// Overwrites the saved answers of a live attempt.
    pub async fn save_progress(
        &self,
        lookup: AttemptLookup,
        answers: Vec<SubmittedAnswer>,
        now: DateTime<Utc>,
    ) -> AppResult<QuizAttempt> {
        let attempt = self.load_attempt(lookup).await?;
        let mut attempt = self.ensure_live(attempt, now).await?;

        attempt.responses = answers;
        attempt.status = AttemptStatus::InProgress;
        attempt.time_spent = attempt.elapsed_seconds(now);

        let saved = self
            .attempts
            .save(attempt, AttemptStatus::LIVE.to_vec())
            .await
            .map_err(Self::lost_race)?;

        log::debug!(
            "Saved progress for attempt {} ({} answers)",
            saved.id,
            saved.responses.len()
        );
        Ok(saved)
    }

    /// Grades and finalizes a live attempt. The attempt is claimed as
    /// `submitted` before grading so a concurrent submit cannot grade it twice.
    pub async fn submit(
        &self,
        lookup: AttemptLookup,
        submission: Submission,
        now: DateTime<Utc>,
    ) -> AppResult<QuizAttempt> {
        let mut attempt = self.load_attempt(lookup).await?;

        if attempt.status.is_terminal() {
            return Err(Self::terminal_conflict(attempt.status));
        }

        let deadline = attempt.duration_minutes * 60 + self.submission_grace_secs;
        if attempt.elapsed_seconds(now) >= deadline {
            self.expire(attempt, now).await?;
            return Err(AppError::Conflict(EXPIRED.to_string()));
        }

        let quiz = self.load_quiz(&attempt.quiz_id).await?;
        let violation_reason = submission
            .violation_reason
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty());

        attempt.responses = submission.answers;
        let unclaimed = attempt.clone();
        attempt.is_auto_submit = submission.is_auto_submit;
        attempt.violation_reason = violation_reason;
        attempt.submitted_at = Some(now);
        attempt.finish(AttemptStatus::Submitted, now);

        let mut claimed = self
            .attempts
            .save(attempt, AttemptStatus::LIVE.to_vec())
            .await
            .map_err(Self::lost_race)?;

        let outcome = self
            .grading
            .grade_attempt(&quiz.questions, &claimed.responses)
            .await;

        claimed.answers = outcome.answers;
        claimed.total_marks = outcome.total_marks;
        claimed.max_marks = outcome.max_marks;
        claimed.percentage = outcome.percentage;
        claimed.responses.clear();
        claimed.graded_at = Some(now);

        let status = if claimed.violation_reason.is_some() {
            AttemptStatus::Blocked
        } else {
            AttemptStatus::Graded
        };
        claimed.finish(status, now);

        let finalized = match self
            .attempts
            .save(claimed, vec![AttemptStatus::Submitted])
            .await
        {
            Ok(finalized) => finalized,
            Err(err) => {
                self.release_claim(unclaimed).await;
                return Err(err);
            }
        };

        log::info!(
            "Attempt {} {}: {}/{} ({:.2}%)",
            finalized.id,
            finalized.status,
            finalized.total_marks,
            finalized.max_marks,
            finalized.percentage
        );
        Ok(finalized)
    }

    /// A finished attempt, for showing results after submission.
    pub async fn result(&self, lookup: AttemptLookup) -> AppResult<QuizAttempt> {
        let attempt = self.load_attempt(lookup).await?;
        if attempt.status.is_live() {
            return Err(AppError::Conflict(
                "Quiz attempt has not been submitted yet".to_string(),
            ));
        }
        Ok(attempt)
    }

    async fn load_quiz(&self, quiz_id: &str) -> AppResult<Quiz> {
        self.quizzes
            .find_by_id(quiz_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Quiz with id '{}' not found", quiz_id)))
    }

    async fn load_attempt(&self, lookup: AttemptLookup) -> AppResult<QuizAttempt> {
        self.attempts
            .find_attempt(lookup)
            .await?
            .ok_or_else(|| AppError::NotFound("Quiz attempt not found".to_string()))
    }

    async fn find_for_student(
        &self,
        quiz_id: &str,
        email: &str,
        statuses: Vec<AttemptStatus>,
    ) -> AppResult<Option<QuizAttempt>> {
        self.attempts
            .find_attempt(AttemptLookup::QuizAndStudent {
                quiz_id: quiz_id.to_string(),
                email: email.to_string(),
                statuses,
            })
            .await
    }

    /// Rejects terminal attempts and lazily expires timed-out ones.
    async fn ensure_live(&self, attempt: QuizAttempt, now: DateTime<Utc>) -> AppResult<QuizAttempt> {
        if attempt.status.is_terminal() {
            return Err(Self::terminal_conflict(attempt.status));
        }
        if Self::is_expired(&attempt, now) {
            self.expire(attempt, now).await?;
            return Err(AppError::Conflict(EXPIRED.to_string()));
        }
        Ok(attempt)
    }

    async fn expire(&self, mut attempt: QuizAttempt, now: DateTime<Utc>) -> AppResult<()> {
        let id = attempt.id.clone();
        attempt.finish(AttemptStatus::Expired, now);

        match self
            .attempts
            .save(attempt, AttemptStatus::LIVE.to_vec())
            .await
        {
            Ok(_) => {
                log::info!("Attempt {} expired", id);
                Ok(())
            }
            // Someone else already moved it out of the live states.
            Err(AppError::Conflict(_)) => Ok(()),
            Err(err) => Err(err),
        }
    }

    /// Puts a claimed attempt back to its live state so the student can submit again.
    async fn release_claim(&self, unclaimed: QuizAttempt) {
        let id = unclaimed.id.clone();
        match self
            .attempts
            .save(unclaimed, vec![AttemptStatus::Submitted])
            .await
        {
            Ok(_) => log::warn!("Finalizing attempt {} failed; claim released", id),
            Err(err) => log::error!("Attempt {} is stuck in submitted: {}", id, err),
        }
    }

    fn session(
        attempt: QuizAttempt,
        quiz: Quiz,
        ends_at: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
        resumed: bool,
    ) -> AttemptSession {
        AttemptSession {
            remaining_seconds: attempt.remaining_seconds(now),
            attempt,
            quiz,
            ends_at,
            resumed,
        }
    }

    fn terminal_conflict(status: AttemptStatus) -> AppError {
        match status {
            AttemptStatus::Expired => AppError::Conflict(EXPIRED.to_string()),
            _ => AppError::Conflict(ALREADY_SUBMITTED.to_string()),
        }
    }

    fn lost_race(err: AppError) -> AppError {
        match err {
            AppError::Conflict(_) => AppError::Conflict(ALREADY_SUBMITTED.to_string()),
            other => other,
        }
    }
}

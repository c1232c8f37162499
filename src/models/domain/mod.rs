pub mod quiz;
pub mod quiz_attempt;
pub mod quiz_question;

pub use quiz::{Quiz, QuizSchedule, ScheduleBoundary};
pub use quiz_attempt::{AnswerRecord, AttemptStatus, QuizAttempt, StudentIdentity, SubmittedAnswer};
pub use quiz_question::{QuestionKind, QuizQuestion};

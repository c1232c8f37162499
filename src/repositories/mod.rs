pub mod quiz_attempt_repository;
pub mod quiz_repository;

pub use quiz_attempt_repository::{AttemptLookup, MongoQuizAttemptRepository, QuizAttemptRepository};
pub use quiz_repository::{MongoQuizRepository, QuizRepository};

use async_trait::async_trait;
use mongodb::{
    bson::{doc, Document},
    error::{ErrorKind, WriteFailure},
    options::IndexOptions,
    Collection, IndexModel,
};

use crate::{
    db::Database,
    errors::{AppError, AppResult},
    models::domain::{AttemptStatus, QuizAttempt},
};

const DUPLICATE_KEY: i32 = 11000;

/// The ways an attempt can be located.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AttemptLookup {
    Id(String),
    Token(String),
    QuizAndStudent {
        quiz_id: String,
        email: String,
        statuses: Vec<AttemptStatus>,
    },
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QuizAttemptRepository: Send + Sync {
    /// Most recently started attempt matching the lookup.
    async fn find_attempt(&self, lookup: AttemptLookup) -> AppResult<Option<QuizAttempt>>;

    /// Inserts a new attempt. A second live attempt for the same quiz and
    /// student fails with `Conflict`.
    async fn create(&self, attempt: QuizAttempt) -> AppResult<QuizAttempt>;

    /// Replaces the stored attempt only if its current status is one of
    /// `expected`; otherwise `Conflict`.
    async fn save(
        &self,
        attempt: QuizAttempt,
        expected: Vec<AttemptStatus>,
    ) -> AppResult<QuizAttempt>;
}

pub struct MongoQuizAttemptRepository {
    collection: Collection<QuizAttempt>,
}

impl MongoQuizAttemptRepository {
    pub fn new(db: &Database) -> Self {
        let collection = db.get_collection("quiz_attempts");
        Self { collection }
    }

    pub async fn ensure_indexes(&self) -> AppResult<()> {
        log::info!("Creating indexes for quiz_attempts collection");

        let id_index = IndexModel::builder()
            .keys(doc! { "id": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("id_unique".to_string())
                    .build(),
            )
            .build();

        let token_index = IndexModel::builder()
            .keys(doc! { "token": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("token_unique".to_string())
                    .build(),
            )
            .build();

        let quiz_student_index = IndexModel::builder()
            .keys(doc! { "quiz_id": 1, "student.email": 1 })
            .options(
                IndexOptions::builder()
                    .name("quiz_student".to_string())
                    .build(),
            )
            .build();

        // live_slot is absent on terminal attempts, so the sparse unique index
        // only constrains live ones.
        let live_slot_index = IndexModel::builder()
            .keys(doc! { "live_slot": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .sparse(true)
                    .name("live_slot_unique".to_string())
                    .build(),
            )
            .build();

        self.collection.create_index(id_index).await?;
        self.collection.create_index(token_index).await?;
        self.collection.create_index(quiz_student_index).await?;
        self.collection.create_index(live_slot_index).await?;

        log::info!("Successfully created indexes for quiz_attempts collection");
        Ok(())
    }
}

fn status_filter(statuses: &[AttemptStatus]) -> Document {
    let names: Vec<&str> = statuses.iter().map(|s| s.as_str()).collect();
    doc! { "$in": names }
}

fn lookup_filter(lookup: &AttemptLookup) -> Document {
    match lookup {
        AttemptLookup::Id(id) => doc! { "id": id },
        AttemptLookup::Token(token) => doc! { "token": token },
        AttemptLookup::QuizAndStudent {
            quiz_id,
            email,
            statuses,
        } => doc! {
            "quiz_id": quiz_id,
            "student.email": email,
            "status": status_filter(statuses),
        },
    }
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(write_error)) if write_error.code == DUPLICATE_KEY
    )
}

#[async_trait]
impl QuizAttemptRepository for MongoQuizAttemptRepository {
    async fn find_attempt(&self, lookup: AttemptLookup) -> AppResult<Option<QuizAttempt>> {
        let attempt = self
            .collection
            .find_one(lookup_filter(&lookup))
            .sort(doc! { "started_at": -1 })
            .await?;
        Ok(attempt)
    }

    async fn create(&self, attempt: QuizAttempt) -> AppResult<QuizAttempt> {
        match self.collection.insert_one(&attempt).await {
            Ok(_) => Ok(attempt),
            Err(err) if is_duplicate_key(&err) => Err(AppError::Conflict(format!(
                "A live attempt already exists for quiz '{}'",
                attempt.quiz_id
            ))),
            Err(err) => Err(err.into()),
        }
    }

    async fn save(
        &self,
        attempt: QuizAttempt,
        expected: Vec<AttemptStatus>,
    ) -> AppResult<QuizAttempt> {
        let filter = doc! {
            "id": &attempt.id,
            "status": status_filter(&expected),
        };

        let result = self.collection.replace_one(filter, &attempt).await?;

        if result.matched_count == 0 {
            return Err(AppError::Conflict(format!(
                "Attempt '{}' changed state concurrently",
                attempt.id
            )));
        }

        Ok(attempt)
    }
}

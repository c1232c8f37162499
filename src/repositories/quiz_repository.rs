use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    bson::doc,
    options::{Collation, CollationStrength, IndexOptions},
    Collection, IndexModel,
};

use crate::{db::Database, errors::AppResult, models::domain::Quiz};

/// Read side of the quiz store. Authoring lives with the instructor tooling.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QuizRepository: Send + Sync {
    async fn find_by_id(&self, id: &str) -> AppResult<Option<Quiz>>;
    async fn find_shared_with(&self, email: &str) -> AppResult<Vec<Quiz>>;
}

/// Compares roster emails ignoring case, matching `Quiz::has_recipient`.
/// The query and the `recipients` index must share it for the index to apply.
fn roster_collation() -> Collation {
    Collation::builder()
        .locale("en".to_string())
        .strength(CollationStrength::Secondary)
        .build()
}

pub struct MongoQuizRepository {
    collection: Collection<Quiz>,
}

impl MongoQuizRepository {
    pub fn new(db: &Database) -> Self {
        let collection = db.get_collection("quizzes");
        Self { collection }
    }

    pub async fn ensure_indexes(&self) -> AppResult<()> {
        log::info!("Creating indexes for quizzes collection");

        let id_index = IndexModel::builder()
            .keys(doc! { "id": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("id_unique".to_string())
                    .build(),
            )
            .build();

        let recipients_index = IndexModel::builder()
            .keys(doc! { "recipients": 1 })
            .options(
                IndexOptions::builder()
                    .name("recipients_ci".to_string())
                    .collation(roster_collation())
                    .build(),
            )
            .build();

        self.collection.create_index(id_index).await?;
        self.collection.create_index(recipients_index).await?;

        log::info!("Successfully created indexes for quizzes collection");
        Ok(())
    }
}

#[async_trait]
impl QuizRepository for MongoQuizRepository {
    async fn find_by_id(&self, id: &str) -> AppResult<Option<Quiz>> {
        let quiz = self.collection.find_one(doc! { "id": id }).await?;
        Ok(quiz)
    }

    async fn find_shared_with(&self, email: &str) -> AppResult<Vec<Quiz>> {
        let quizzes: Vec<Quiz> = self
            .collection
            .find(doc! { "recipients": email.trim() })
            .collation(roster_collation())
            .sort(doc! { "created_at": -1 })
            .await?
            .try_collect()
            .await?;
        Ok(quizzes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roster_collation_ignores_case_only() {
        let collation = roster_collation();

        assert_eq!(collation.locale, "en");
        assert!(matches!(
            collation.strength,
            Some(CollationStrength::Secondary)
        ));
    }
}

use std::{sync::Arc, time::Duration};

use crate::{
    auth::JwtService,
    config::Config,
    db::Database,
    errors::{AppError, AppResult},
    repositories::{
        MongoQuizAttemptRepository, MongoQuizRepository, QuizAttemptRepository, QuizRepository,
    },
    services::{
        grading_service::GradingEngine,
        quiz_attempt_service::QuizAttemptService,
        quiz_service::QuizService,
        semantic_grader::{OpenAiSemanticGrader, SemanticGrader},
    },
};

#[derive(Clone)]
pub struct AppState {
    pub quiz_service: Arc<QuizService>,
    pub attempt_service: Arc<QuizAttemptService>,
    pub jwt_service: JwtService,
    pub db: Option<Database>,
    pub config: Arc<Config>,
}

impl AppState {
    pub async fn new(config: Config) -> AppResult<Self> {
        let db = Database::connect(&config).await?;

        let quiz_repository = Arc::new(MongoQuizRepository::new(&db));
        quiz_repository.ensure_indexes().await?;

        let attempt_repository = Arc::new(MongoQuizAttemptRepository::new(&db));
        attempt_repository.ensure_indexes().await?;

        let grader = OpenAiSemanticGrader::new(
            config.grader_api_key.clone(),
            &config.grader_base_url,
            &config.grader_model,
            Duration::from_secs(config.grader_timeout_secs),
        )
        .map_err(|e| AppError::InternalError(format!("Failed to build grader client: {}", e)))?;

        let mut state = Self::from_parts(
            quiz_repository,
            attempt_repository,
            Arc::new(grader),
            config,
        );
        state.db = Some(db);
        Ok(state)
    }

    /// Wires the services over the given storage and grader without a database.
    pub fn from_parts(
        quiz_repository: Arc<dyn QuizRepository>,
        attempt_repository: Arc<dyn QuizAttemptRepository>,
        grader: Arc<dyn SemanticGrader>,
        config: Config,
    ) -> Self {
        let grading = GradingEngine::new(grader, Duration::from_secs(config.grader_timeout_secs));
        let attempt_service =
            QuizAttemptService::new(Arc::clone(&quiz_repository), attempt_repository, grading)
                .with_submission_grace(config.submission_grace_secs);

        Self {
            quiz_service: Arc::new(QuizService::new(quiz_repository)),
            attempt_service: Arc::new(attempt_service),
            jwt_service: JwtService::new(&config.jwt_secret, config.jwt_expiration_hours),
            db: None,
            config: Arc::new(config),
        }
    }
}

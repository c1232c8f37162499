use secrecy::SecretString;
use std::env;

const DEFAULT_JWT_SECRET: &str = "dev_secret_key_change_in_production";
const DEFAULT_GRADER_API_KEY: &str = "grader_api_key";

#[derive(Clone, Debug)]
pub struct Config {
    pub mongo_conn_string: String,
    pub mongo_db_name: String,
    pub web_server_host: String,
    pub web_server_port: u16,
    pub jwt_secret: SecretString,
    pub jwt_expiration_hours: i64,
    pub grader_api_key: SecretString,
    pub grader_base_url: String,
    pub grader_model: String,
    pub grader_timeout_secs: u64,
    pub submission_grace_secs: i64,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            mongo_conn_string: env::var("MONGO_CONN_STRING")
                .unwrap_or_else(|_| "mongodb://localhost:27017".to_string()),
            mongo_db_name: env::var("MONGO_DB_NAME")
                .unwrap_or_else(|_| "quizgate-local".to_string()),
            web_server_host: env::var("WEB_SERVER_HOST")
                .unwrap_or_else(|_| "localhost".to_string()),
            web_server_port: env::var("WEB_SERVER_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            jwt_secret: SecretString::from(
                env::var("JWT_SECRET").unwrap_or_else(|_| DEFAULT_JWT_SECRET.to_string()),
            ),
            jwt_expiration_hours: env::var("JWT_EXPIRATION_HOURS")
                .ok()
                .and_then(|h| h.parse().ok())
                .unwrap_or(24),
            grader_api_key: SecretString::from(
                env::var("GRADER_API_KEY").unwrap_or_else(|_| DEFAULT_GRADER_API_KEY.to_string()),
            ),
            grader_base_url: env::var("GRADER_BASE_URL")
                .unwrap_or_else(|_| "https://api.openai.com".to_string()),
            grader_model: env::var("GRADER_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string()),
            grader_timeout_secs: env::var("GRADER_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(3),
            submission_grace_secs: env::var("SUBMISSION_GRACE_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(0),
        }
    }

    /// Validate that production-critical configuration is set
    /// Panics if required secrets are using default values
    pub fn validate_for_production(&self) {
        use secrecy::ExposeSecret;

        let jwt_secret = self.jwt_secret.expose_secret();

        if jwt_secret == DEFAULT_JWT_SECRET {
            panic!(
                "FATAL: JWT_SECRET is using default value! Set JWT_SECRET environment variable to a secure random string."
            );
        }

        if jwt_secret.len() < 32 {
            panic!(
                "FATAL: JWT_SECRET is too short ({}). Must be at least 32 characters for security.",
                jwt_secret.len()
            );
        }

        if self.grader_api_key.expose_secret() == DEFAULT_GRADER_API_KEY {
            panic!(
                "FATAL: GRADER_API_KEY is using default value! Set GRADER_API_KEY environment variable."
            );
        }
    }

    #[cfg(test)]
    pub fn test_config() -> Self {
        Self {
            mongo_conn_string: "mongodb://localhost:27017".to_string(),
            mongo_db_name: "quizgate-test".to_string(),
            web_server_host: "127.0.0.1".to_string(),
            web_server_port: 8080,
            jwt_secret: SecretString::from("test_jwt_secret_key".to_string()),
            jwt_expiration_hours: 1,
            grader_api_key: SecretString::from("test_grader_key".to_string()),
            grader_base_url: "http://127.0.0.1:9".to_string(),
            grader_model: "test-model".to_string(),
            grader_timeout_secs: 1,
            submission_grace_secs: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_env_with_defaults() {
        let config = Config::from_env();

        // Should use env vars if set, or fall back to defaults
        assert!(!config.mongo_conn_string.is_empty());
        assert!(!config.mongo_db_name.is_empty());
        assert!(config.grader_timeout_secs > 0);
    }

    #[test]
    fn test_test_config() {
        let config = Config::test_config();

        assert_eq!(config.mongo_db_name, "quizgate-test");
        assert_eq!(config.grader_timeout_secs, 1);
        assert_eq!(config.submission_grace_secs, 0);
    }

    #[test]
    #[should_panic(expected = "JWT_SECRET")]
    fn test_production_validation_rejects_short_secret() {
        Config::test_config().validate_for_production();
    }
}

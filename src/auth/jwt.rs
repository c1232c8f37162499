use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};

use crate::{
    auth::claims::{QuizLinkClaims, StudentClaims, QUIZ_LINK_TOKEN_TYPE},
    errors::{AppError, AppResult},
};

#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    expiration_hours: i64,
}

impl JwtService {
    pub fn new(secret: &SecretString, expiration_hours: i64) -> Self {
        let secret_bytes = secret.expose_secret().as_bytes();

        Self {
            encoding_key: EncodingKey::from_secret(secret_bytes),
            decoding_key: DecodingKey::from_secret(secret_bytes),
            validation: Validation::default(),
            expiration_hours,
        }
    }

    pub fn create_session_token(&self, email: &str, name: &str) -> AppResult<String> {
        let claims = StudentClaims::new(email, name, self.expiration_hours);

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AppError::InternalError(format!("Failed to create JWT: {}", e)))
    }

    pub fn validate_session_token(&self, token: &str) -> AppResult<StudentClaims> {
        decode::<StudentClaims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| AppError::Unauthorized(format!("Invalid token: {}", e)))
    }

    pub fn create_quiz_link_token(
        &self,
        email: &str,
        quiz_id: &str,
        expiration_hours: i64,
    ) -> AppResult<String> {
        let claims = QuizLinkClaims::new(email, quiz_id, expiration_hours);

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AppError::InternalError(format!("Failed to create quiz link: {}", e)))
    }

    pub fn validate_quiz_link_token(&self, token: &str) -> AppResult<QuizLinkClaims> {
        let token_data = decode::<QuizLinkClaims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                    AppError::Unauthorized("Quiz link has expired".to_string())
                }
                jsonwebtoken::errors::ErrorKind::InvalidSignature => {
                    AppError::Unauthorized("Quiz link signature is invalid".to_string())
                }
                _ => AppError::Unauthorized(format!("Quiz link validation failed: {}", e)),
            })?;

        if token_data.claims.token_type != QUIZ_LINK_TOKEN_TYPE {
            return Err(AppError::Unauthorized(
                "Token is not a quiz link".to_string(),
            ));
        }

        Ok(token_data.claims)
    }
}

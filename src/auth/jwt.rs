use crate::config::AuthConfig;
use crate::error::AppError;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: i32,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn new(user_id: i32, expires_in: Duration) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            sub: user_id,
            iat: now,
            exp: now + expires_in.as_secs() as i64,
        }
    }
}

/// Issues and validates the HS256 bearer tokens the API accepts.
pub trait JwtService: Send + Sync {
    fn create_token(&self, user_id: i32) -> Result<String, AppError>;

    fn validate_token(&self, token: &str) -> Result<Claims, AppError>;
}

pub struct JwtServiceImpl {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    token_expiry: Duration,
}

impl JwtServiceImpl {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            token_expiry: Duration::from_secs(config.token_expiry_seconds),
        }
    }
}

impl JwtService for JwtServiceImpl {
    fn create_token(&self, user_id: i32) -> Result<String, AppError> {
        let claims = Claims::new(user_id, self.token_expiry);
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &self.encoding_key,
        )?;
        Ok(token)
    }

    fn validate_token(&self, token: &str) -> Result<Claims, AppError> {
        let data = decode::<Claims>(token, &self.decoding_key, &Validation::new(Algorithm::HS256))?;
        Ok(data.claims)
    }
}

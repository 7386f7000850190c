//! Authentication Service
//!
//! Handles registration, password login and JWT validation.

use std::sync::Arc;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::config::AuthSettings;
use crate::domain::{NewUser, RegisteredUser, UserRepository};
use crate::shared::error::AppError;

/// Audience claim of every issued token
pub const JWT_AUDIENCE: &str = "l2p:auth";

/// Authentication service trait for dependency injection
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Create a new active account
    async fn register(
        &self,
        nickname: &str,
        email: &str,
        password: &str,
    ) -> Result<RegisteredUser, AuthError>;

    /// Check credentials and issue an access token
    async fn login(&self, email: &str, password: &str) -> Result<AccessToken, AuthError>;

    /// Resolve a token to its active user
    async fn authenticate(&self, token: &str) -> Result<RegisteredUser, AuthError>;

    /// Token and cookie lifetime in seconds
    fn token_lifetime(&self) -> i64;
}

/// Issued access token
#[derive(Debug, Clone, Serialize)]
pub struct AccessToken {
    pub token: String,
    pub expires_in: i64,
}

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at time (Unix timestamp)
    pub iat: i64,
    pub aud: String,
}

/// Authentication errors
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token")]
    InvalidToken,

    #[error("User not found or inactive")]
    InactiveUser,

    #[error("Email already registered")]
    EmailExists,

    #[error("Nickname already taken")]
    NicknameExists,

    #[error("Internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Repository(#[from] AppError),
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => AppError::Unauthorized("Invalid credentials".into()),
            AuthError::TokenExpired => AppError::Unauthorized("Token expired".into()),
            AuthError::InvalidToken => AppError::Unauthorized("Invalid token".into()),
            AuthError::InactiveUser => {
                AppError::Unauthorized("User not found or inactive".into())
            }
            AuthError::EmailExists => AppError::Conflict("Email already registered".into()),
            AuthError::NicknameExists => AppError::Conflict("Nickname already taken".into()),
            AuthError::Internal(msg) => AppError::Internal(msg),
            AuthError::Repository(e) => e,
        }
    }
}

/// Hash a password using Argon2id
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::Internal(format!("Password hashing failed: {}", e)))
}

/// Verify a password against its hash
pub fn verify_password(password: &str, hash: &str) -> Result<bool, AuthError> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| AuthError::Internal(format!("Invalid password hash: {}", e)))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// AuthService implementation
pub struct AuthServiceImpl<U>
where
    U: UserRepository,
{
    user_repo: Arc<U>,
    settings: AuthSettings,
}

impl<U> AuthServiceImpl<U>
where
    U: UserRepository,
{
    /// Create a new AuthServiceImpl
    pub fn new(user_repo: Arc<U>, settings: AuthSettings) -> Self {
        Self {
            user_repo,
            settings,
        }
    }

    /// Sign an access token for `user_id`
    fn issue_token(&self, user_id: i64) -> Result<AccessToken, AuthError> {
        let now = Utc::now();
        let expiry = now + Duration::seconds(self.settings.jwt_lifetime_seconds);

        let claims = Claims {
            sub: user_id.to_string(),
            exp: expiry.timestamp(),
            iat: now.timestamp(),
            aud: JWT_AUDIENCE.to_string(),
        };

        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.settings.secret_key.as_bytes()),
        )
        .map_err(|e| AuthError::Internal(format!("Token generation failed: {}", e)))?;

        Ok(AccessToken {
            token,
            expires_in: self.settings.jwt_lifetime_seconds,
        })
    }

    /// Decode and validate an access token
    fn decode_token(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[JWT_AUDIENCE]);

        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.settings.secret_key.as_bytes()),
            &validation,
        )
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            _ => AuthError::InvalidToken,
        })?;

        Ok(token_data.claims)
    }
}

#[async_trait]
impl<U> AuthService for AuthServiceImpl<U>
where
    U: UserRepository + 'static,
{
    #[instrument(skip(self, password))]
    async fn register(
        &self,
        nickname: &str,
        email: &str,
        password: &str,
    ) -> Result<RegisteredUser, AuthError> {
        if self.user_repo.email_exists(email).await? {
            return Err(AuthError::EmailExists);
        }

        if self.user_repo.nickname_exists(nickname).await? {
            return Err(AuthError::NicknameExists);
        }

        let password_hash = hash_password(password)?;

        let user = self
            .user_repo
            .create(&NewUser {
                nickname: nickname.to_string(),
                email: email.to_string(),
                password_hash,
            })
            .await?;

        info!(user_id = user.id, "User registered");
        Ok(user)
    }

    #[instrument(skip(self, password))]
    async fn login(&self, email: &str, password: &str) -> Result<AccessToken, AuthError> {
        let user = self
            .user_repo
            .find_by_email(email)
            .await?
            .filter(|u| u.is_active)
            .ok_or(AuthError::InvalidCredentials)?;

        let hash = user
            .password_hash
            .as_deref()
            .ok_or(AuthError::InvalidCredentials)?;

        if !verify_password(password, hash)? {
            return Err(AuthError::InvalidCredentials);
        }

        self.issue_token(user.id)
    }

    async fn authenticate(&self, token: &str) -> Result<RegisteredUser, AuthError> {
        let claims = self.decode_token(token)?;

        let user_id = claims
            .sub
            .parse::<i64>()
            .map_err(|_| AuthError::InvalidToken)?;

        self.user_repo
            .find_by_id(user_id)
            .await?
            .filter(|u| u.is_active)
            .ok_or(AuthError::InactiveUser)
    }

    fn token_lifetime(&self) -> i64 {
        self.settings.jwt_lifetime_seconds
    }
}

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use async_trait::async_trait;
use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use sea_orm::{ConnectionTrait, DatabaseConnection, DbErr, Set, SqlErr};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

use crate::config::AppConfig;
use crate::errors::{ErrorResponse, ServiceError};
use crate::events::{Event, EventSender};
use crate::repositories::UserRepository;

pub mod user;

pub use user::UserRole;

/// JWT claims for access tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,        // Subject (user ID)
    pub email: String,      // User's email
    pub role: UserRole,     // customer | admin
    pub jti: String,        // JWT ID
    pub iat: i64,           // Issued at time
    pub exp: i64,           // Expiration time
    pub nbf: i64,           // Not valid before time
    pub iss: String,        // Issuer
    pub aud: String,        // Audience
}

/// Authenticated user data extracted from the bearer token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub email: String,
    pub role: UserRole,
    pub token_id: String,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

/// An [`AuthUser`] whose role is `admin`
#[derive(Debug, Clone)]
pub struct AdminUser(pub AuthUser);

/// Token signing settings
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_audience: String,
    pub jwt_issuer: String,
    pub access_token_expiration: Duration,
}

impl From<&AppConfig> for AuthConfig {
    fn from(cfg: &AppConfig) -> Self {
        Self {
            jwt_secret: cfg.jwt_secret.clone(),
            jwt_audience: cfg.auth_audience.clone(),
            jwt_issuer: cfg.auth_issuer.clone(),
            access_token_expiration: Duration::from_secs(cfg.jwt_expiration_secs),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be between 1 and 100 characters"))]
    pub name: String,
    #[validate(email(message = "Email must be a valid address"))]
    pub email: String,
    #[validate(length(min = 6, max = 128, message = "Password must be at least 6 characters"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Email must be a valid address"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be between 1 and 100 characters"))]
    pub name: String,
    #[validate(email(message = "Email must be a valid address"))]
    pub email: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ChangePasswordRequest {
    #[validate(length(min = 1, message = "Current password is required"))]
    pub current_password: String,
    #[validate(length(min = 6, max = 128, message = "Password must be at least 6 characters"))]
    pub new_password: String,
    pub confirm_password: String,
}

/// Public view of a user account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub created_at: chrono::DateTime<Utc>,
    pub updated_at: chrono::DateTime<Utc>,
}

impl From<user::Model> for UserResponse {
    fn from(model: user::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            email: model.email,
            role: model.role,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
    pub user: UserResponse,
}

/// Registration, login and bearer-token validation
#[derive(Clone)]
pub struct AuthService {
    db: Arc<DatabaseConnection>,
    config: AuthConfig,
    event_sender: Arc<EventSender>,
    users: UserRepository,
}

impl AuthService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        config: AuthConfig,
        event_sender: Arc<EventSender>,
    ) -> Self {
        Self {
            db,
            config,
            event_sender,
            users: UserRepository,
        }
    }

    /// Creates a customer account
    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn register(&self, request: RegisterRequest) -> Result<UserResponse, ServiceError> {
        request.validate()?;
        let email = request.email.trim().to_lowercase();

        if self.users.find_by_email(&*self.db, &email).await?.is_some() {
            return Err(ServiceError::Conflict(format!(
                "email {} is already registered",
                email
            )));
        }

        let password_hash = hash_password(request.password).await?;
        let now = Utc::now();
        let model = user::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(request.name.trim().to_string()),
            email: Set(email.clone()),
            password_hash: Set(password_hash),
            role: Set(UserRole::Customer),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let created = self
            .users
            .create(&*self.db, model)
            .await
            .map_err(|e| unique_violation_as_conflict(e, &email))?;

        self.event_sender
            .send_or_log(Event::UserRegistered(created.id))
            .await;
        info!(user_id = %created.id, "User registered");

        Ok(created.into())
    }

    /// Verifies credentials and issues an access token
    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn login(&self, request: LoginRequest) -> Result<TokenResponse, ServiceError> {
        request.validate()?;

        let email = request.email.trim().to_lowercase();
        let Some(account) = self.users.find_by_email(&*self.db, &email).await? else {
            warn!("Login attempt for unknown email");
            return Err(AuthError::InvalidCredentials.into());
        };

        if !verify_password(request.password, account.password_hash.clone()).await? {
            warn!(user_id = %account.id, "Login attempt with wrong password");
            return Err(AuthError::InvalidCredentials.into());
        }

        let access_token = self.generate_token(&account)?;
        info!(user_id = %account.id, "User logged in");

        Ok(TokenResponse {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in: self.config.access_token_expiration.as_secs(),
            user: account.into(),
        })
    }

    #[instrument(skip(self))]
    pub async fn profile(&self, user_id: Uuid) -> Result<UserResponse, ServiceError> {
        self.users
            .find_by_id(&*self.db, user_id)
            .await?
            .map(UserResponse::from)
            .ok_or_else(|| ServiceError::NotFound(format!("user {} not found", user_id)))
    }

    /// Changes the caller's name and email. The email must not belong to
    /// another account.
    #[instrument(skip(self, request))]
    pub async fn update_profile(
        &self,
        user_id: Uuid,
        request: UpdateProfileRequest,
    ) -> Result<UserResponse, ServiceError> {
        request.validate()?;
        let email = request.email.trim().to_lowercase();

        let account = self
            .users
            .find_by_id(&*self.db, user_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("user {} not found", user_id)))?;
        ensure_email_free(&self.users, &*self.db, &email, user_id).await?;

        let mut active: user::ActiveModel = account.into();
        active.name = Set(request.name.trim().to_string());
        active.email = Set(email.clone());
        active.updated_at = Set(Utc::now());
        let updated = self
            .users
            .update(&*self.db, active)
            .await
            .map_err(|e| unique_violation_as_conflict(e, &email))?;

        self.event_sender
            .send_or_log(Event::UserUpdated(updated.id))
            .await;
        info!(%user_id, "Profile updated");

        Ok(updated.into())
    }

    /// Replaces the caller's password after checking the current one
    #[instrument(skip(self, request))]
    pub async fn change_password(
        &self,
        user_id: Uuid,
        request: ChangePasswordRequest,
    ) -> Result<(), ServiceError> {
        request.validate()?;
        if request.new_password != request.confirm_password {
            return Err(ServiceError::ValidationError(
                "new password and confirmation do not match".to_string(),
            ));
        }

        let account = self
            .users
            .find_by_id(&*self.db, user_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("user {} not found", user_id)))?;

        if !verify_password(request.current_password, account.password_hash.clone()).await? {
            warn!(%user_id, "Password change with wrong current password");
            return Err(ServiceError::ValidationError(
                "current password is incorrect".to_string(),
            ));
        }

        let password_hash = hash_password(request.new_password).await?;
        let mut active: user::ActiveModel = account.into();
        active.password_hash = Set(password_hash);
        active.updated_at = Set(Utc::now());
        self.users.update(&*self.db, active).await?;

        info!(%user_id, "Password changed");
        Ok(())
    }

    /// Signs an HS256 access token for `account`
    pub fn generate_token(&self, account: &user::Model) -> Result<String, AuthError> {
        let now = Utc::now();
        let exp = now
            + ChronoDuration::from_std(self.config.access_token_expiration)
                .map_err(|_| AuthError::InternalError("Invalid token duration".to_string()))?;

        let claims = Claims {
            sub: account.id.to_string(),
            email: account.email.clone(),
            role: account.role,
            jti: Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
            nbf: now.timestamp(),
            iss: self.config.jwt_issuer.clone(),
            aud: self.config.jwt_audience.clone(),
        };

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.config.jwt_secret.as_bytes()),
        )
        .map_err(|e| AuthError::TokenCreation(e.to_string()))
    }

    /// Decodes and checks signature, expiry, issuer and audience
    pub fn validate_token(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[self.config.jwt_issuer.as_str()]);
        validation.set_audience(&[self.config.jwt_audience.as_str()]);

        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.config.jwt_secret.as_bytes()),
            &validation,
        )
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            _ => AuthError::InvalidToken,
        })
    }

    /// Resolves the `Authorization: Bearer` header into an [`AuthUser`]
    pub fn authenticate(&self, parts: &Parts) -> Result<AuthUser, AuthError> {
        let header_value = parts
            .headers
            .get(header::AUTHORIZATION)
            .ok_or(AuthError::MissingToken)?
            .to_str()
            .map_err(|_| AuthError::InvalidToken)?;

        let token = header_value
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::MissingToken)?;

        let claims = self.validate_token(token)?;
        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| AuthError::InvalidToken)?;

        Ok(AuthUser {
            user_id,
            email: claims.email,
            role: claims.role,
            token_id: claims.jti,
        })
    }
}

/// Fails with `Conflict` when `email` belongs to an account other than `owner`
pub(crate) async fn ensure_email_free(
    users: &UserRepository,
    conn: &impl ConnectionTrait,
    email: &str,
    owner: Uuid,
) -> Result<(), ServiceError> {
    match users.find_by_email(conn, email).await? {
        Some(existing) if existing.id != owner => Err(ServiceError::Conflict(format!(
            "email {} is already registered",
            email
        ))),
        _ => Ok(()),
    }
}

pub(crate) fn unique_violation_as_conflict(err: DbErr, email: &str) -> ServiceError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            ServiceError::Conflict(format!("email {} is already registered", email))
        }
        _ => ServiceError::DatabaseError(err),
    }
}

/// Hashes on the blocking pool; argon2 is deliberately slow.
pub async fn hash_password(password: String) -> Result<String, ServiceError> {
    tokio::task::spawn_blocking(move || {
        let salt = SaltString::generate(&mut rand::rngs::OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| ServiceError::HashError(e.to_string()))
    })
    .await
    .map_err(|e| ServiceError::InternalError(e.to_string()))?
}

pub async fn verify_password(password: String, hash: String) -> Result<bool, ServiceError> {
    tokio::task::spawn_blocking(move || {
        let parsed =
            PasswordHash::new(&hash).map_err(|e| ServiceError::HashError(e.to_string()))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    })
    .await
    .map_err(|e| ServiceError::InternalError(e.to_string()))?
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    Arc<AuthService>: FromRef<S>,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth_service = Arc::<AuthService>::from_ref(state);
        auth_service.authenticate(parts)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
    Arc<AuthService>: FromRef<S>,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if !user.is_admin() {
            warn!(user_id = %user.user_id, "Non-admin user attempted an admin operation");
            return Err(AuthError::InsufficientPermissions);
        }
        Ok(AdminUser(user))
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Missing token")]
    MissingToken,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token has expired")]
    TokenExpired,

    #[error("Token creation failed: {0}")]
    TokenCreation(String),

    #[error("Insufficient permissions")]
    InsufficientPermissions,

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl AuthError {
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            Self::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "AUTH_INVALID_CREDENTIALS",
                "Invalid email or password".to_string(),
            ),
            Self::MissingToken => (
                StatusCode::UNAUTHORIZED,
                "AUTH_MISSING_TOKEN",
                "No authentication token provided".to_string(),
            ),
            Self::InvalidToken => (
                StatusCode::UNAUTHORIZED,
                "AUTH_INVALID_TOKEN",
                "Invalid authentication token".to_string(),
            ),
            Self::TokenExpired => (
                StatusCode::UNAUTHORIZED,
                "AUTH_TOKEN_EXPIRED",
                "Token has expired".to_string(),
            ),
            Self::InsufficientPermissions => (
                StatusCode::FORBIDDEN,
                "AUTH_INSUFFICIENT_PERMISSIONS",
                "Admin access required".to_string(),
            ),
            Self::TokenCreation(_) | Self::InternalError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "AUTH_INTERNAL_ERROR",
                "Internal server error".to_string(),
            ),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();
        let body = ErrorResponse {
            error: status.canonical_reason().unwrap_or("Error").to_string(),
            code: code.to_string(),
            message,
            details: None,
            request_id: crate::tracing::current_request_id().map(|rid| rid.to_string()),
            timestamp: Utc::now().to_rfc3339(),
        };
        (status, Json(body)).into_response()
    }
}

impl From<AuthError> for ServiceError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InsufficientPermissions => ServiceError::Forbidden(err.to_string()),
            AuthError::TokenCreation(msg) | AuthError::InternalError(msg) => {
                ServiceError::InternalError(msg)
            }
            other => ServiceError::Unauthorized(other.to_string()),
        }
    }
}

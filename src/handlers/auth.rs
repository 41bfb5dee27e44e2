use crate::{
    auth::{
        AuthService, AuthUser, ChangePasswordRequest, LoginRequest, RegisterRequest,
        UpdateProfileRequest,
    },
    errors::ApiError,
    handlers::common::{created_response, message_response, success_response, validate_input},
    AppState,
};
use axum::{
    extract::{Json, State},
    response::IntoResponse,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/profile", get(profile).put(update_profile))
        .route("/password", put(change_password))
}

/// Register handler
pub async fn register(
    State(auth): State<Arc<AuthService>>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let user = auth.register(payload).await?;
    Ok(created_response(user))
}

/// Login handler
pub async fn login(
    State(auth): State<Arc<AuthService>>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let token = auth.login(payload).await?;
    Ok(success_response(token))
}

/// Current user's profile
pub async fn profile(
    State(auth): State<Arc<AuthService>>,
    user: AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let profile = auth.profile(user.user_id).await?;
    Ok(success_response(profile))
}

pub async fn update_profile(
    State(auth): State<Arc<AuthService>>,
    user: AuthUser,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let profile = auth.update_profile(user.user_id, payload).await?;
    Ok(success_response(profile))
}

pub async fn change_password(
    State(auth): State<Arc<AuthService>>,
    user: AuthUser,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    auth.change_password(user.user_id, payload).await?;
    Ok(message_response("Password changed successfully"))
}

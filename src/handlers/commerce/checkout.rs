use crate::handlers::common::{created_response, success_response, validate_input};
use crate::{
    auth::AuthUser, errors::ApiError, services::commerce::CheckoutRequest, AppState,
};
use axum::{
    extract::{Json, State},
    response::IntoResponse,
    routing::post,
    Router,
};

/// Creates the router for checkout endpoints
pub fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(process_checkout))
        .route("/summary", post(checkout_summary))
}

/// Quote the cart without placing an order
async fn checkout_summary(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CheckoutRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let summary = state
        .services
        .checkout
        .get_checkout_summary(user.user_id, payload)
        .await?;
    Ok(success_response(summary))
}

/// Turn the cart into a pending transaction
async fn process_checkout(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CheckoutRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let transaction = state
        .services
        .checkout
        .process_checkout(user.user_id, payload)
        .await?;
    Ok(created_response(transaction))
}

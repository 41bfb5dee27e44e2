use crate::handlers::common::{
    created_response, message_response, success_response, validate_input,
};
use crate::{
    auth::AuthUser,
    errors::ApiError,
    services::commerce::{AddToCartRequest, UpdateCartItemRequest},
    AppState,
};
use axum::{
    extract::{Json, Path, State},
    response::IntoResponse,
    routing::{get, put},
    Router,
};
use serde_json::json;
use uuid::Uuid;

/// Creates the router for cart endpoints
pub fn carts_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(get_cart).post(add_to_cart).delete(clear_cart))
        .route("/count", get(get_cart_count))
        .route(
            "/items/:product_id",
            put(update_cart_item).delete(remove_cart_item),
        )
}

/// Get the caller's cart
async fn get_cart(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let cart = state.services.cart.get_cart(user.user_id).await?;
    Ok(success_response(cart))
}

/// Add item to cart
async fn add_to_cart(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<AddToCartRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let item = state
        .services
        .cart
        .add_to_cart(user.user_id, payload)
        .await?;
    Ok(created_response(item))
}

/// Update cart item quantity
async fn update_cart_item(
    State(state): State<AppState>,
    user: AuthUser,
    Path(product_id): Path<Uuid>,
    Json(payload): Json<UpdateCartItemRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let item = state
        .services
        .cart
        .update_cart_item(user.user_id, product_id, payload)
        .await?;
    Ok(success_response(item))
}

/// Remove item from cart
async fn remove_cart_item(
    State(state): State<AppState>,
    user: AuthUser,
    Path(product_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .services
        .cart
        .remove_from_cart(user.user_id, product_id)
        .await?;
    Ok(message_response("Item removed from cart"))
}

/// Clear all items from cart
async fn clear_cart(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    state.services.cart.clear_cart(user.user_id).await?;
    Ok(message_response("Cart cleared successfully"))
}

async fn get_cart_count(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let count = state
        .services
        .cart
        .get_cart_item_count(user.user_id)
        .await?;
    Ok(success_response(json!({ "count": count })))
}

use crate::handlers::common::{
    created_response, message_response, success_response, validate_input,
};
use crate::{
    auth::AdminUser, errors::ApiError, services::commerce::CategoryRequest, AppState,
};
use axum::{
    extract::{Json, Path, State},
    response::IntoResponse,
    routing::get,
    Router,
};
use uuid::Uuid;

/// Creates the router for category endpoints
pub fn categories_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_categories).post(create_category))
        .route(
            "/:id",
            get(get_category).put(update_category).delete(delete_category),
        )
}

async fn list_categories(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let categories = state.services.product_catalog.list_categories().await?;
    Ok(success_response(categories))
}

async fn get_category(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let category = state.services.product_catalog.get_category(id).await?;
    Ok(success_response(category))
}

async fn create_category(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Json(payload): Json<CategoryRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let category = state
        .services
        .product_catalog
        .create_category(payload)
        .await?;
    Ok(created_response(category))
}

async fn update_category(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<CategoryRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let category = state
        .services
        .product_catalog
        .update_category(id, payload)
        .await?;
    Ok(success_response(category))
}

async fn delete_category(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state.services.product_catalog.delete_category(id).await?;
    Ok(message_response("Category deleted successfully"))
}

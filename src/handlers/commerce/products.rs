use crate::handlers::common::{
    created_response, message_response, paginated_response, success_response, validate_input,
};
use crate::{
    auth::AdminUser,
    errors::ApiError,
    services::commerce::{ProductListQuery, ProductRequest, PublicProductResponse},
    AppState,
};
use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
    routing::get,
    Router,
};
use uuid::Uuid;

/// Creates the router for product endpoints
pub fn products_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_products).post(create_product))
        .route(
            "/:id",
            get(get_product).put(update_product).delete(delete_product),
        )
}

/// List products, optionally filtered by category
async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ProductListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let page = state.services.product_catalog.list_products(query).await?;
    Ok(paginated_response(page.items, page.page, page.limit, page.total))
}

async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let product = state.services.product_catalog.get_product(id).await?;
    Ok(success_response(PublicProductResponse::from(product)))
}

/// Create a product (admin)
async fn create_product(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Json(payload): Json<ProductRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let product = state.services.product_catalog.create_product(payload).await?;
    Ok(created_response(product))
}

/// Replace a product (admin)
async fn update_product(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<ProductRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let product = state
        .services
        .product_catalog
        .update_product(id, payload)
        .await?;
    Ok(success_response(product))
}

async fn delete_product(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state.services.product_catalog.delete_product(id).await?;
    Ok(message_response("Product deleted successfully"))
}

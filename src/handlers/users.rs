use crate::handlers::common::{
    created_response, message_response, paginated_response, success_response, validate_input,
};
use crate::{
    auth::AdminUser,
    errors::ApiError,
    services::users::{CreateUserRequest, UpdateUserRequest, UpdateUserRoleRequest, UserListQuery},
    AppState,
};
use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
    routing::{get, put},
    Router,
};
use uuid::Uuid;

/// Back-office account routes
pub fn admin_users_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route("/:id", get(get_user).put(update_user).delete(delete_user))
        .route("/:id/role", put(update_user_role))
}

/// List accounts, optionally filtered with `?role=customer|admin`
async fn list_users(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Query(query): Query<UserListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let page = state.services.users.list_users(query).await?;
    Ok(paginated_response(page.users, page.page, page.limit, page.total))
}

async fn create_user(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Json(payload): Json<CreateUserRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let user = state.services.users.create_user(payload).await?;
    Ok(created_response(user))
}

async fn get_user(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state.services.users.get_user(id).await?;
    Ok(success_response(user))
}

async fn update_user(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let user = state.services.users.update_user(id, payload).await?;
    Ok(success_response(user))
}

async fn update_user_role(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateUserRoleRequest>,
) -> Result<impl IntoResponse, ApiError> {
    tracing::info!(admin_id = %admin.user_id, user_id = %id, role = ?payload.role, "Admin role change");
    let user = state.services.users.update_user_role(id, payload).await?;
    Ok(success_response(user))
}

async fn delete_user(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state.services.users.delete_user(admin.user_id, id).await?;
    Ok(message_response("User deleted successfully"))
}

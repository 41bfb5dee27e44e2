use crate::handlers::common::{paginated_response, success_response, validate_input};
use crate::{
    auth::{AdminUser, AuthUser},
    errors::ApiError,
    services::commerce::ConfirmPaymentRequest,
    services::transactions::{TransactionListQuery, UpdateTransactionStatusRequest},
    AppState,
};
use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
    routing::{get, post, put},
    Router,
};
use uuid::Uuid;

/// Routes for the caller's own transactions
pub fn transactions_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_my_transactions))
        .route("/:id", get(get_my_transaction))
        .route("/:id/confirm", post(confirm_payment))
}

/// Back-office transaction routes
pub fn admin_transactions_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_transactions))
        .route("/:id", get(get_transaction))
        .route("/:id/status", put(update_transaction_status))
}

async fn list_my_transactions(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let transactions = state
        .services
        .checkout
        .get_user_transactions(user.user_id)
        .await?;
    Ok(success_response(transactions))
}

async fn get_my_transaction(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let transaction = state
        .services
        .checkout
        .get_transaction_by_id(user.user_id, id)
        .await?;
    Ok(success_response(transaction))
}

/// Attach payment proof and mark the transaction paid
async fn confirm_payment(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<ConfirmPaymentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let transaction = state
        .services
        .checkout
        .confirm_payment(user.user_id, id, payload)
        .await?;
    Ok(success_response(transaction))
}

async fn list_transactions(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Query(query): Query<TransactionListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let page = state.services.transactions.list_transactions(query).await?;
    Ok(paginated_response(
        page.transactions,
        page.page,
        page.limit,
        page.total,
    ))
}

async fn get_transaction(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let transaction = state.services.transactions.get_transaction(id).await?;
    Ok(success_response(transaction))
}

async fn update_transaction_status(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateTransactionStatusRequest>,
) -> Result<impl IntoResponse, ApiError> {
    tracing::info!(admin_id = %admin.user_id, transaction_id = %id, status = %payload.status, "Admin status update");
    let transaction = state
        .services
        .transactions
        .update_transaction_status(id, payload)
        .await?;
    Ok(success_response(transaction))
}

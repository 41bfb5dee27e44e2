use crate::{errors::ApiError, tracing::current_request_id};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Envelope wrapped around every successful response body
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ResponseMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<PaginationMeta>,
}

impl ResponseMeta {
    fn now(pagination: Option<PaginationMeta>) -> Self {
        Self {
            request_id: current_request_id().map(|id| id.as_str().to_string()),
            timestamp: chrono::Utc::now().to_rfc3339(),
            pagination,
        }
    }
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            meta: ResponseMeta::now(None),
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_pagination(mut self, pagination: PaginationMeta) -> Self {
        self.meta.pagination = Some(pagination);
        self
    }
}

impl ApiResponse<()> {
    pub fn message_only(message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: None,
            message: Some(message.into()),
            meta: ResponseMeta::now(None),
        }
    }
}

/// Standard success response
pub fn success_response<T: Serialize>(data: T) -> Response {
    (StatusCode::OK, Json(ApiResponse::ok(data))).into_response()
}

/// Standard created response
pub fn created_response<T: Serialize>(data: T) -> Response {
    (StatusCode::CREATED, Json(ApiResponse::ok(data))).into_response()
}

/// Success with a human-readable message and no payload
pub fn message_response(message: &str) -> Response {
    (StatusCode::OK, Json(ApiResponse::message_only(message))).into_response()
}

/// Page of results with pagination metadata
pub fn paginated_response<T: Serialize>(data: Vec<T>, page: u64, limit: u64, total: u64) -> Response {
    let body = ApiResponse::ok(data).with_pagination(PaginationMeta::new(page, limit, total));
    (StatusCode::OK, Json(body)).into_response()
}

/// Standard no content response
pub fn no_content_response() -> Response {
    StatusCode::NO_CONTENT.into_response()
}

/// Validate request input
pub fn validate_input<T: Validate>(input: &T) -> Result<(), ApiError> {
    input
        .validate()
        .map_err(|e| ApiError::ValidationError(format!("Validation failed: {}", e)))
}

/// Standard pagination response metadata
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PaginationMeta {
    pub page: u64,
    pub limit: u64,
    pub total: u64,
    pub total_pages: u64,
}

impl PaginationMeta {
    pub fn new(page: u64, limit: u64, total: u64) -> Self {
        let total_pages = if total == 0 || limit == 0 {
            0
        } else {
            (total + limit - 1) / limit
        };
        Self {
            page,
            limit,
            total,
            total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_meta_rounds_pages_up() {
        assert_eq!(PaginationMeta::new(1, 10, 0).total_pages, 0);
        assert_eq!(PaginationMeta::new(1, 10, 10).total_pages, 1);
        assert_eq!(PaginationMeta::new(2, 10, 11).total_pages, 2);
    }

    #[test]
    fn envelope_marks_success() {
        let body = serde_json::to_value(ApiResponse::ok(5).with_message("done")).unwrap();
        assert_eq!(body["success"], true);
        assert_eq!(body["data"], 5);
        assert_eq!(body["message"], "done");
        assert!(body["meta"]["timestamp"].is_string());
    }
}

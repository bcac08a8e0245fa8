//! Shared API response types and error conversion.
//!
//! Provides the standard response envelope used by every endpoint, the page
//! envelope for list endpoints, and conversion between service-layer errors
//! and HTTP responses.
//!
//! # Response Format
//! All responses use a consistent JSON envelope:
//! - `success`: whether the request was processed
//! - `message`: human-readable message
//! - `data`: payload on success, null (or a field -> message map for
//!   validation failures) on error
//! - `timestamp`: RFC 3339 time the response was produced

use crate::errors::ServiceError;
use axum::Json;
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use validator::Validate;

/// Standard API response wrapper for all endpoints
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: String,
    pub data: Option<T>,
    pub timestamp: String,
}

impl<T> ApiResponse<T> {
    /// Create a successful response
    pub fn success(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Create a successful response with default message
    pub fn ok(data: T) -> Self {
        Self::success(data, "Request successful")
    }
}

impl ApiResponse<serde_json::Value> {
    /// Create an error response with no payload
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Create an error response carrying a field -> message map
    pub fn error_with_fields(
        message: impl Into<String>,
        fields: HashMap<String, String>,
    ) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: Some(serde_json::json!(fields)),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Error half of every handler result.
pub type ApiError = (StatusCode, Json<ApiResponse<serde_json::Value>>);

/// Page envelope for list responses
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResponse<T> {
    pub content: Vec<T>,
    pub page_number: u32,
    pub page_size: u32,
    pub total_elements: u64,
    pub total_pages: u32,
    pub first: bool,
    pub last: bool,
    pub empty: bool,
}

impl<T> PageResponse<T> {
    /// Build the envelope from a page of content and the total match count.
    /// Page numbers are 0-indexed.
    pub fn new(content: Vec<T>, page_number: u32, page_size: u32, total_elements: u64) -> Self {
        let total_pages = if total_elements == 0 {
            0
        } else {
            ((total_elements - 1) / page_size as u64 + 1) as u32
        };

        Self {
            page_number,
            page_size,
            total_elements,
            total_pages,
            first: page_number == 0,
            last: page_number + 1 >= total_pages,
            empty: content.is_empty(),
            content,
        }
    }
}

/// Converts ServiceError to the matching HTTP status and response envelope
pub fn service_error_to_http(error: ServiceError) -> ApiError {
    let (status, body) = match error {
        ServiceError::Validation { message } => {
            (StatusCode::BAD_REQUEST, ApiResponse::error(message))
        }
        ServiceError::ValidationFields { message, fields } => (
            StatusCode::BAD_REQUEST,
            ApiResponse::error_with_fields(message, fields),
        ),
        ServiceError::Unauthorized { message } => {
            (StatusCode::UNAUTHORIZED, ApiResponse::error(message))
        }
        ServiceError::Forbidden { message } => (StatusCode::FORBIDDEN, ApiResponse::error(message)),
        ServiceError::NotFound { entity, identifier } => (
            StatusCode::NOT_FOUND,
            ApiResponse::error(format!("{entity} '{identifier}' not found")),
        ),
        ServiceError::AlreadyExists { entity, identifier } => (
            StatusCode::CONFLICT,
            ApiResponse::error(format!("{entity} '{identifier}' already exists")),
        ),
        ServiceError::InsufficientStock { message } => {
            (StatusCode::BAD_REQUEST, ApiResponse::error(message))
        }
        ServiceError::Database { source } => {
            tracing::error!("Database error: {}", source);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiResponse::error("Internal server error"),
            )
        }
        ServiceError::InternalError { message } => {
            tracing::error!("Internal error: {}", message);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiResponse::error("Internal server error"),
            )
        }
    };

    (status, Json(body))
}

/// Runs derive-based validation on a request payload, collecting failures
/// into a field -> message map instead of bailing on the first error.
pub fn validate_payload<T: Validate>(payload: &T) -> Result<(), ServiceError> {
    payload.validate().map_err(|errors| {
        ServiceError::validation_fields("Invalid request data", validation_errors_to_map(errors))
    })
}

/// Formats validator::ValidationErrors into a field -> message map
pub fn validation_errors_to_map(errors: validator::ValidationErrors) -> HashMap<String, String> {
    errors
        .field_errors()
        .into_iter()
        .map(|(field, errors)| {
            let message = errors
                .first()
                .and_then(|error| error.message.as_ref())
                .map(|message| message.to_string())
                .unwrap_or_else(|| "Invalid value".to_string());
            (field.to_string(), message)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_envelope_math() {
        let page = PageResponse::new(vec![1, 2, 3], 0, 10, 3);
        assert_eq!(page.total_pages, 1);
        assert!(page.first);
        assert!(page.last);
        assert!(!page.empty);

        // Middle page of 25 elements at size 10
        let page = PageResponse::new(vec![0; 10], 1, 10, 25);
        assert_eq!(page.total_pages, 3);
        assert!(!page.first);
        assert!(!page.last);

        // Last, partially filled page
        let page = PageResponse::new(vec![0; 5], 2, 10, 25);
        assert!(page.last);
        assert!(!page.first);
    }

    #[test]
    fn empty_result_set_has_zero_pages() {
        let page: PageResponse<i32> = PageResponse::new(vec![], 0, 10, 0);
        assert_eq!(page.total_pages, 0);
        assert!(page.first);
        assert!(page.last);
        assert!(page.empty);
    }

    #[test]
    fn error_envelope_carries_field_map() {
        let mut fields = HashMap::new();
        fields.insert("title".to_string(), "Title is required".to_string());

        let response = ApiResponse::error_with_fields("Invalid request data", fields);
        assert!(!response.success);
        assert_eq!(response.data.unwrap()["title"], "Title is required");
    }
}

//! Handler functions for book catalog API endpoints.
//!
//! These functions process requests for catalog data, delegate to the book
//! service and wrap results in the standard response envelope.

use crate::AppState;
use crate::api::book::models::{
    BookListResponse, BookRequest, BookResponse, SearchParams, StockParams,
};
use crate::api::common::{ApiError, ApiResponse, PageResponse, service_error_to_http};
use crate::errors::ServiceError;
use crate::services::book_filter::{BookFilterParams, PageParams};
use crate::services::book_service::BookService;
use axum::{
    extract::{Extension, Json, Path, Query},
    http::StatusCode,
    response::Json as ResponseJson,
};

#[axum::debug_handler]
pub async fn get_all_books(
    Extension(state): Extension<AppState>,
    Query(page): Query<PageParams>,
) -> Result<ResponseJson<ApiResponse<PageResponse<BookListResponse>>>, ApiError> {
    let service = BookService::new(&state.pool);

    match service.get_all_books(page).await {
        Ok(result) => Ok(ResponseJson(ApiResponse::ok(result))),
        Err(error) => Err(service_error_to_http(error)),
    }
}

#[axum::debug_handler]
pub async fn get_book_by_id(
    Extension(state): Extension<AppState>,
    Path(id): Path<i64>,
) -> Result<ResponseJson<ApiResponse<BookResponse>>, ApiError> {
    let service = BookService::new(&state.pool);

    match service.get_book_by_id(id).await {
        Ok(book) => Ok(ResponseJson(ApiResponse::ok(book))),
        Err(error) => Err(service_error_to_http(error)),
    }
}

#[axum::debug_handler]
pub async fn create_book(
    Extension(state): Extension<AppState>,
    Json(payload): Json<BookRequest>,
) -> Result<(StatusCode, ResponseJson<ApiResponse<BookResponse>>), ApiError> {
    let service = BookService::new(&state.pool);

    match service.create_book(payload).await {
        Ok(book) => Ok((
            StatusCode::CREATED,
            ResponseJson(ApiResponse::success(book, "Book registered")),
        )),
        Err(error) => Err(service_error_to_http(error)),
    }
}

#[axum::debug_handler]
pub async fn update_book(
    Extension(state): Extension<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<BookRequest>,
) -> Result<ResponseJson<ApiResponse<BookResponse>>, ApiError> {
    let service = BookService::new(&state.pool);

    match service.update_book(id, payload).await {
        Ok(book) => Ok(ResponseJson(ApiResponse::success(book, "Book updated"))),
        Err(error) => Err(service_error_to_http(error)),
    }
}

#[axum::debug_handler]
pub async fn delete_book(
    Extension(state): Extension<AppState>,
    Path(id): Path<i64>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    let service = BookService::new(&state.pool);

    match service.delete_book(id).await {
        Ok(()) => Ok(ResponseJson(ApiResponse::success((), "Book deleted"))),
        Err(error) => Err(service_error_to_http(error)),
    }
}

#[axum::debug_handler]
pub async fn search_books(
    Extension(state): Extension<AppState>,
    Query(params): Query<SearchParams>,
    Query(page): Query<PageParams>,
) -> Result<ResponseJson<ApiResponse<PageResponse<BookListResponse>>>, ApiError> {
    let service = BookService::new(&state.pool);
    let keyword = params.keyword.unwrap_or_default();

    match service.search_books(&keyword, page).await {
        Ok(result) => {
            let message = if result.total_elements > 0 {
                "Search results found"
            } else {
                "No search results"
            };
            Ok(ResponseJson(ApiResponse::success(result, message)))
        }
        Err(error) => Err(service_error_to_http(error)),
    }
}

#[axum::debug_handler]
pub async fn get_books_by_category(
    Extension(state): Extension<AppState>,
    Path(category_id): Path<i64>,
    Query(page): Query<PageParams>,
) -> Result<ResponseJson<ApiResponse<PageResponse<BookListResponse>>>, ApiError> {
    let service = BookService::new(&state.pool);

    match service.get_books_by_category(category_id, page).await {
        Ok(result) => Ok(ResponseJson(ApiResponse::ok(result))),
        Err(error) => Err(service_error_to_http(error)),
    }
}

#[axum::debug_handler]
pub async fn filter_books(
    Extension(state): Extension<AppState>,
    Query(filter): Query<BookFilterParams>,
    Query(page): Query<PageParams>,
) -> Result<ResponseJson<ApiResponse<PageResponse<BookListResponse>>>, ApiError> {
    let service = BookService::new(&state.pool);

    match service.filter_books(filter, page, &state.sort_fields).await {
        Ok(result) => {
            let message = if result.total_elements > 0 {
                format!("Found {} books", result.total_elements)
            } else {
                "No books match the filter".to_string()
            };
            Ok(ResponseJson(ApiResponse::success(result, message)))
        }
        Err(error) => Err(service_error_to_http(error)),
    }
}

#[axum::debug_handler]
pub async fn get_bestsellers(
    Extension(state): Extension<AppState>,
) -> Result<ResponseJson<ApiResponse<Vec<BookListResponse>>>, ApiError> {
    let service = BookService::new(&state.pool);

    match service.get_bestsellers().await {
        Ok(result) => Ok(ResponseJson(ApiResponse::ok(result))),
        Err(error) => Err(service_error_to_http(error)),
    }
}

#[axum::debug_handler]
pub async fn get_latest_books(
    Extension(state): Extension<AppState>,
) -> Result<ResponseJson<ApiResponse<Vec<BookListResponse>>>, ApiError> {
    let service = BookService::new(&state.pool);

    match service.get_latest_books().await {
        Ok(result) => Ok(ResponseJson(ApiResponse::ok(result))),
        Err(error) => Err(service_error_to_http(error)),
    }
}

#[axum::debug_handler]
pub async fn update_book_stock(
    Extension(state): Extension<AppState>,
    Path(id): Path<i64>,
    Query(params): Query<StockParams>,
) -> Result<ResponseJson<ApiResponse<BookResponse>>, ApiError> {
    let quantity = require_quantity(params)?;
    let service = BookService::new(&state.pool);

    match service.update_stock(id, quantity).await {
        Ok(book) => Ok(ResponseJson(ApiResponse::success(book, "Stock updated"))),
        Err(error) => Err(service_error_to_http(error)),
    }
}

#[axum::debug_handler]
pub async fn increase_book_stock(
    Extension(state): Extension<AppState>,
    Path(id): Path<i64>,
    Query(params): Query<StockParams>,
) -> Result<ResponseJson<ApiResponse<BookResponse>>, ApiError> {
    let quantity = require_quantity(params)?;
    let service = BookService::new(&state.pool);

    match service.increase_stock(id, quantity).await {
        Ok(book) => Ok(ResponseJson(ApiResponse::success(book, "Stock increased"))),
        Err(error) => Err(service_error_to_http(error)),
    }
}

#[axum::debug_handler]
pub async fn decrease_book_stock(
    Extension(state): Extension<AppState>,
    Path(id): Path<i64>,
    Query(params): Query<StockParams>,
) -> Result<ResponseJson<ApiResponse<BookResponse>>, ApiError> {
    let quantity = require_quantity(params)?;
    let service = BookService::new(&state.pool);

    match service.decrease_stock(id, quantity).await {
        Ok(book) => Ok(ResponseJson(ApiResponse::success(book, "Stock decreased"))),
        Err(error) => Err(service_error_to_http(error)),
    }
}

fn require_quantity(params: StockParams) -> Result<i64, ApiError> {
    params.quantity.ok_or_else(|| {
        service_error_to_http(ServiceError::validation("Quantity parameter is required"))
    })
}

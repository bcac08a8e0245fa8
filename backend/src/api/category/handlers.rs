//! Handler functions for category API endpoints.

use crate::AppState;
use crate::api::category::models::{CategoryRequest, CategoryResponse, CategorySearchParams};
use crate::api::common::{ApiError, ApiResponse, service_error_to_http};
use crate::services::category_service::CategoryService;
use axum::{
    extract::{Extension, Json, Path, Query},
    http::StatusCode,
    response::Json as ResponseJson,
};

#[axum::debug_handler]
pub async fn get_all_categories(
    Extension(state): Extension<AppState>,
) -> Result<ResponseJson<ApiResponse<Vec<CategoryResponse>>>, ApiError> {
    let service = CategoryService::new(&state.pool);

    match service.get_all_categories().await {
        Ok(categories) => Ok(ResponseJson(ApiResponse::ok(categories))),
        Err(error) => Err(service_error_to_http(error)),
    }
}

#[axum::debug_handler]
pub async fn get_category_by_id(
    Extension(state): Extension<AppState>,
    Path(id): Path<i64>,
) -> Result<ResponseJson<ApiResponse<CategoryResponse>>, ApiError> {
    let service = CategoryService::new(&state.pool);

    match service.get_category_by_id(id).await {
        Ok(category) => Ok(ResponseJson(ApiResponse::ok(category))),
        Err(error) => Err(service_error_to_http(error)),
    }
}

#[axum::debug_handler]
pub async fn search_categories(
    Extension(state): Extension<AppState>,
    Query(params): Query<CategorySearchParams>,
) -> Result<ResponseJson<ApiResponse<Vec<CategoryResponse>>>, ApiError> {
    let service = CategoryService::new(&state.pool);
    let name = params.name.unwrap_or_default();

    match service.search_categories(&name).await {
        Ok(categories) => Ok(ResponseJson(ApiResponse::ok(categories))),
        Err(error) => Err(service_error_to_http(error)),
    }
}

#[axum::debug_handler]
pub async fn create_category(
    Extension(state): Extension<AppState>,
    Json(payload): Json<CategoryRequest>,
) -> Result<(StatusCode, ResponseJson<ApiResponse<CategoryResponse>>), ApiError> {
    let service = CategoryService::new(&state.pool);

    match service.create_category(payload).await {
        Ok(category) => Ok((
            StatusCode::CREATED,
            ResponseJson(ApiResponse::success(category, "Category created")),
        )),
        Err(error) => Err(service_error_to_http(error)),
    }
}

#[axum::debug_handler]
pub async fn update_category(
    Extension(state): Extension<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<CategoryRequest>,
) -> Result<ResponseJson<ApiResponse<CategoryResponse>>, ApiError> {
    let service = CategoryService::new(&state.pool);

    match service.update_category(id, payload).await {
        Ok(category) => Ok(ResponseJson(ApiResponse::success(
            category,
            "Category updated",
        ))),
        Err(error) => Err(service_error_to_http(error)),
    }
}

#[axum::debug_handler]
pub async fn delete_category(
    Extension(state): Extension<AppState>,
    Path(id): Path<i64>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    let service = CategoryService::new(&state.pool);

    match service.delete_category(id).await {
        Ok(()) => Ok(ResponseJson(ApiResponse::success((), "Category deleted"))),
        Err(error) => Err(service_error_to_http(error)),
    }
}

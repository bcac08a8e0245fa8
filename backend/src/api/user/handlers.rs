//! Handler functions for user profile API endpoints.
//!
//! These endpoints are self-service: the target user is always the
//! authenticated identity attached by the auth gate.

use crate::AppState;
use crate::api::common::{ApiError, ApiResponse, service_error_to_http};
use crate::api::user::models::{UpdateUserRequest, UserResponse};
use crate::auth::middleware::AuthIdentity;
use crate::services::user_service::UserService;
use axum::{
    extract::{Extension, Json},
    response::Json as ResponseJson,
};

#[axum::debug_handler]
pub async fn get_profile(
    Extension(state): Extension<AppState>,
    Extension(identity): Extension<AuthIdentity>,
) -> Result<ResponseJson<ApiResponse<UserResponse>>, ApiError> {
    let service = UserService::new(&state.pool);

    match service.get_user_required(identity.user_id).await {
        Ok(user) => Ok(ResponseJson(ApiResponse::ok(UserResponse::from(user)))),
        Err(error) => Err(service_error_to_http(error)),
    }
}

#[axum::debug_handler]
pub async fn update_profile(
    Extension(state): Extension<AppState>,
    Extension(identity): Extension<AuthIdentity>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<ResponseJson<ApiResponse<UserResponse>>, ApiError> {
    let service = UserService::new(&state.pool);

    match service.update_profile(identity.user_id, payload).await {
        Ok(user) => Ok(ResponseJson(ApiResponse::success(
            UserResponse::from(user),
            "Profile updated",
        ))),
        Err(error) => Err(service_error_to_http(error)),
    }
}

//! Handler functions for authentication-related API endpoints.
//!
//! These functions process incoming HTTP requests for user authentication
//! (registration, login, token refresh, availability checks), parse request
//! data and interact with the `auth::service` for core business logic.

use crate::AppState;
use crate::api::common::{ApiError, ApiResponse, service_error_to_http};
use crate::api::user::models::UserResponse;
use crate::auth::middleware::AuthIdentity;
use crate::auth::models::*;
use crate::auth::service::AuthService;
use crate::errors::ServiceError;
use axum::{
    extract::{Extension, Json},
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    response::Json as ResponseJson,
};
use tracing::info;

/// Handle user registration request
#[axum::debug_handler]
pub async fn register(
    Extension(state): Extension<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, ResponseJson<ApiResponse<UserResponse>>), ApiError> {
    let service = AuthService::new(&state.pool, state.jwt.clone());

    match service.register(payload).await {
        Ok(user) => Ok((
            StatusCode::CREATED,
            ResponseJson(ApiResponse::success(user, "Registration completed")),
        )),
        Err(error) => Err(service_error_to_http(error)),
    }
}

/// Handle user login request
#[axum::debug_handler]
pub async fn login(
    Extension(state): Extension<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<ResponseJson<ApiResponse<AuthResponse>>, ApiError> {
    let service = AuthService::new(&state.pool, state.jwt.clone());

    match service.login(payload).await {
        Ok(response) => Ok(ResponseJson(ApiResponse::success(
            response,
            "Login succeeded",
        ))),
        Err(error) => Err(service_error_to_http(error)),
    }
}

/// Handle token refresh request
#[axum::debug_handler]
pub async fn refresh_token(
    Extension(state): Extension<AppState>,
    Json(payload): Json<RefreshTokenRequest>,
) -> Result<ResponseJson<ApiResponse<AuthResponse>>, ApiError> {
    if payload.refresh_token.trim().is_empty() {
        return Err(service_error_to_http(ServiceError::validation(
            "Refresh token is required",
        )));
    }

    let service = AuthService::new(&state.pool, state.jwt.clone());

    match service.refresh(&payload.refresh_token).await {
        Ok(response) => Ok(ResponseJson(ApiResponse::success(
            response,
            "Token pair reissued",
        ))),
        Err(error) => Err(service_error_to_http(error)),
    }
}

/// Handle logout request. Tokens are stateless, so this only acknowledges
/// the request; outstanding tokens expire on their own.
#[axum::debug_handler]
pub async fn logout(
    Extension(state): Extension<AppState>,
    headers: HeaderMap,
) -> ResponseJson<ApiResponse<()>> {
    let header = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    if let Some(token) = crate::utils::jwt::resolve_bearer(header) {
        if let Some(username) = state.jwt.username_of(token) {
            info!("User logged out - username: {}", username);
        }
    }

    ResponseJson(ApiResponse::success((), "Logged out"))
}

/// Handle username availability check
#[axum::debug_handler]
pub async fn check_username(
    Extension(state): Extension<AppState>,
    Json(payload): Json<CheckUsernameRequest>,
) -> Result<ResponseJson<ApiResponse<bool>>, ApiError> {
    let Some(username) = payload
        .username
        .as_deref()
        .map(str::trim)
        .filter(|u| !u.is_empty())
    else {
        return Err(service_error_to_http(ServiceError::validation(
            "Username is required",
        )));
    };

    let service = crate::services::user_service::UserService::new(&state.pool);

    match service.exists_by_username(username).await {
        Ok(exists) => {
            let available = !exists;
            let message = if available {
                "Username is available"
            } else {
                "Username is already taken"
            };
            Ok(ResponseJson(ApiResponse::success(available, message)))
        }
        Err(error) => Err(service_error_to_http(error)),
    }
}

/// Handle email availability check
#[axum::debug_handler]
pub async fn check_email(
    Extension(state): Extension<AppState>,
    Json(payload): Json<CheckEmailRequest>,
) -> Result<ResponseJson<ApiResponse<bool>>, ApiError> {
    let Some(email) = payload
        .email
        .as_deref()
        .map(str::trim)
        .filter(|e| !e.is_empty())
    else {
        return Err(service_error_to_http(ServiceError::validation(
            "Email is required",
        )));
    };

    if !email.contains('@') || !email.contains('.') {
        return Err(service_error_to_http(ServiceError::validation(
            "Invalid email format",
        )));
    }

    let service = crate::services::user_service::UserService::new(&state.pool);

    match service.exists_by_email(email).await {
        Ok(exists) => {
            let available = !exists;
            let message = if available {
                "Email is available"
            } else {
                "Email is already in use"
            };
            Ok(ResponseJson(ApiResponse::success(available, message)))
        }
        Err(error) => Err(service_error_to_http(error)),
    }
}

/// Handle current-user lookup
#[axum::debug_handler]
pub async fn me(
    Extension(state): Extension<AppState>,
    Extension(identity): Extension<AuthIdentity>,
) -> Result<ResponseJson<ApiResponse<UserResponse>>, ApiError> {
    let service = AuthService::new(&state.pool, state.jwt.clone());

    match service.current_user(identity.user_id).await {
        Ok(user) => Ok(ResponseJson(ApiResponse::ok(user))),
        Err(error) => Err(service_error_to_http(error)),
    }
}

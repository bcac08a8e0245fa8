//! Data structures for authentication-related entities.
//!
//! This module defines the request and response payloads for registration,
//! login, token refresh and credential availability checks.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::api::user::models::UserResponse;

/// Registration request payload
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 3, max = 50, message = "Username must be between 3-50 characters"))]
    pub username: String,

    #[validate(email(message = "Must be a valid email"))]
    pub email: String,

    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
}

/// Login request payload
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Login and refresh response containing the rotated token pair
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    /// Access token expiration in seconds
    pub expires_in: i64,
    pub user: UserResponse,
}

/// Token refresh request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RefreshTokenRequest {
    #[validate(length(min = 1, message = "Refresh token is required"))]
    pub refresh_token: String,
}

/// Username availability check request
#[derive(Debug, Deserialize)]
pub struct CheckUsernameRequest {
    pub username: Option<String>,
}

/// Email availability check request
#[derive(Debug, Deserialize)]
pub struct CheckEmailRequest {
    pub email: Option<String>,
}

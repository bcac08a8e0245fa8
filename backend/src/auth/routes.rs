//! Defines the HTTP routes specifically for authentication.
//!
//! These routes handle user registration, login, token refreshing and
//! credential availability checks. They are designed to be integrated into
//! the main Axum router.

use crate::auth::handlers::*;
use crate::auth::middleware::{require_auth, require_live_user};
use axum::{
    Router, middleware,
    routing::{get, post},
};
use tower::ServiceBuilder;

/// Creates the authentication router with all auth-related routes
pub fn auth_router() -> Router {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/refresh", post(refresh_token))
        .route("/logout", post(logout))
        .route("/check-username", post(check_username))
        .route("/check-email", post(check_email))
        .route(
            "/me",
            get(me).layer(
                ServiceBuilder::new()
                    .layer(middleware::from_fn(require_auth))
                    .layer(middleware::from_fn(require_live_user)),
            ),
        )
}

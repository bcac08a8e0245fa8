//! Defines the HTTP routes for user profile self-service.

use super::handlers::{get_profile, update_profile};
use crate::auth::middleware::{require_auth, require_live_user};
use axum::{Router, middleware, routing::get};
use tower::ServiceBuilder;

pub fn user_router() -> Router {
    Router::new()
        .route("/profile", get(get_profile).put(update_profile))
        .layer(
            ServiceBuilder::new()
                .layer(middleware::from_fn(require_auth))
                .layer(middleware::from_fn(require_live_user)),
        )
}

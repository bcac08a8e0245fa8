//! Defines the HTTP routes for category management.
//!
//! Reads are public; writes pass the admin gate chain.

use super::handlers::*;
use crate::auth::middleware::{require_admin, require_auth, require_live_user};
use axum::{
    Router, middleware,
    routing::{get, post, put},
};
use tower::ServiceBuilder;

pub fn category_router() -> Router {
    let admin_gate = || {
        ServiceBuilder::new()
            .layer(middleware::from_fn(require_auth))
            .layer(middleware::from_fn(require_admin))
            .layer(middleware::from_fn(require_live_user))
    };

    Router::new()
        .route(
            "/",
            get(get_all_categories).merge(post(create_category).layer(admin_gate())),
        )
        .route("/search", get(search_categories))
        .route(
            "/{id}",
            get(get_category_by_id)
                .merge(put(update_category).delete(delete_category).layer(admin_gate())),
        )
}

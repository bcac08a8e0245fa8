//! Defines the HTTP routes for the book catalog.
//!
//! Read-only catalog endpoints are public; every mutation passes the
//! authenticate -> admin-role -> liveness gate chain.

use super::handlers::*;
use crate::auth::middleware::{require_admin, require_auth, require_live_user};
use axum::{
    Router, middleware,
    routing::{get, post, put},
};
use tower::ServiceBuilder;

pub fn book_router() -> Router {
    let admin_gate = || {
        ServiceBuilder::new()
            .layer(middleware::from_fn(require_auth))
            .layer(middleware::from_fn(require_admin))
            .layer(middleware::from_fn(require_live_user))
    };

    Router::new()
        .route(
            "/",
            get(get_all_books).merge(post(create_book).layer(admin_gate())),
        )
        .route("/search", get(search_books))
        .route("/filter", get(filter_books))
        .route("/bestsellers", get(get_bestsellers))
        .route("/latest", get(get_latest_books))
        .route("/category/{category_id}", get(get_books_by_category))
        .route(
            "/{id}",
            get(get_book_by_id)
                .merge(put(update_book).delete(delete_book).layer(admin_gate())),
        )
        .route("/{id}/stock", put(update_book_stock).layer(admin_gate()))
        .route(
            "/{id}/stock/increase",
            post(increase_book_stock).layer(admin_gate()),
        )
        .route(
            "/{id}/stock/decrease",
            post(decrease_book_stock).layer(admin_gate()),
        )
}

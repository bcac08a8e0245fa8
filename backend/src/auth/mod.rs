//! Authentication and authorization module.
//!
//! Contains the request gate middleware, auth endpoints and the service
//! coordinating registration, login and token rotation.

pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod service;

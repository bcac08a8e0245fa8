//! Module for core business logic services.
//!
//! This module encapsulates services that perform specific business
//! operations and orchestrate interactions between repositories, such as
//! catalog management and query planning.

pub mod book_filter;
pub mod book_service;
pub mod category_service;
pub mod user_service;

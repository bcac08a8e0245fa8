//! Data transfer objects for category endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::database::models::CategoryWithCount;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CategoryRequest {
    #[validate(length(min = 2, max = 50, message = "Name must be between 2-50 characters"))]
    pub name: String,

    #[validate(length(max = 200, message = "Description cannot exceed 200 characters"))]
    pub description: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryResponse {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub book_count: i64,
    pub created_at: DateTime<Utc>,
}

impl From<CategoryWithCount> for CategoryResponse {
    fn from(row: CategoryWithCount) -> Self {
        Self {
            id: row.id,
            name: row.name,
            description: row.description,
            book_count: row.book_count,
            created_at: row.created_at,
        }
    }
}

/// Query parameters of the category search endpoint.
#[derive(Debug, Deserialize)]
pub struct CategorySearchParams {
    pub name: Option<String>,
}

//! Database repository for category management operations.
//!
//! Categories never hold an in-memory list of their books; the book count on
//! read models comes from a join at query time.

use crate::database::models::{Category, CategoryWithCount};
use anyhow::Result;
use chrono::Utc;
use sqlx::SqlitePool;

const CATEGORY_COLUMNS: &str = "id, name, description, created_at, updated_at";

const COUNTED_SELECT: &str = "SELECT c.id, c.name, c.description, \
     COUNT(b.id) AS book_count, c.created_at, c.updated_at \
     FROM categories c LEFT JOIN books b ON b.category_id = c.id";

/// Repository for category database operations.
pub struct CategoryRepository<'a> {
    /// Shared SQLite connection pool
    pool: &'a SqlitePool,
}

impl<'a> CategoryRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn insert(&self, name: &str, description: Option<&str>) -> Result<Category> {
        let category = sqlx::query_as::<_, Category>(&format!(
            r#"
            INSERT INTO categories (name, description, created_at)
            VALUES (?, ?, ?)
            RETURNING {CATEGORY_COLUMNS}
            "#
        ))
        .bind(name)
        .bind(description)
        .bind(Utc::now())
        .fetch_one(self.pool)
        .await?;

        Ok(category)
    }

    pub async fn update(
        &self,
        id: i64,
        name: &str,
        description: Option<&str>,
    ) -> Result<Category> {
        let category = sqlx::query_as::<_, Category>(&format!(
            r#"
            UPDATE categories SET name = ?, description = ?, updated_at = ?
            WHERE id = ?
            RETURNING {CATEGORY_COLUMNS}
            "#
        ))
        .bind(name)
        .bind(description)
        .bind(Utc::now())
        .bind(id)
        .fetch_one(self.pool)
        .await?;

        Ok(category)
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        sqlx::query("DELETE FROM categories WHERE id = ?")
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(())
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<Category>> {
        let category = sqlx::query_as::<_, Category>(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(category)
    }

    /// Retrieves all categories with their book counts, ordered by name.
    pub async fn find_all_with_counts(&self) -> Result<Vec<CategoryWithCount>> {
        let rows = sqlx::query_as::<_, CategoryWithCount>(&format!(
            "{COUNTED_SELECT} GROUP BY c.id ORDER BY c.name ASC"
        ))
        .fetch_all(self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn find_by_id_with_count(&self, id: i64) -> Result<Option<CategoryWithCount>> {
        let row = sqlx::query_as::<_, CategoryWithCount>(&format!(
            "{COUNTED_SELECT} WHERE c.id = ? GROUP BY c.id"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row)
    }

    /// Case-insensitive substring search on the category name.
    pub async fn search_with_counts(&self, name: &str) -> Result<Vec<CategoryWithCount>> {
        let rows = sqlx::query_as::<_, CategoryWithCount>(&format!(
            "{COUNTED_SELECT} WHERE LOWER(c.name) LIKE ? GROUP BY c.id ORDER BY c.name ASC"
        ))
        .bind(format!("%{}%", name.to_lowercase()))
        .fetch_all(self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn name_exists(&self, name: &str) -> Result<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM categories WHERE name = ?")
            .bind(name)
            .fetch_one(self.pool)
            .await?;

        Ok(count > 0)
    }

    pub async fn name_exists_excluding(&self, name: &str, exclude_id: i64) -> Result<bool> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM categories WHERE name = ? AND id != ?")
                .bind(name)
                .bind(exclude_id)
                .fetch_one(self.pool)
                .await?;

        Ok(count > 0)
    }
}

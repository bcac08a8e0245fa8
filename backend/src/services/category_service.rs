//! Category business logic service.

use crate::api::category::models::{CategoryRequest, CategoryResponse};
use crate::api::common::validate_payload;
use crate::errors::{ServiceError, ServiceResult};
use crate::repositories::book_repository::BookRepository;
use crate::repositories::category_repository::CategoryRepository;
use sqlx::SqlitePool;
use tracing::info;

pub struct CategoryService<'a> {
    /// Shared database connection pool
    pool: &'a SqlitePool,
}

impl<'a> CategoryService<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn get_all_categories(&self) -> ServiceResult<Vec<CategoryResponse>> {
        let rows = CategoryRepository::new(self.pool).find_all_with_counts().await?;
        Ok(rows.into_iter().map(CategoryResponse::from).collect())
    }

    pub async fn get_category_by_id(&self, id: i64) -> ServiceResult<CategoryResponse> {
        let row = CategoryRepository::new(self.pool)
            .find_by_id_with_count(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Category", id.to_string()))?;

        Ok(CategoryResponse::from(row))
    }

    pub async fn create_category(&self, request: CategoryRequest) -> ServiceResult<CategoryResponse> {
        validate_payload(&request)?;

        let name = request.name.trim().to_string();
        let description = normalize_description(request.description.as_deref());
        let repo = CategoryRepository::new(self.pool);

        if repo.name_exists(&name).await? {
            return Err(ServiceError::already_exists("Category", &name));
        }

        let category = repo.insert(&name, description.as_deref()).await?;

        info!("Created category - id: {}, name: '{}'", category.id, category.name);

        self.get_category_by_id(category.id).await
    }

    pub async fn update_category(
        &self,
        id: i64,
        request: CategoryRequest,
    ) -> ServiceResult<CategoryResponse> {
        validate_payload(&request)?;

        let repo = CategoryRepository::new(self.pool);
        let existing = repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Category", id.to_string()))?;

        let name = request.name.trim().to_string();
        let description = normalize_description(request.description.as_deref());

        if name != existing.name && repo.name_exists_excluding(&name, id).await? {
            return Err(ServiceError::already_exists("Category", &name));
        }

        let category = repo.update(id, &name, description.as_deref()).await?;

        info!("Updated category - id: {}, name: '{}'", category.id, category.name);

        self.get_category_by_id(category.id).await
    }

    /// Deletes a category. Books keep existing with no category assigned.
    pub async fn delete_category(&self, id: i64) -> ServiceResult<()> {
        let repo = CategoryRepository::new(self.pool);
        let category = repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Category", id.to_string()))?;

        BookRepository::new(self.pool).clear_category(id).await?;
        repo.delete(id).await?;

        info!("Deleted category - id: {}, name: '{}'", category.id, category.name);

        Ok(())
    }

    /// Case-insensitive substring search on category names.
    pub async fn search_categories(&self, name: &str) -> ServiceResult<Vec<CategoryResponse>> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ServiceError::validation("Category name is required"));
        }

        let rows = CategoryRepository::new(self.pool).search_with_counts(name).await?;
        Ok(rows.into_iter().map(CategoryResponse::from).collect())
    }
}

fn normalize_description(description: Option<&str>) -> Option<String> {
    description
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::book::models::BookRequest;
    use crate::database::test_pool;
    use crate::services::book_service::BookService;

    fn category_request(name: &str) -> CategoryRequest {
        CategoryRequest {
            name: name.to_string(),
            description: None,
        }
    }

    #[tokio::test]
    async fn create_list_and_fetch() {
        let pool = test_pool().await;
        let service = CategoryService::new(&pool);

        let created = service
            .create_category(category_request("Programming"))
            .await
            .unwrap();
        assert_eq!(created.name, "Programming");
        assert_eq!(created.book_count, 0);

        service
            .create_category(category_request("Fiction"))
            .await
            .unwrap();

        let all = service.get_all_categories().await.unwrap();
        assert_eq!(all.len(), 2);
        // Ordered by name
        assert_eq!(all[0].name, "Fiction");

        let fetched = service.get_category_by_id(created.id).await.unwrap();
        assert_eq!(fetched.name, "Programming");
    }

    #[tokio::test]
    async fn duplicate_name_conflicts() {
        let pool = test_pool().await;
        let service = CategoryService::new(&pool);

        service
            .create_category(category_request("Programming"))
            .await
            .unwrap();

        let err = service
            .create_category(category_request("Programming"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::AlreadyExists { .. }));
    }

    #[tokio::test]
    async fn name_length_is_validated() {
        let pool = test_pool().await;
        let service = CategoryService::new(&pool);

        let err = service.create_category(category_request("X")).await.unwrap_err();
        assert!(matches!(err, ServiceError::ValidationFields { .. }));
    }

    #[tokio::test]
    async fn update_checks_uniqueness_excluding_self() {
        let pool = test_pool().await;
        let service = CategoryService::new(&pool);

        let programming = service
            .create_category(category_request("Programming"))
            .await
            .unwrap();
        service
            .create_category(category_request("Fiction"))
            .await
            .unwrap();

        // Re-saving under its own name is fine
        let updated = service
            .update_category(programming.id, category_request("Programming"))
            .await
            .unwrap();
        assert_eq!(updated.name, "Programming");

        let err = service
            .update_category(programming.id, category_request("Fiction"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::AlreadyExists { .. }));
    }

    #[tokio::test]
    async fn delete_detaches_books() {
        let pool = test_pool().await;
        let service = CategoryService::new(&pool);
        let books = BookService::new(&pool);

        let category = service
            .create_category(category_request("Programming"))
            .await
            .unwrap();

        let book = books
            .create_book(BookRequest {
                title: Some("Orphan".to_string()),
                author: Some("Author".to_string()),
                isbn: None,
                description: None,
                price: Some(10.0),
                stock: Some(1),
                publication_date: None,
                publisher: None,
                page_count: None,
                image_url: None,
                category_id: Some(category.id),
            })
            .await
            .unwrap();

        service.delete_category(category.id).await.unwrap();

        let err = service.get_category_by_id(category.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound { .. }));

        // The book survives without a category
        let fetched = books.get_book_by_id(book.id).await.unwrap();
        assert!(fetched.category.is_none());
    }

    #[tokio::test]
    async fn search_is_case_insensitive_substring() {
        let pool = test_pool().await;
        let service = CategoryService::new(&pool);

        service
            .create_category(category_request("Programming"))
            .await
            .unwrap();
        service
            .create_category(category_request("Program Design"))
            .await
            .unwrap();
        service
            .create_category(category_request("Fiction"))
            .await
            .unwrap();

        let found = service.search_categories("PROGRAM").await.unwrap();
        assert_eq!(found.len(), 2);

        assert!(service.search_categories("  ").await.is_err());
    }
}

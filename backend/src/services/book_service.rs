//! Book catalog business logic service.
//!
//! Owns creation, update, deletion, stock management and all read paths of
//! the catalog, including the validated filter queries planned by
//! `book_filter`.

use crate::api::book::models::{BookListResponse, BookRequest, BookResponse};
use crate::api::category::models::CategoryResponse;
use crate::api::common::{PageResponse, validate_payload};
use crate::database::models::{Book, NewBook};
use crate::errors::{ServiceError, ServiceResult};
use crate::repositories::book_repository::BookRepository;
use crate::repositories::category_repository::CategoryRepository;
use crate::services::book_filter::{
    BookFilterParams, PageParams, SortFieldMap, plan_query, validate_keyword, validate_page,
};
use sqlx::SqlitePool;
use tracing::{debug, info, warn};

pub const MAX_STOCK: i64 = 100_000;
pub const MIN_STOCK: i64 = 0;
pub const MAX_STOCK_BATCH_CHANGE: i64 = 10_000;
/// Deleting a book holding more stock than this is logged as a warning.
pub const HIGH_STOCK_THRESHOLD: i64 = 100;

pub struct BookService<'a> {
    /// Shared database connection pool
    pool: &'a SqlitePool,
}

impl<'a> BookService<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Newest-first page over the whole catalog.
    pub async fn get_all_books(
        &self,
        page: PageParams,
    ) -> ServiceResult<PageResponse<BookListResponse>> {
        let window = validate_page(&page)?;
        let repo = BookRepository::new(self.pool);

        let rows = repo.find_page(&window).await?;
        let total = repo.count_all().await?;

        debug!("Listed books - page: {}, size: {}, total: {}", window.page, window.size, total);

        Ok(PageResponse::new(
            rows.into_iter().map(BookListResponse::from).collect(),
            window.page,
            window.size,
            total as u64,
        ))
    }

    /// Full detail view of a single book.
    pub async fn get_book_by_id(&self, id: i64) -> ServiceResult<BookResponse> {
        let book = self.find_required(id).await?;
        let category = self.category_view(book.category_id).await?;
        Ok(BookResponse::from_book(book, category))
    }

    /// Registers a new book.
    ///
    /// # Errors
    /// Validation failures, unknown category, duplicate ISBN and duplicate
    /// title + author pairs are all rejected before anything is written.
    pub async fn create_book(&self, request: BookRequest) -> ServiceResult<BookResponse> {
        validate_payload(&request)?;

        let title = required_trimmed(request.title.as_deref(), "Title is required")?;
        let author = required_trimmed(request.author.as_deref(), "Author is required")?;
        let isbn = optional_trimmed(request.isbn.as_deref());

        let category_id = request
            .category_id
            .ok_or_else(|| ServiceError::validation("Category is required"))?;
        let category = self.require_category(category_id).await?;

        let repo = BookRepository::new(self.pool);

        // Duplicate checks are independent of format validation.
        if let Some(isbn) = &isbn {
            if repo.find_by_isbn(isbn).await?.is_some() {
                return Err(ServiceError::already_exists("ISBN", isbn));
            }
        }

        if repo.find_by_title_and_author(&title, &author).await?.is_some() {
            return Err(ServiceError::already_exists(
                "Book",
                format!("{title} by {author}"),
            ));
        }

        info!(
            "Registering book - title: '{}', author: '{}', category: '{}'",
            title, author, category.name
        );

        let book = repo
            .insert(NewBook {
                title,
                author,
                isbn,
                description: optional_trimmed(request.description.as_deref()),
                price: request.price.unwrap_or(0.0),
                stock: request.stock.unwrap_or(0),
                publication_date: request.publication_date,
                publisher: optional_trimmed(request.publisher.as_deref()),
                page_count: request.page_count,
                image_url: optional_trimmed(request.image_url.as_deref()),
                category_id: Some(category_id),
            })
            .await?;

        info!("Registered book - id: {}, title: '{}'", book.id, book.title);

        let category = self.category_view(book.category_id).await?;
        Ok(BookResponse::from_book(book, category))
    }

    /// Partially updates an existing book; absent fields keep their current
    /// values.
    pub async fn update_book(&self, id: i64, request: BookRequest) -> ServiceResult<BookResponse> {
        validate_payload(&request)?;

        let mut book = self.find_required(id).await?;
        let repo = BookRepository::new(self.pool);

        let new_title = request
            .title
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| book.title.clone());
        let new_author = request
            .author
            .as_deref()
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| book.author.clone());

        // ISBN duplicate check only when it actually changes.
        if let Some(raw) = request.isbn.as_deref() {
            let new_isbn = optional_trimmed(Some(raw));
            if new_isbn != book.isbn {
                if let Some(isbn) = &new_isbn {
                    if repo.find_by_isbn(isbn).await?.is_some() {
                        return Err(ServiceError::already_exists("ISBN", isbn));
                    }
                }
                book.isbn = new_isbn;
            }
        }

        // Title + author pair duplicate check when either changes.
        if !new_title.eq_ignore_ascii_case(&book.title)
            || !new_author.eq_ignore_ascii_case(&book.author)
        {
            if let Some(existing) = repo.find_by_title_and_author(&new_title, &new_author).await? {
                if existing.id != id {
                    return Err(ServiceError::already_exists(
                        "Book",
                        format!("{new_title} by {new_author}"),
                    ));
                }
            }
        }

        if let Some(category_id) = request.category_id {
            if Some(category_id) != book.category_id {
                self.require_category(category_id).await?;
                book.category_id = Some(category_id);
            }
        }

        book.title = new_title;
        book.author = new_author;
        if let Some(description) = request.description.as_deref() {
            book.description = optional_trimmed(Some(description));
        }
        if let Some(price) = request.price {
            book.price = price;
        }
        if let Some(stock) = request.stock {
            book.stock = stock;
        }
        if let Some(publication_date) = request.publication_date {
            book.publication_date = Some(publication_date);
        }
        if let Some(publisher) = request.publisher.as_deref() {
            book.publisher = optional_trimmed(Some(publisher));
        }
        if let Some(page_count) = request.page_count {
            book.page_count = Some(page_count);
        }
        if let Some(image_url) = request.image_url.as_deref() {
            book.image_url = optional_trimmed(Some(image_url));
        }

        let updated = repo.update(&book).await?;

        info!("Updated book - id: {}, title: '{}'", updated.id, updated.title);

        let category = self.category_view(updated.category_id).await?;
        Ok(BookResponse::from_book(updated, category))
    }

    pub async fn delete_book(&self, id: i64) -> ServiceResult<()> {
        let book = self.find_required(id).await?;

        if book.stock > HIGH_STOCK_THRESHOLD {
            warn!(
                "Deleting book with high stock - id: {}, stock: {}",
                book.id, book.stock
            );
        }

        BookRepository::new(self.pool).delete(id).await?;

        info!("Deleted book - id: {}, title: '{}'", book.id, book.title);

        Ok(())
    }

    /// Free-text search over title or author.
    pub async fn search_books(
        &self,
        keyword: &str,
        page: PageParams,
    ) -> ServiceResult<PageResponse<BookListResponse>> {
        let keyword = validate_keyword(keyword)?;
        let window = validate_page(&page)?;
        let repo = BookRepository::new(self.pool);

        let rows = repo.search(&keyword, &window).await?;
        let total = repo.count_search(&keyword).await?;

        debug!("Searched books - keyword: '{}', total: {}", keyword, total);

        Ok(PageResponse::new(
            rows.into_iter().map(BookListResponse::from).collect(),
            window.page,
            window.size,
            total as u64,
        ))
    }

    pub async fn get_books_by_category(
        &self,
        category_id: i64,
        page: PageParams,
    ) -> ServiceResult<PageResponse<BookListResponse>> {
        let window = validate_page(&page)?;
        let category = self.require_category(category_id).await?;
        let repo = BookRepository::new(self.pool);

        let rows = repo.find_by_category(category_id, &window).await?;
        let total = repo.count_by_category(category_id).await?;

        debug!(
            "Listed books by category - category: '{}', total: {}",
            category.name, total
        );

        Ok(PageResponse::new(
            rows.into_iter().map(BookListResponse::from).collect(),
            window.page,
            window.size,
            total as u64,
        ))
    }

    /// Plans and executes a validated filter query. Every validation failure
    /// surfaces before the store is touched.
    pub async fn filter_books(
        &self,
        params: BookFilterParams,
        page: PageParams,
        sort_fields: &SortFieldMap,
    ) -> ServiceResult<PageResponse<BookListResponse>> {
        let query = plan_query(params, page, sort_fields)?;
        let repo = BookRepository::new(self.pool);

        let rows = repo.find_filtered(&query).await?;
        let total = repo.count_filtered(&query).await?;

        debug!(
            "Filtered books - sort: {:?} {:?}, total: {}",
            query.sort_field, query.sort_direction, total
        );

        Ok(PageResponse::new(
            rows.into_iter().map(BookListResponse::from).collect(),
            query.window.page,
            query.window.size,
            total as u64,
        ))
    }

    /// Top ten books by stock.
    pub async fn get_bestsellers(&self) -> ServiceResult<Vec<BookListResponse>> {
        let rows = BookRepository::new(self.pool).top_by_stock().await?;
        Ok(rows.into_iter().map(BookListResponse::from).collect())
    }

    /// Ten most recently registered books.
    pub async fn get_latest_books(&self) -> ServiceResult<Vec<BookListResponse>> {
        let rows = BookRepository::new(self.pool).top_by_created().await?;
        Ok(rows.into_iter().map(BookListResponse::from).collect())
    }

    /// Sets the absolute stock level.
    pub async fn update_stock(&self, id: i64, quantity: i64) -> ServiceResult<BookResponse> {
        if !(MIN_STOCK..=MAX_STOCK).contains(&quantity) {
            return Err(ServiceError::validation(format!(
                "Stock must be between {MIN_STOCK} and {MAX_STOCK}"
            )));
        }

        let book = self.find_required(id).await?;

        info!(
            "Updating stock - id: {}, title: '{}', stock: {} -> {}",
            book.id, book.title, book.stock, quantity
        );

        let updated = BookRepository::new(self.pool).set_stock(id, quantity).await?;
        let category = self.category_view(updated.category_id).await?;
        Ok(BookResponse::from_book(updated, category))
    }

    /// Increases stock by a bounded quantity.
    pub async fn increase_stock(&self, id: i64, quantity: i64) -> ServiceResult<BookResponse> {
        validate_stock_change(quantity)?;

        let book = self.find_required(id).await?;
        let new_stock = book.stock + quantity;

        if new_stock > MAX_STOCK {
            return Err(ServiceError::validation(format!(
                "Stock cannot exceed {MAX_STOCK}"
            )));
        }

        info!(
            "Increasing stock - id: {}, stock: {} + {} = {}",
            book.id, book.stock, quantity, new_stock
        );

        let updated = BookRepository::new(self.pool).set_stock(id, new_stock).await?;
        let category = self.category_view(updated.category_id).await?;
        Ok(BookResponse::from_book(updated, category))
    }

    /// Decreases stock by a bounded quantity; never below zero.
    pub async fn decrease_stock(&self, id: i64, quantity: i64) -> ServiceResult<BookResponse> {
        validate_stock_change(quantity)?;

        let book = self.find_required(id).await?;
        let new_stock = book.stock - quantity;

        if new_stock < 0 {
            return Err(ServiceError::insufficient_stock(format!(
                "Insufficient stock: current {}, requested {}",
                book.stock, quantity
            )));
        }

        info!(
            "Decreasing stock - id: {}, stock: {} - {} = {}",
            book.id, book.stock, quantity, new_stock
        );

        let updated = BookRepository::new(self.pool).set_stock(id, new_stock).await?;
        let category = self.category_view(updated.category_id).await?;
        Ok(BookResponse::from_book(updated, category))
    }

    async fn find_required(&self, id: i64) -> ServiceResult<Book> {
        BookRepository::new(self.pool)
            .find_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Book", id.to_string()))
    }

    async fn require_category(
        &self,
        category_id: i64,
    ) -> ServiceResult<crate::database::models::Category> {
        if category_id <= 0 {
            return Err(ServiceError::validation("Invalid category ID"));
        }

        CategoryRepository::new(self.pool)
            .find_by_id(category_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Category", category_id.to_string()))
    }

    async fn category_view(
        &self,
        category_id: Option<i64>,
    ) -> ServiceResult<Option<CategoryResponse>> {
        let Some(category_id) = category_id else {
            return Ok(None);
        };

        let row = CategoryRepository::new(self.pool)
            .find_by_id_with_count(category_id)
            .await?;

        Ok(row.map(CategoryResponse::from))
    }
}

fn required_trimmed(value: Option<&str>, message: &str) -> ServiceResult<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or_else(|| ServiceError::validation(message))
}

fn optional_trimmed(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn validate_stock_change(quantity: i64) -> ServiceResult<()> {
    if quantity <= 0 {
        return Err(ServiceError::validation(
            "Stock change quantity must be at least 1",
        ));
    }

    if quantity > MAX_STOCK_BATCH_CHANGE {
        return Err(ServiceError::validation(format!(
            "Stock cannot change by more than {MAX_STOCK_BATCH_CHANGE} at once"
        )));
    }

    Ok(())
}

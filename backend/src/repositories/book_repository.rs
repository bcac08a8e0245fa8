//! Database repository for the book catalog.
//!
//! Provides CRUD operations plus the paged list, search and filter queries
//! backing the catalog endpoints. The filter query is assembled dynamically
//! from a validated `BookQuery` plan; only whitelisted columns reach the
//! ORDER BY clause.

use crate::database::models::{Book, BookListRow, NewBook};
use crate::services::book_filter::{BookQuery, PageWindow};
use anyhow::Result;
use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

const BOOK_COLUMNS: &str = "id, title, author, isbn, description, price, stock, \
     publication_date, publisher, page_count, image_url, category_id, created_at, updated_at";

const LIST_COLUMNS: &str = "b.id, b.title, b.author, b.price, b.stock, b.image_url, \
     c.name AS category_name, b.created_at";

const LIST_FROM: &str = "FROM books b LEFT JOIN categories c ON b.category_id = c.id";

/// Repository for book database operations.
pub struct BookRepository<'a> {
    /// Shared SQLite connection pool
    pool: &'a SqlitePool,
}

impl<'a> BookRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Inserts a new book and returns the stored row.
    pub async fn insert(&self, book: NewBook) -> Result<Book> {
        let book = sqlx::query_as::<_, Book>(&format!(
            r#"
            INSERT INTO books (title, author, isbn, description, price, stock,
                publication_date, publisher, page_count, image_url, category_id, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING {BOOK_COLUMNS}
            "#
        ))
        .bind(&book.title)
        .bind(&book.author)
        .bind(&book.isbn)
        .bind(&book.description)
        .bind(book.price)
        .bind(book.stock)
        .bind(book.publication_date)
        .bind(&book.publisher)
        .bind(book.page_count)
        .bind(&book.image_url)
        .bind(book.category_id)
        .bind(Utc::now())
        .fetch_one(self.pool)
        .await?;

        Ok(book)
    }

    /// Writes back every mutable field of an existing book.
    pub async fn update(&self, book: &Book) -> Result<Book> {
        let book = sqlx::query_as::<_, Book>(&format!(
            r#"
            UPDATE books SET title = ?, author = ?, isbn = ?, description = ?, price = ?,
                stock = ?, publication_date = ?, publisher = ?, page_count = ?, image_url = ?,
                category_id = ?, updated_at = ?
            WHERE id = ?
            RETURNING {BOOK_COLUMNS}
            "#
        ))
        .bind(&book.title)
        .bind(&book.author)
        .bind(&book.isbn)
        .bind(&book.description)
        .bind(book.price)
        .bind(book.stock)
        .bind(book.publication_date)
        .bind(&book.publisher)
        .bind(book.page_count)
        .bind(&book.image_url)
        .bind(book.category_id)
        .bind(Utc::now())
        .bind(book.id)
        .fetch_one(self.pool)
        .await?;

        Ok(book)
    }

    /// Sets the absolute stock level of a book.
    pub async fn set_stock(&self, id: i64, stock: i64) -> Result<Book> {
        let book = sqlx::query_as::<_, Book>(&format!(
            "UPDATE books SET stock = ?, updated_at = ? WHERE id = ? RETURNING {BOOK_COLUMNS}"
        ))
        .bind(stock)
        .bind(Utc::now())
        .bind(id)
        .fetch_one(self.pool)
        .await?;

        Ok(book)
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        sqlx::query("DELETE FROM books WHERE id = ?")
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(())
    }

    /// Detaches every book from a category (used before category deletion).
    pub async fn clear_category(&self, category_id: i64) -> Result<()> {
        sqlx::query("UPDATE books SET category_id = NULL WHERE category_id = ?")
            .bind(category_id)
            .execute(self.pool)
            .await?;

        Ok(())
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<Book>> {
        let book = sqlx::query_as::<_, Book>(&format!(
            "SELECT {BOOK_COLUMNS} FROM books WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(book)
    }

    pub async fn find_by_isbn(&self, isbn: &str) -> Result<Option<Book>> {
        let book = sqlx::query_as::<_, Book>(&format!(
            "SELECT {BOOK_COLUMNS} FROM books WHERE isbn = ?"
        ))
        .bind(isbn)
        .fetch_optional(self.pool)
        .await?;

        Ok(book)
    }

    /// Case-insensitive exact match on the title + author pair.
    pub async fn find_by_title_and_author(&self, title: &str, author: &str) -> Result<Option<Book>> {
        let book = sqlx::query_as::<_, Book>(&format!(
            "SELECT {BOOK_COLUMNS} FROM books WHERE LOWER(title) = LOWER(?) AND LOWER(author) = LOWER(?)"
        ))
        .bind(title)
        .bind(author)
        .fetch_optional(self.pool)
        .await?;

        Ok(book)
    }

    /// Newest-first page over the whole catalog.
    pub async fn find_page(&self, window: &PageWindow) -> Result<Vec<BookListRow>> {
        let rows = sqlx::query_as::<_, BookListRow>(&format!(
            "SELECT {LIST_COLUMNS} {LIST_FROM} ORDER BY b.created_at DESC LIMIT ? OFFSET ?"
        ))
        .bind(window.limit())
        .bind(window.offset())
        .fetch_all(self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn count_all(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books")
            .fetch_one(self.pool)
            .await?;

        Ok(count)
    }

    /// Case-insensitive substring search over title or author.
    pub async fn search(&self, keyword: &str, window: &PageWindow) -> Result<Vec<BookListRow>> {
        let pattern = like_pattern(keyword);

        let rows = sqlx::query_as::<_, BookListRow>(&format!(
            r#"
            SELECT {LIST_COLUMNS} {LIST_FROM}
            WHERE LOWER(b.title) LIKE ? OR LOWER(b.author) LIKE ?
            ORDER BY b.created_at DESC LIMIT ? OFFSET ?
            "#
        ))
        .bind(&pattern)
        .bind(&pattern)
        .bind(window.limit())
        .bind(window.offset())
        .fetch_all(self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn count_search(&self, keyword: &str) -> Result<i64> {
        let pattern = like_pattern(keyword);

        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM books b WHERE LOWER(b.title) LIKE ? OR LOWER(b.author) LIKE ?",
        )
        .bind(&pattern)
        .bind(&pattern)
        .fetch_one(self.pool)
        .await?;

        Ok(count)
    }

    pub async fn find_by_category(
        &self,
        category_id: i64,
        window: &PageWindow,
    ) -> Result<Vec<BookListRow>> {
        let rows = sqlx::query_as::<_, BookListRow>(&format!(
            r#"
            SELECT {LIST_COLUMNS} {LIST_FROM}
            WHERE b.category_id = ?
            ORDER BY b.created_at DESC LIMIT ? OFFSET ?
            "#
        ))
        .bind(category_id)
        .bind(window.limit())
        .bind(window.offset())
        .fetch_all(self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn count_by_category(&self, category_id: i64) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books WHERE category_id = ?")
            .bind(category_id)
            .fetch_one(self.pool)
            .await?;

        Ok(count)
    }

    /// Executes a validated filter plan and returns the matching page.
    pub async fn find_filtered(&self, query: &BookQuery) -> Result<Vec<BookListRow>> {
        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {LIST_COLUMNS} {LIST_FROM} WHERE 1 = 1"));

        push_filters(&mut builder, query);

        builder.push(format!(
            " ORDER BY b.{} {}",
            query.sort_field.column(),
            query.sort_direction.keyword()
        ));
        builder.push(" LIMIT ").push_bind(query.window.limit());
        builder.push(" OFFSET ").push_bind(query.window.offset());

        let rows = builder
            .build_query_as::<BookListRow>()
            .fetch_all(self.pool)
            .await?;

        Ok(rows)
    }

    /// Total number of rows matching a filter plan, ignoring the page window.
    pub async fn count_filtered(&self, query: &BookQuery) -> Result<i64> {
        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT COUNT(*) FROM books b WHERE 1 = 1");

        push_filters(&mut builder, query);

        let count: i64 = builder.build_query_scalar().fetch_one(self.pool).await?;

        Ok(count)
    }

    /// Top ten books by stock, a stand-in for sales figures.
    pub async fn top_by_stock(&self) -> Result<Vec<BookListRow>> {
        let rows = sqlx::query_as::<_, BookListRow>(&format!(
            "SELECT {LIST_COLUMNS} {LIST_FROM} ORDER BY b.stock DESC LIMIT 10"
        ))
        .fetch_all(self.pool)
        .await?;

        Ok(rows)
    }

    /// Ten most recently registered books.
    pub async fn top_by_created(&self) -> Result<Vec<BookListRow>> {
        let rows = sqlx::query_as::<_, BookListRow>(&format!(
            "SELECT {LIST_COLUMNS} {LIST_FROM} ORDER BY b.created_at DESC LIMIT 10"
        ))
        .fetch_all(self.pool)
        .await?;

        Ok(rows)
    }
}

/// Appends the AND-composed predicate of a filter plan. Absent fields impose
/// no constraint.
fn push_filters<'q>(builder: &mut QueryBuilder<'q, Sqlite>, query: &'q BookQuery) {
    if let Some(title) = &query.title {
        builder
            .push(" AND LOWER(b.title) LIKE ")
            .push_bind(like_pattern(title));
    }

    if let Some(author) = &query.author {
        builder
            .push(" AND LOWER(b.author) LIKE ")
            .push_bind(like_pattern(author));
    }

    if let Some(category_id) = query.category_id {
        builder.push(" AND b.category_id = ").push_bind(category_id);
    }

    if let Some(min_price) = query.min_price {
        builder.push(" AND b.price >= ").push_bind(min_price);
    }

    if let Some(max_price) = query.max_price {
        builder.push(" AND b.price <= ").push_bind(max_price);
    }

    if query.in_stock_only {
        builder.push(" AND b.stock > 0");
    }
}

fn like_pattern(needle: &str) -> String {
    format!("%{}%", needle.to_lowercase())
}

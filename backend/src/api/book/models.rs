//! Data transfer objects for book catalog endpoints.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::api::category::models::CategoryResponse;
use crate::database::models::{Book, BookListRow};

/// Create/update payload for a book. All fields are optional so the same
/// shape serves partial updates; the service enforces which fields are
/// required at creation time.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct BookRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be between 1-200 characters"))]
    pub title: Option<String>,

    #[validate(length(min = 1, max = 100, message = "Author must be between 1-100 characters"))]
    pub author: Option<String>,

    #[validate(custom(function = validate_isbn))]
    pub isbn: Option<String>,

    #[validate(length(max = 2000, message = "Description cannot exceed 2000 characters"))]
    pub description: Option<String>,

    #[validate(range(min = 0.0, max = 1_000_000.0, message = "Price must be between 0 and 1000000"))]
    pub price: Option<f64>,

    #[validate(range(min = 0, max = 100_000, message = "Stock must be between 0 and 100000"))]
    pub stock: Option<i64>,

    #[validate(custom(function = validate_publication_date))]
    pub publication_date: Option<NaiveDate>,

    #[validate(length(max = 100, message = "Publisher cannot exceed 100 characters"))]
    pub publisher: Option<String>,

    #[validate(range(min = 1, max = 50_000, message = "Page count must be between 1 and 50000"))]
    pub page_count: Option<i64>,

    #[validate(length(max = 500, message = "Image URL cannot exceed 500 characters"))]
    pub image_url: Option<String>,

    pub category_id: Option<i64>,
}

/// Full detail view of a single book.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookResponse {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub isbn: Option<String>,
    pub description: Option<String>,
    pub price: f64,
    pub stock: i64,
    pub publication_date: Option<NaiveDate>,
    pub publisher: Option<String>,
    pub page_count: Option<i64>,
    pub image_url: Option<String>,
    pub category: Option<CategoryResponse>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl BookResponse {
    pub fn from_book(book: Book, category: Option<CategoryResponse>) -> Self {
        Self {
            id: book.id,
            title: book.title,
            author: book.author,
            isbn: book.isbn,
            description: book.description,
            price: book.price,
            stock: book.stock,
            publication_date: book.publication_date,
            publisher: book.publisher,
            page_count: book.page_count,
            image_url: book.image_url,
            category,
            created_at: book.created_at,
            updated_at: book.updated_at,
        }
    }
}

/// Slim list view used by every paged catalog endpoint.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookListResponse {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub price: f64,
    pub stock: i64,
    pub image_url: Option<String>,
    pub category_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<BookListRow> for BookListResponse {
    fn from(row: BookListRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            author: row.author,
            price: row.price,
            stock: row.stock,
            image_url: row.image_url,
            category_name: row.category_name,
            created_at: row.created_at,
        }
    }
}

/// Query parameters of the free-text search endpoint.
#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub keyword: Option<String>,
}

/// Query parameters of the stock endpoints.
#[derive(Debug, Deserialize)]
pub struct StockParams {
    pub quantity: Option<i64>,
}

/// ISBN must be 10 or 13 digits once spaces and hyphens are removed; a
/// 13-digit ISBN must additionally carry a valid check digit. Blank values
/// are treated as absent.
fn validate_isbn(isbn: &str) -> Result<(), ValidationError> {
    let clean: String = isbn
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect();

    if clean.is_empty() {
        return Ok(());
    }

    if !clean.chars().all(|c| c.is_ascii_digit()) || !(clean.len() == 10 || clean.len() == 13) {
        let mut error = ValidationError::new("isbn_format");
        error.message = Some("ISBN must be 10 or 13 digits".into());
        return Err(error);
    }

    if clean.len() == 13 && !isbn13_checksum_valid(&clean) {
        let mut error = ValidationError::new("isbn_checksum");
        error.message = Some("Invalid ISBN-13 check digit".into());
        return Err(error);
    }

    Ok(())
}

fn isbn13_checksum_valid(isbn13: &str) -> bool {
    let digits: Vec<u32> = isbn13.chars().filter_map(|c| c.to_digit(10)).collect();
    if digits.len() != 13 {
        return false;
    }

    let sum: u32 = digits
        .iter()
        .take(12)
        .enumerate()
        .map(|(i, d)| if i % 2 == 0 { *d } else { *d * 3 })
        .sum();

    (10 - (sum % 10)) % 10 == digits[12]
}

/// Publication dates may not lie in the future and may not predate year 1000.
fn validate_publication_date(date: &NaiveDate) -> Result<(), ValidationError> {
    let today = Utc::now().date_naive();

    if *date > today {
        let mut error = ValidationError::new("publication_date_future");
        error.message = Some("Publication date cannot be in the future".into());
        return Err(error);
    }

    let earliest = NaiveDate::from_ymd_opt(1000, 1, 1).expect("valid date");
    if *date < earliest {
        let mut error = ValidationError::new("publication_date_past");
        error.message = Some("Publication date is too far in the past".into());
        return Err(error);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn isbn13_checksum_accepts_valid_isbn() {
        assert!(validate_isbn("9780306406157").is_ok());
        assert!(validate_isbn("978-0-306-40615-7").is_ok());
        assert!(validate_isbn("0306406152").is_ok());
        assert!(validate_isbn("").is_ok());
        assert!(validate_isbn("  ").is_ok());
    }

    #[test]
    fn isbn13_checksum_rejects_bad_check_digit() {
        assert!(validate_isbn("9780306406158").is_err());
    }

    #[test]
    fn isbn_rejects_wrong_length_and_non_digits() {
        assert!(validate_isbn("12345").is_err());
        assert!(validate_isbn("97803064061XX").is_err());
    }

    #[test]
    fn publication_date_bounds() {
        let future = Utc::now().date_naive() + chrono::Duration::days(1);
        assert!(validate_publication_date(&future).is_err());

        let ancient = NaiveDate::from_ymd_opt(999, 12, 31).unwrap();
        assert!(validate_publication_date(&ancient).is_err());

        let fine = NaiveDate::from_ymd_opt(2020, 5, 1).unwrap();
        assert!(validate_publication_date(&fine).is_ok());
    }
}

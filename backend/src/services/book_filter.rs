//! Validation and planning for catalog list queries.
//!
//! Turns the loosely-typed filter, sort and paging parameters accepted on the
//! wire into a validated `BookQuery` plan. All validation happens here,
//! before any database access; an invalid request never produces a partial
//! query. The sort synonym table is built once at startup and injected, so
//! there is no global lookup state.

use serde::Deserialize;
use std::collections::HashMap;

use crate::errors::{ServiceError, ServiceResult};

pub const MIN_PAGE_SIZE: i64 = 1;
pub const MAX_PAGE_SIZE: i64 = 100;
pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const MAX_FILTER_PRICE: f64 = 10_000_000.0;
pub const MAX_SEARCH_KEYWORD_LENGTH: usize = 100;

/// Canonical sortable fields of the book catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Title,
    Author,
    Price,
    Stock,
    CreatedAt,
    PublicationDate,
    PageCount,
}

impl SortField {
    /// Database column backing this field. Only these columns ever reach an
    /// ORDER BY clause.
    pub fn column(&self) -> &'static str {
        match self {
            SortField::Title => "title",
            SortField::Author => "author",
            SortField::Price => "price",
            SortField::Stock => "stock",
            SortField::CreatedAt => "created_at",
            SortField::PublicationDate => "publication_date",
            SortField::PageCount => "page_count",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn keyword(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }

    /// Ascending only on an explicit, case-insensitive "asc"; anything else
    /// (including absence) sorts descending.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some(value) if value.trim().eq_ignore_ascii_case("asc") => SortDirection::Asc,
            _ => SortDirection::Desc,
        }
    }
}

/// Immutable mapping from accepted sort-field aliases (English and Korean)
/// to canonical fields. Constructed once at process start and passed by
/// reference into the filter engine.
pub struct SortFieldMap {
    entries: HashMap<&'static str, SortField>,
}

impl SortFieldMap {
    pub fn new() -> Self {
        let mut entries = HashMap::new();

        entries.insert("title", SortField::Title);
        entries.insert("author", SortField::Author);
        entries.insert("price", SortField::Price);
        entries.insert("stock", SortField::Stock);
        entries.insert("createdat", SortField::CreatedAt);
        entries.insert("created_at", SortField::CreatedAt);
        entries.insert("publicationdate", SortField::PublicationDate);
        entries.insert("publication_date", SortField::PublicationDate);
        entries.insert("pagecount", SortField::PageCount);
        entries.insert("page_count", SortField::PageCount);

        entries.insert("제목", SortField::Title);
        entries.insert("저자", SortField::Author);
        entries.insert("가격", SortField::Price);
        entries.insert("재고", SortField::Stock);
        entries.insert("등록일", SortField::CreatedAt);
        entries.insert("출판일", SortField::PublicationDate);
        entries.insert("페이지수", SortField::PageCount);

        SortFieldMap { entries }
    }

    /// Resolves an alias, case-insensitively and ignoring surrounding
    /// whitespace. An empty value falls back to the creation date; an
    /// unresolvable value is rejected naming the field.
    pub fn resolve(&self, raw: &str) -> ServiceResult<SortField> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(SortField::CreatedAt);
        }

        let key = trimmed.to_lowercase();
        self.entries.get(key.as_str()).copied().ok_or_else(|| {
            ServiceError::validation(format!("Unsupported sort field: {trimmed}"))
        })
    }
}

impl Default for SortFieldMap {
    fn default() -> Self {
        Self::new()
    }
}

/// Raw filter parameters as they arrive on the query string. Prices are
/// strings so that malformed input is rejected explicitly instead of being
/// swallowed by deserialization.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookFilterParams {
    pub title: Option<String>,
    pub author: Option<String>,
    pub category_id: Option<i64>,
    pub min_price: Option<String>,
    pub max_price: Option<String>,
    pub in_stock_only: Option<bool>,
    pub sort_by: Option<String>,
    pub sort_direction: Option<String>,
}

/// Raw paging parameters. Signed so that negative input reaches validation
/// rather than failing deserialization.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<i64>,
    pub size: Option<i64>,
}

/// Validated page window (0-indexed page, bounded size).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub page: u32,
    pub size: u32,
}

impl PageWindow {
    pub fn limit(&self) -> i64 {
        self.size as i64
    }

    pub fn offset(&self) -> i64 {
        self.page as i64 * self.size as i64
    }
}

/// Validated query plan executed by the book repository.
#[derive(Debug, Clone)]
pub struct BookQuery {
    pub title: Option<String>,
    pub author: Option<String>,
    pub category_id: Option<i64>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub in_stock_only: bool,
    pub sort_field: SortField,
    pub sort_direction: SortDirection,
    pub window: PageWindow,
}

/// Validates raw paging parameters. Out-of-range values are rejected, never
/// silently clamped.
pub fn validate_page(params: &PageParams) -> ServiceResult<PageWindow> {
    let page = params.page.unwrap_or(0);
    let size = params.size.unwrap_or(DEFAULT_PAGE_SIZE);

    if page < 0 {
        return Err(ServiceError::validation("Page number must be 0 or greater"));
    }

    if size < MIN_PAGE_SIZE {
        return Err(ServiceError::validation("Page size must be at least 1"));
    }

    if size > MAX_PAGE_SIZE {
        return Err(ServiceError::validation(format!(
            "Page size cannot exceed {MAX_PAGE_SIZE}"
        )));
    }

    Ok(PageWindow {
        page: page as u32,
        size: size as u32,
    })
}

/// Validates a free-text search keyword.
pub fn validate_keyword(raw: &str) -> ServiceResult<String> {
    let keyword = raw.trim();

    if keyword.is_empty() {
        return Err(ServiceError::validation("Search keyword is required"));
    }

    if keyword.chars().count() > MAX_SEARCH_KEYWORD_LENGTH {
        return Err(ServiceError::validation(format!(
            "Search keyword cannot exceed {MAX_SEARCH_KEYWORD_LENGTH} characters"
        )));
    }

    Ok(keyword.to_string())
}

/// Normalizes and validates the full filter request into an executable plan.
pub fn plan_query(
    params: BookFilterParams,
    page: PageParams,
    sort_fields: &SortFieldMap,
) -> ServiceResult<BookQuery> {
    let window = validate_page(&page)?;

    let title = normalize_text(params.title);
    let author = normalize_text(params.author);

    if let Some(category_id) = params.category_id {
        if category_id <= 0 {
            return Err(ServiceError::validation("Invalid category ID"));
        }
    }

    let min_price = parse_price(params.min_price.as_deref())?;
    let max_price = parse_price(params.max_price.as_deref())?;

    if let (Some(min), Some(max)) = (min_price, max_price) {
        if min > max {
            return Err(ServiceError::validation(
                "Minimum price cannot exceed maximum price",
            ));
        }
    }

    if let Some(max) = max_price {
        if max > MAX_FILTER_PRICE {
            return Err(ServiceError::validation("Maximum price is too large"));
        }
    }

    let sort_field = sort_fields.resolve(params.sort_by.as_deref().unwrap_or(""))?;
    let sort_direction = SortDirection::parse(params.sort_direction.as_deref());

    Ok(BookQuery {
        title,
        author,
        category_id: params.category_id,
        min_price,
        max_price,
        in_stock_only: params.in_stock_only.unwrap_or(false),
        sort_field,
        sort_direction,
        window,
    })
}

/// Trims a text filter; a blank value imposes no constraint.
fn normalize_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parses a price bound. Blank means absent; anything non-numeric is an
/// error, never coerced to zero.
fn parse_price(raw: Option<&str>) -> ServiceResult<Option<f64>> {
    let Some(text) = raw.map(str::trim).filter(|t| !t.is_empty()) else {
        return Ok(None);
    };

    let value: f64 = text
        .parse()
        .map_err(|_| ServiceError::validation("Invalid price format"))?;

    if !value.is_finite() {
        return Err(ServiceError::validation("Invalid price format"));
    }

    if value < 0.0 {
        return Err(ServiceError::validation("Price must be 0 or greater"));
    }

    Ok(Some(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan(params: BookFilterParams, page: PageParams) -> ServiceResult<BookQuery> {
        plan_query(params, page, &SortFieldMap::new())
    }

    #[test]
    fn defaults_apply_when_nothing_is_given() {
        let query = plan(BookFilterParams::default(), PageParams::default()).unwrap();

        assert_eq!(query.sort_field, SortField::CreatedAt);
        assert_eq!(query.sort_direction, SortDirection::Desc);
        assert_eq!(query.window, PageWindow { page: 0, size: 10 });
        assert!(query.title.is_none());
        assert!(!query.in_stock_only);
    }

    #[test]
    fn text_filters_are_trimmed_and_blank_means_absent() {
        let params = BookFilterParams {
            title: Some("  rust  ".to_string()),
            author: Some("   ".to_string()),
            ..Default::default()
        };

        let query = plan(params, PageParams::default()).unwrap();
        assert_eq!(query.title.as_deref(), Some("rust"));
        assert!(query.author.is_none());
    }

    #[test]
    fn non_numeric_price_is_rejected() {
        let params = BookFilterParams {
            min_price: Some("abc".to_string()),
            ..Default::default()
        };

        let error = plan(params, PageParams::default()).unwrap_err();
        assert!(error.to_string().contains("Invalid price format"));

        let params = BookFilterParams {
            max_price: Some("NaN".to_string()),
            ..Default::default()
        };
        assert!(plan(params, PageParams::default()).is_err());
    }

    #[test]
    fn inverted_price_range_is_rejected() {
        let params = BookFilterParams {
            min_price: Some("100".to_string()),
            max_price: Some("50".to_string()),
            ..Default::default()
        };

        let error = plan(params, PageParams::default()).unwrap_err();
        assert!(
            error
                .to_string()
                .contains("Minimum price cannot exceed maximum price")
        );
    }

    #[test]
    fn negative_price_is_rejected() {
        let params = BookFilterParams {
            min_price: Some("-1".to_string()),
            ..Default::default()
        };

        assert!(plan(params, PageParams::default()).is_err());
    }

    #[test]
    fn page_bounds_are_enforced() {
        let size_zero = PageParams {
            page: Some(0),
            size: Some(0),
        };
        assert!(validate_page(&size_zero).is_err());

        let size_too_large = PageParams {
            page: Some(0),
            size: Some(101),
        };
        assert!(validate_page(&size_too_large).is_err());

        let negative_page = PageParams {
            page: Some(-1),
            size: Some(10),
        };
        assert!(validate_page(&negative_page).is_err());

        let window = validate_page(&PageParams {
            page: Some(2),
            size: Some(100),
        })
        .unwrap();
        assert_eq!(window.offset(), 200);
        assert_eq!(window.limit(), 100);
    }

    #[test]
    fn sort_synonyms_resolve_case_insensitively() {
        let map = SortFieldMap::new();

        assert_eq!(map.resolve("PRICE").unwrap(), SortField::Price);
        assert_eq!(map.resolve(" CreatedAt ").unwrap(), SortField::CreatedAt);
        assert_eq!(
            map.resolve("publication_date").unwrap(),
            SortField::PublicationDate
        );
        assert_eq!(map.resolve("제목").unwrap(), SortField::Title);
        assert_eq!(map.resolve("페이지수").unwrap(), SortField::PageCount);
        assert_eq!(map.resolve("").unwrap(), SortField::CreatedAt);
    }

    #[test]
    fn unknown_sort_field_is_rejected_naming_the_field() {
        let map = SortFieldMap::new();

        let error = map.resolve("popularity").unwrap_err();
        assert!(error.to_string().contains("popularity"));
    }

    #[test]
    fn sort_direction_is_desc_unless_explicit_asc() {
        assert_eq!(SortDirection::parse(Some("asc")), SortDirection::Asc);
        assert_eq!(SortDirection::parse(Some("ASC")), SortDirection::Asc);
        assert_eq!(SortDirection::parse(Some("desc")), SortDirection::Desc);
        assert_eq!(SortDirection::parse(Some("sideways")), SortDirection::Desc);
        assert_eq!(SortDirection::parse(None), SortDirection::Desc);
    }

    #[test]
    fn keyword_validation() {
        assert!(validate_keyword("").is_err());
        assert!(validate_keyword("   ").is_err());
        assert!(validate_keyword(&"x".repeat(101)).is_err());
        assert_eq!(validate_keyword("  rust  ").unwrap(), "rust");
    }
}

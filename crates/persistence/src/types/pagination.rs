//! Pagination and search request types.
//!
//! Offset pagination with an optional substring search. [`PageRequest`] is
//! parsed from any [`ParamSource`] and [`Paginated`] carries the page back
//! with its totals.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{StorageError, StorageResult};

use super::ParamSource;

/// Page number used when `page` is absent.
pub const DEFAULT_PAGE: u64 = 1;

/// Page size used when `limit` is absent.
pub const DEFAULT_LIMIT: u64 = 10;

/// Parameter names understood by [`PageRequest::from_params`].
pub mod param_names {
    pub const PAGE: &str = "page";
    pub const LIMIT: &str = "limit";
    pub const SEARCH: &str = "search";
    pub const SEARCH_FIELDS: &str = "search_fields";
    pub const SEARCH_OPERATOR: &str = "search_operator";
}

/// How per-field search conditions are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SearchOperator {
    And,
    #[default]
    Or,
}

impl SearchOperator {
    /// Parses `AND`/`OR` case-insensitively. Anything else is `OR`.
    pub fn parse_lenient(s: &str) -> Self {
        if s.trim().eq_ignore_ascii_case("and") {
            SearchOperator::And
        } else {
            SearchOperator::Or
        }
    }
}

impl fmt::Display for SearchOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchOperator::And => write!(f, "AND"),
            SearchOperator::Or => write!(f, "OR"),
        }
    }
}

/// A substring search over one or more fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchSpec {
    term: String,
    fields: Vec<String>,
    operator: SearchOperator,
}

impl SearchSpec {
    /// Creates a search spec. Returns `None` when the term or the field list
    /// is empty, in which case no search filtering applies.
    pub fn new(
        term: impl Into<String>,
        fields: impl IntoIterator<Item = impl Into<String>>,
        operator: SearchOperator,
    ) -> Option<Self> {
        let term = term.into();
        let fields: Vec<String> = fields
            .into_iter()
            .map(Into::into)
            .map(|f| f.trim().to_string())
            .filter(|f| !f.is_empty())
            .collect();

        if term.is_empty() || fields.is_empty() {
            return None;
        }

        Some(Self {
            term,
            fields,
            operator,
        })
    }

    pub fn term(&self) -> &str {
        &self.term
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn operator(&self) -> SearchOperator {
        self.operator
    }
}

/// A validated page request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    page: u64,
    limit: u64,
    search: Option<SearchSpec>,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
            search: None,
        }
    }
}

impl PageRequest {
    /// Creates a request for `page` with `limit` items per page.
    pub fn new(page: u64, limit: u64) -> StorageResult<Self> {
        if page == 0 {
            return Err(StorageError::invalid_parameter(
                param_names::PAGE,
                "0",
                "must be a positive integer",
            ));
        }
        if limit == 0 {
            return Err(StorageError::invalid_parameter(
                param_names::LIMIT,
                "0",
                "must be a positive integer",
            ));
        }
        Ok(Self {
            page,
            limit,
            search: None,
        })
    }

    /// Attaches a search. `None` clears it.
    pub fn with_search(mut self, search: Option<SearchSpec>) -> Self {
        self.search = search;
        self
    }

    /// Parses `page`, `limit`, `search`, `search_fields` and
    /// `search_operator`, applying defaults for absent keys.
    pub fn from_params<P: ParamSource + ?Sized>(params: &P) -> StorageResult<Self> {
        let page = parse_positive(params, param_names::PAGE, DEFAULT_PAGE)?;
        let limit = parse_positive(params, param_names::LIMIT, DEFAULT_LIMIT)?;

        let term = params.param_or(param_names::SEARCH, "");
        let fields = params.param_or(param_names::SEARCH_FIELDS, "");
        let operator = SearchOperator::parse_lenient(params.param_or(param_names::SEARCH_OPERATOR, "OR"));

        Ok(Self {
            page,
            limit,
            search: SearchSpec::new(term, fields.split(','), operator),
        })
    }

    pub fn page(&self) -> u64 {
        self.page
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }

    pub fn search(&self) -> Option<&SearchSpec> {
        self.search.as_ref()
    }

    /// Number of rows to skip: `(page - 1) * limit`.
    pub fn offset(&self) -> StorageResult<u64> {
        (self.page - 1).checked_mul(self.limit).ok_or_else(|| {
            StorageError::invalid_parameter(
                param_names::PAGE,
                self.page.to_string(),
                "page offset overflows",
            )
        })
    }

    /// The fetch window for this page.
    pub fn window(&self) -> StorageResult<PageWindow> {
        Ok(PageWindow::new(self.limit, self.offset()?))
    }

    /// `ceil(total_items / limit)`.
    pub fn total_pages(&self, total_items: u64) -> u64 {
        total_items.div_ceil(self.limit)
    }
}

fn parse_positive<P: ParamSource + ?Sized>(
    params: &P,
    name: &str,
    default: u64,
) -> StorageResult<u64> {
    let Some(raw) = params.param(name) else {
        return Ok(default);
    };

    match raw.parse::<u64>() {
        Ok(value) if value > 0 => Ok(value),
        _ => Err(StorageError::invalid_parameter(
            name,
            raw,
            "must be a positive integer",
        )),
    }
}

/// A bounded or unbounded slice of an ordered result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PageWindow {
    /// Maximum number of rows, or `None` for no limit.
    pub limit: Option<u64>,
    /// Number of rows to skip.
    pub offset: u64,
}

impl PageWindow {
    pub fn new(limit: u64, offset: u64) -> Self {
        Self {
            limit: Some(limit),
            offset,
        }
    }

    /// Every row.
    pub fn all() -> Self {
        Self::default()
    }
}

/// One page of results with its totals.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Paginated<T> {
    /// The requested page, 1-indexed.
    pub current_page: u64,
    /// `ceil(total_items / items_per_page)`.
    pub total_pages: u64,
    /// Rows matching the query, across all pages.
    pub total_items: u64,
    /// The requested page size.
    pub items_per_page: u64,
    /// The rows on this page.
    pub items: Vec<T>,
}

impl<T> Paginated<T> {
    /// Transforms every item, keeping the totals.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Paginated<U> {
        Paginated {
            current_page: self.current_page,
            total_pages: self.total_pages,
            total_items: self.total_items,
            items_per_page: self.items_per_page,
            items: self.items.into_iter().map(f).collect(),
        }
    }

    /// Transforms every item with a fallible function.
    pub fn try_map<U, E>(self, f: impl FnMut(T) -> Result<U, E>) -> Result<Paginated<U>, E> {
        Ok(Paginated {
            current_page: self.current_page,
            total_pages: self.total_pages,
            total_items: self.total_items,
            items_per_page: self.items_per_page,
            items: self.items.into_iter().map(f).collect::<Result<_, _>>()?,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;
    use crate::types::QueryParams;

    fn assert_invalid(result: StorageResult<PageRequest>, expected_name: &str) {
        match result {
            Err(StorageError::Validation(ValidationError::InvalidParameter { name, .. })) => {
                assert_eq!(name, expected_name)
            }
            other => panic!("expected invalid parameter, got {:?}", other),
        }
    }

    #[test]
    fn test_defaults() {
        let request = PageRequest::from_params(&QueryParams::new()).unwrap();
        assert_eq!(request.page(), 1);
        assert_eq!(request.limit(), 10);
        assert!(request.search().is_none());
        assert_eq!(request.offset().unwrap(), 0);
    }

    #[test]
    fn test_offset() {
        let request = PageRequest::from_params(&QueryParams::parse("page=3&limit=7")).unwrap();
        assert_eq!(request.offset().unwrap(), 14);
        assert_eq!(request.window().unwrap(), PageWindow::new(7, 14));
    }

    #[test]
    fn test_rejects_non_numeric_and_non_positive() {
        assert_invalid(PageRequest::from_params(&QueryParams::parse("page=abc")), "page");
        assert_invalid(PageRequest::from_params(&QueryParams::parse("page=0")), "page");
        assert_invalid(PageRequest::from_params(&QueryParams::parse("page=-2")), "page");
        assert_invalid(PageRequest::from_params(&QueryParams::parse("limit=0")), "limit");
        assert_invalid(PageRequest::from_params(&QueryParams::parse("limit=1.5")), "limit");
        assert_invalid(PageRequest::from_params(&QueryParams::parse("limit=")), "limit");
    }

    #[test]
    fn test_offset_overflow_is_invalid() {
        let request = PageRequest::new(u64::MAX, 2).unwrap();
        assert!(request.offset().is_err());
    }

    #[test]
    fn test_total_pages() {
        let request = PageRequest::new(1, 10).unwrap();
        assert_eq!(request.total_pages(0), 0);
        assert_eq!(request.total_pages(1), 1);
        assert_eq!(request.total_pages(10), 1);
        assert_eq!(request.total_pages(15), 2);
    }

    #[test]
    fn test_search_requires_term_and_fields() {
        let only_term = PageRequest::from_params(&QueryParams::parse("search=tolkien")).unwrap();
        assert!(only_term.search().is_none());

        let only_fields =
            PageRequest::from_params(&QueryParams::parse("search_fields=title")).unwrap();
        assert!(only_fields.search().is_none());

        let blank_fields =
            PageRequest::from_params(&QueryParams::parse("search=x&search_fields=,%20,")).unwrap();
        assert!(blank_fields.search().is_none());
    }

    #[test]
    fn test_search_fields_are_trimmed() {
        let request = PageRequest::from_params(&QueryParams::parse(
            "search=tolkien&search_fields=title,%20description&search_operator=and",
        ))
        .unwrap();
        let search = request.search().unwrap();
        assert_eq!(search.term(), "tolkien");
        assert_eq!(search.fields(), ["title", "description"]);
        assert_eq!(search.operator(), SearchOperator::And);
    }

    #[test]
    fn test_unknown_operator_falls_back_to_or() {
        assert_eq!(SearchOperator::parse_lenient("XOR"), SearchOperator::Or);
        assert_eq!(SearchOperator::parse_lenient("And"), SearchOperator::And);
        assert_eq!(SearchOperator::parse_lenient(""), SearchOperator::Or);
    }

    #[test]
    fn test_paginated_serializes_with_page_metadata() {
        let page = Paginated {
            current_page: 2,
            total_pages: 2,
            total_items: 15,
            items_per_page: 10,
            items: vec![1, 2, 3, 4, 5],
        };
        let value = serde_json::to_value(&page).unwrap();
        assert_eq!(value["current_page"], 2);
        assert_eq!(value["total_pages"], 2);
        assert_eq!(value["total_items"], 15);
        assert_eq!(value["items_per_page"], 10);
        assert_eq!(value["items"].as_array().unwrap().len(), 5);
    }
}

//! Composable entity queries.
//!
//! An [`EntityQuery`] describes "rows of kind K, in scope S, matching these
//! predicates". It is a plain value owned by the caller: refining it returns
//! a new query, and backends translate it at execution time.
//!
//! ```
//! use bookstore_persistence::query::{EntityQuery, Filter};
//! use bookstore_persistence::types::{EntityKind, RowScope};
//!
//! let query = EntityQuery::new(EntityKind::Purchase)
//!     .filter(Filter::eq("user_id", 7))
//!     .filter(Filter::is_null("transaction_id"));
//!
//! assert_eq!(query.kind(), EntityKind::Purchase);
//! assert_eq!(query.scope(), RowScope::ActiveOnly);
//! assert_eq!(query.filters().len(), 2);
//! ```

use crate::types::{EntityKind, RowScope, SearchOperator, SearchSpec};

/// A scalar compared against a payload field or column.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Integer(i64),
    Text(String),
    Bool(bool),
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Integer(value)
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        FieldValue::Integer(i64::from(value))
    }
}

impl From<u32> for FieldValue {
    fn from(value: u32) -> Self {
        FieldValue::Integer(i64::from(value))
    }
}

impl From<u64> for FieldValue {
    fn from(value: u64) -> Self {
        FieldValue::Integer(i64::try_from(value).unwrap_or(i64::MAX))
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

/// A predicate over one entity kind.
///
/// `id` and `code` address the row's own columns; every other field name
/// addresses a top-level field of the JSON payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// `field = value`.
    Eq { field: String, value: FieldValue },
    /// `field IN (values)`. An empty list matches nothing.
    In {
        field: String,
        values: Vec<FieldValue>,
    },
    /// The field is absent or null.
    IsNull { field: String },
    /// Case-insensitive substring match. Wildcards in `needle` match
    /// literally.
    Contains { field: String, needle: String },
    /// Every nested filter matches. An empty list matches everything.
    All(Vec<Filter>),
    /// At least one nested filter matches. An empty list matches nothing.
    Any(Vec<Filter>),
}

impl Filter {
    pub fn eq(field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        Filter::Eq {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn is_in<V: Into<FieldValue>>(
        field: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        Filter::In {
            field: field.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_null(field: impl Into<String>) -> Self {
        Filter::IsNull {
            field: field.into(),
        }
    }

    pub fn contains(field: impl Into<String>, needle: impl Into<String>) -> Self {
        Filter::Contains {
            field: field.into(),
            needle: needle.into(),
        }
    }

    /// One `Contains` per search field, joined by the search operator.
    pub fn from_search(search: &SearchSpec) -> Self {
        let conditions = search
            .fields()
            .iter()
            .map(|field| Filter::contains(field.as_str(), search.term()))
            .collect();

        match search.operator() {
            SearchOperator::And => Filter::All(conditions),
            SearchOperator::Or => Filter::Any(conditions),
        }
    }

    /// Names of every field referenced by this filter.
    pub fn fields(&self) -> Vec<&str> {
        match self {
            Filter::Eq { field, .. }
            | Filter::In { field, .. }
            | Filter::IsNull { field }
            | Filter::Contains { field, .. } => vec![field.as_str()],
            Filter::All(filters) | Filter::Any(filters) => {
                filters.iter().flat_map(Filter::fields).collect()
            }
        }
    }
}

/// Rows of one entity kind matching a conjunction of filters.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityQuery {
    kind: EntityKind,
    scope: RowScope,
    filters: Vec<Filter>,
}

impl EntityQuery {
    /// All active rows of `kind`.
    pub fn new(kind: EntityKind) -> Self {
        Self {
            kind,
            scope: RowScope::ActiveOnly,
            filters: Vec::new(),
        }
    }

    /// Adds a filter, ANDed with the existing ones.
    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    /// Opts into seeing soft-deleted rows as well.
    pub fn include_deleted(mut self) -> Self {
        self.scope = RowScope::IncludeDeleted;
        self
    }

    pub fn with_scope(mut self, scope: RowScope) -> Self {
        self.scope = scope;
        self
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn scope(&self) -> RowScope {
        self.scope
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }
}

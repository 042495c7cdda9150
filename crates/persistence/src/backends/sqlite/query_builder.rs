//! SQL query builder for entity queries.
//!
//! Translates an [`EntityQuery`] into a `WHERE` clause over the `entities`
//! table. `id` and `code` map to columns; every other field maps to
//! `json_extract(data, '$.<field>')` with the path bound as a parameter.
//! Placeholders are anonymous (`?`) and parameters are kept in text order,
//! so fragments can be combined freely.
//!
//! Substring search folds case with [`UNICODE_LOWER`], which every pooled
//! connection registers through [`register_functions`]. SQLite's built-in
//! `LOWER` only folds ASCII.

use regex::Regex;
use rusqlite::functions::FunctionFlags;
use rusqlite::types::{ToSqlOutput, ValueRef};
use rusqlite::{Connection, ToSql};

use crate::error::{BackendError, StorageError, StorageResult};
use crate::query::{EntityQuery, FieldValue, Filter};
use crate::types::RowScope;

/// SQL name of the Unicode-aware lowercase function.
pub(crate) const UNICODE_LOWER: &str = "unicode_lower";

/// Registers the scalar functions generated SQL relies on.
///
/// `unicode_lower(x)` lowercases text with Rust's Unicode rules, the same
/// folding applied to search terms. Numbers are folded as their text form;
/// NULL and blobs yield NULL.
pub(crate) fn register_functions(conn: &Connection) -> rusqlite::Result<()> {
    conn.create_scalar_function(
        UNICODE_LOWER,
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            Ok(match ctx.get_raw(0) {
                ValueRef::Text(text) => Some(String::from_utf8_lossy(text).to_lowercase()),
                ValueRef::Integer(i) => Some(i.to_string()),
                ValueRef::Real(r) => Some(r.to_string()),
                ValueRef::Null | ValueRef::Blob(_) => None,
            })
        },
    )
}

/// A fragment of SQL with bound parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct SqlFragment {
    /// The SQL clause.
    pub sql: String,
    /// Bound parameter values, in placeholder order.
    pub params: Vec<SqlParam>,
}

/// A bound SQL parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    /// String parameter.
    String(String),
    /// Integer parameter.
    Integer(i64),
}

impl SqlParam {
    /// Creates a string parameter.
    pub fn string(s: impl Into<String>) -> Self {
        SqlParam::String(s.into())
    }

    /// Creates an integer parameter.
    pub fn integer(i: i64) -> Self {
        SqlParam::Integer(i)
    }
}

impl From<&FieldValue> for SqlParam {
    fn from(value: &FieldValue) -> Self {
        match value {
            FieldValue::Integer(i) => SqlParam::Integer(*i),
            FieldValue::Text(s) => SqlParam::String(s.clone()),
            // json_extract yields 1/0 for JSON true/false.
            FieldValue::Bool(b) => SqlParam::Integer(i64::from(*b)),
        }
    }
}

impl ToSql for SqlParam {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            SqlParam::String(s) => ToSqlOutput::from(s.as_str()),
            SqlParam::Integer(i) => ToSqlOutput::from(*i),
        })
    }
}

impl SqlFragment {
    /// Creates a new SQL fragment.
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
        }
    }

    /// Creates a fragment with parameters.
    pub fn with_params(sql: impl Into<String>, params: Vec<SqlParam>) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }

    /// A fragment that matches every row.
    pub fn always() -> Self {
        Self::new("1 = 1")
    }

    /// A fragment that matches no row.
    pub fn never() -> Self {
        Self::new("1 = 0")
    }

    /// Combines with another fragment using AND.
    pub fn and(mut self, other: SqlFragment) -> Self {
        self.sql = format!("({}) AND ({})", self.sql, other.sql);
        self.params.extend(other.params);
        self
    }

    /// Combines with another fragment using OR.
    pub fn or(mut self, other: SqlFragment) -> Self {
        self.sql = format!("({}) OR ({})", self.sql, other.sql);
        self.params.extend(other.params);
        self
    }
}

/// Escapes `\`, `%` and `_` so they match literally in `LIKE ... ESCAPE '\'`.
pub fn escape_like(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Builds SQL for [`EntityQuery`] values.
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    field_pattern: Regex,
}

impl QueryBuilder {
    /// Creates a query builder.
    pub fn new() -> StorageResult<Self> {
        let field_pattern = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").map_err(|e| {
            StorageError::Backend(BackendError::Internal {
                backend_name: "sqlite".to_string(),
                message: format!("invalid field pattern: {}", e),
                source: None,
            })
        })?;
        Ok(Self { field_pattern })
    }

    /// Builds the `WHERE` clause for `query`: kind, row scope, then every
    /// filter ANDed together.
    pub fn where_clause(&self, query: &EntityQuery) -> StorageResult<SqlFragment> {
        let mut fragment = SqlFragment::with_params(
            "kind = ?",
            vec![SqlParam::string(query.kind().as_str())],
        );

        if query.scope() == RowScope::ActiveOnly {
            fragment = fragment.and(SqlFragment::new("is_deleted = 0"));
        }

        for filter in query.filters() {
            fragment = fragment.and(self.build_filter(filter)?);
        }

        Ok(fragment)
    }

    fn build_filter(&self, filter: &Filter) -> StorageResult<SqlFragment> {
        match filter {
            Filter::Eq { field, value } => {
                let mut fragment = self.column(field)?;
                fragment.sql = format!("{} = ?", fragment.sql);
                fragment.params.push(SqlParam::from(value));
                Ok(fragment)
            }
            Filter::In { field, values } => {
                if values.is_empty() {
                    return Ok(SqlFragment::never());
                }
                let mut fragment = self.column(field)?;
                let placeholders = vec!["?"; values.len()].join(", ");
                fragment.sql = format!("{} IN ({})", fragment.sql, placeholders);
                fragment.params.extend(values.iter().map(SqlParam::from));
                Ok(fragment)
            }
            Filter::IsNull { field } => {
                let mut fragment = self.column(field)?;
                fragment.sql = format!("{} IS NULL", fragment.sql);
                Ok(fragment)
            }
            Filter::Contains { field, needle } => {
                let mut fragment = self.column(field)?;
                fragment.sql = format!(
                    "{}(COALESCE({}, '')) LIKE ? ESCAPE '\\'",
                    UNICODE_LOWER, fragment.sql
                );
                fragment.params.push(SqlParam::string(format!(
                    "%{}%",
                    escape_like(&needle.to_lowercase())
                )));
                Ok(fragment)
            }
            Filter::All(filters) => filters
                .iter()
                .map(|f| self.build_filter(f))
                .try_fold(SqlFragment::always(), |acc, next| Ok(acc.and(next?))),
            Filter::Any(filters) => {
                let mut iter = filters.iter();
                let Some(first) = iter.next() else {
                    return Ok(SqlFragment::never());
                };
                iter.map(|f| self.build_filter(f))
                    .try_fold(self.build_filter(first)?, |acc, next| Ok(acc.or(next?)))
            }
        }
    }

    /// The SQL expression for a field.
    fn column(&self, field: &str) -> StorageResult<SqlFragment> {
        match field {
            "id" => Ok(SqlFragment::new("id")),
            "code" => Ok(SqlFragment::new("code")),
            _ if self.field_pattern.is_match(field) => Ok(SqlFragment::with_params(
                "json_extract(data, ?)",
                vec![SqlParam::string(format!("$.{}", field))],
            )),
            _ => Err(StorageError::invalid_parameter(
                "field",
                field,
                "field names must be identifiers",
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EntityKind;

    fn builder() -> QueryBuilder {
        QueryBuilder::new().unwrap()
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("100%"), "100\\%");
        assert_eq!(escape_like("a_b"), "a\\_b");
        assert_eq!(escape_like("c:\\"), "c:\\\\");
        assert_eq!(escape_like("plain"), "plain");
    }

    #[test]
    fn test_default_scope_excludes_deleted() {
        let fragment = builder()
            .where_clause(&EntityQuery::new(EntityKind::Author))
            .unwrap();
        assert_eq!(fragment.sql, "(kind = ?) AND (is_deleted = 0)");
        assert_eq!(fragment.params, vec![SqlParam::string("Author")]);
    }

    #[test]
    fn test_include_deleted_has_no_state_filter() {
        let fragment = builder()
            .where_clause(&EntityQuery::new(EntityKind::Author).include_deleted())
            .unwrap();
        assert_eq!(fragment.sql, "kind = ?");
    }

    #[test]
    fn test_eq_on_payload_field_binds_path_before_value() {
        let query = EntityQuery::new(EntityKind::Book)
            .include_deleted()
            .filter(Filter::eq("author_id", 3_u64));
        let fragment = builder().where_clause(&query).unwrap();
        assert_eq!(fragment.sql, "(kind = ?) AND (json_extract(data, ?) = ?)");
        assert_eq!(
            fragment.params,
            vec![
                SqlParam::string("Book"),
                SqlParam::string("$.author_id"),
                SqlParam::integer(3),
            ]
        );
    }

    #[test]
    fn test_contains_lowercases_and_escapes() {
        let query = EntityQuery::new(EntityKind::Book)
            .include_deleted()
            .filter(Filter::contains("title", "50% OFF"));
        let fragment = builder().where_clause(&query).unwrap();
        assert!(fragment.sql.contains(
            "unicode_lower(COALESCE(json_extract(data, ?), '')) LIKE ? ESCAPE '\\'"
        ));
        assert_eq!(fragment.params[2], SqlParam::string("%50\\% off%"));
    }

    #[test]
    fn test_unicode_lower_folds_non_ascii() {
        let conn = Connection::open_in_memory().unwrap();
        register_functions(&conn).unwrap();

        let folded: String = conn
            .query_row("SELECT unicode_lower('ÉMILE Ça')", [], |row| row.get(0))
            .unwrap();
        assert_eq!(folded, "émile ça");

        let number: String = conn
            .query_row("SELECT unicode_lower(42)", [], |row| row.get(0))
            .unwrap();
        assert_eq!(number, "42");

        let null: Option<String> = conn
            .query_row("SELECT unicode_lower(NULL)", [], |row| row.get(0))
            .unwrap();
        assert!(null.is_none());
    }

    #[test]
    fn test_in_with_no_values_matches_nothing() {
        let query = EntityQuery::new(EntityKind::Book)
            .include_deleted()
            .filter(Filter::is_in("id", Vec::<u64>::new()));
        let fragment = builder().where_clause(&query).unwrap();
        assert_eq!(fragment.sql, "(kind = ?) AND (1 = 0)");
    }

    #[test]
    fn test_any_and_all() {
        let any = builder()
            .build_filter(&Filter::Any(vec![
                Filter::contains("title", "a"),
                Filter::contains("code", "b"),
            ]))
            .unwrap();
        assert!(any.sql.contains(") OR ("));
        assert_eq!(any.params.len(), 3);

        assert_eq!(builder().build_filter(&Filter::Any(vec![])).unwrap().sql, "1 = 0");
        assert_eq!(builder().build_filter(&Filter::All(vec![])).unwrap().sql, "1 = 1");
    }

    #[test]
    fn test_rejects_non_identifier_fields() {
        let query = EntityQuery::new(EntityKind::Book).filter(Filter::eq("title') OR 1=1 --", "x"));
        assert!(builder().where_clause(&query).is_err());
    }
}

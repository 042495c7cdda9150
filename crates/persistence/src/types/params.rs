//! Read-only request parameter sources.
//!
//! The paginator reads `page`, `limit`, `search`, `search_fields` and
//! `search_operator` through [`ParamSource`], so it works the same whether
//! the values come from a parsed query string, a map built by a caller, or
//! command-line flags.

use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;

/// A string-keyed lookup of request parameters.
pub trait ParamSource {
    /// Returns the raw value for `key`, or `None` if the key is absent.
    ///
    /// A key that is present with an empty value returns `Some("")`.
    fn param(&self, key: &str) -> Option<&str>;

    /// Returns the value for `key`, or `default` if the key is absent.
    fn param_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.param(key).unwrap_or(default)
    }
}

impl<S: BuildHasher> ParamSource for HashMap<String, String, S> {
    fn param(&self, key: &str) -> Option<&str> {
        self.get(key).map(String::as_str)
    }
}

impl ParamSource for BTreeMap<String, String> {
    fn param(&self, key: &str) -> Option<&str> {
        self.get(key).map(String::as_str)
    }
}

impl<P: ParamSource + ?Sized> ParamSource for &P {
    fn param(&self, key: &str) -> Option<&str> {
        (**self).param(key)
    }
}

/// Ordered query-string parameters. The first occurrence of a key wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    /// Creates an empty parameter set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses an `application/x-www-form-urlencoded` query string.
    ///
    /// A leading `?` is ignored, so both `page=2&limit=5` and `?page=2`
    /// are accepted.
    pub fn parse(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        url::form_urlencoded::parse(query.as_bytes())
            .into_owned()
            .collect()
    }

    /// Appends a parameter.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.pairs.push((key.into(), value.into()));
        self
    }

    /// Appends a parameter only when `value` is `Some`.
    pub fn with_opt(self, key: impl Into<String>, value: Option<impl Into<String>>) -> Self {
        match value {
            Some(value) => self.with(key, value),
            None => self,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for QueryParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            pairs: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl ParamSource for QueryParams {
    fn param(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_query_string() {
        let params = QueryParams::parse("?page=2&limit=5&search=the%20hobbit&search_fields=title,description");
        assert_eq!(params.param("page"), Some("2"));
        assert_eq!(params.param("limit"), Some("5"));
        assert_eq!(params.param("search"), Some("the hobbit"));
        assert_eq!(params.param("search_fields"), Some("title,description"));
        assert_eq!(params.param("search_operator"), None);
    }

    #[test]
    fn test_first_occurrence_wins() {
        let params = QueryParams::parse("page=1&page=9");
        assert_eq!(params.param("page"), Some("1"));
    }

    #[test]
    fn test_present_but_empty_is_not_absent() {
        let params = QueryParams::parse("page=");
        assert_eq!(params.param("page"), Some(""));
        assert_eq!(params.param_or("limit", "10"), "10");
    }

    #[test]
    fn test_hash_map_source() {
        let mut map = HashMap::new();
        map.insert("limit".to_string(), "25".to_string());
        assert_eq!(map.param("limit"), Some("25"));
        assert_eq!(map.param_or("page", "1"), "1");
    }

    #[test]
    fn test_with_opt() {
        let params = QueryParams::new()
            .with("page", "3")
            .with_opt("search", None::<String>)
            .with_opt("limit", Some("4"));
        assert_eq!(params.param("page"), Some("3"));
        assert_eq!(params.param("search"), None);
        assert_eq!(params.param("limit"), Some("4"));
    }
}

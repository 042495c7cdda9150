//! The closed set of entity kinds stored by the bookstore.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{StorageError, ValidationError};

/// An entity kind.
///
/// Dispatch throughout the crate is by this enum; name-based lookup via
/// [`FromStr`] exists only for callers that receive a kind at runtime
/// (configuration, command-line arguments).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EntityKind {
    Author,
    Book,
    Category,
    Purchase,
    Transaction,
    FavoriteBook,
    User,
}

impl EntityKind {
    /// All entity kinds, in schema order.
    pub const ALL: [EntityKind; 7] = [
        EntityKind::Author,
        EntityKind::Book,
        EntityKind::Category,
        EntityKind::Purchase,
        EntityKind::Transaction,
        EntityKind::FavoriteBook,
        EntityKind::User,
    ];

    /// Returns the canonical name stored in the `kind` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Author => "Author",
            EntityKind::Book => "Book",
            EntityKind::Category => "Category",
            EntityKind::Purchase => "Purchase",
            EntityKind::Transaction => "Transaction",
            EntityKind::FavoriteBook => "FavoriteBook",
            EntityKind::User => "User",
        }
    }

    /// Fields that may appear in `search_fields` for this kind.
    ///
    /// `code` is a column rather than a payload field but is searchable for
    /// every kind that can carry one.
    pub fn searchable_fields(&self) -> &'static [&'static str] {
        match self {
            EntityKind::Author => &["name", "bio", "code"],
            EntityKind::Book => &["title", "description", "publisher", "binding_type", "code"],
            EntityKind::Category => &["name", "description", "code"],
            EntityKind::Purchase => &["code"],
            EntityKind::Transaction => &["status", "code"],
            EntityKind::FavoriteBook => &[],
            EntityKind::User => &["username", "code"],
        }
    }

    /// Returns true if `field` may be used as a search field for this kind.
    pub fn is_searchable(&self, field: &str) -> bool {
        self.searchable_fields().contains(&field)
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = StorageError;

    /// Parses `Author`, `author`, `FavoriteBook`, `favorite_book`, `favorite-book`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .flat_map(char::to_lowercase)
            .collect();

        EntityKind::ALL
            .into_iter()
            .find(|kind| kind.as_str().to_lowercase() == normalized)
            .ok_or_else(|| {
                ValidationError::UnknownEntityType {
                    entity_type: s.to_string(),
                }
                .into()
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_canonical_and_snake_case() {
        assert_eq!("Author".parse::<EntityKind>().unwrap(), EntityKind::Author);
        assert_eq!("book".parse::<EntityKind>().unwrap(), EntityKind::Book);
        assert_eq!(
            "favorite_book".parse::<EntityKind>().unwrap(),
            EntityKind::FavoriteBook
        );
        assert_eq!(
            "FavoriteBook".parse::<EntityKind>().unwrap(),
            EntityKind::FavoriteBook
        );
    }

    #[test]
    fn test_parse_unknown_kind() {
        let err = "Publisher".parse::<EntityKind>().unwrap_err();
        assert!(matches!(
            err,
            StorageError::Validation(ValidationError::UnknownEntityType { .. })
        ));
    }

    #[test]
    fn test_display_round_trips() {
        for kind in EntityKind::ALL {
            assert_eq!(kind.to_string().parse::<EntityKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_searchable_fields() {
        assert!(EntityKind::Book.is_searchable("title"));
        assert!(EntityKind::Book.is_searchable("code"));
        assert!(!EntityKind::Book.is_searchable("price"));
        assert!(EntityKind::FavoriteBook.searchable_fields().is_empty());
    }
}

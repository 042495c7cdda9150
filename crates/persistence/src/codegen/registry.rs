use std::collections::HashMap;

use regex::Regex;

use crate::error::{BackendError, StorageError, StorageResult, ValidationError};
use crate::types::EntityKind;

const PREFIX_PATTERN: &str = r"^[A-Z][A-Z0-9]{0,7}$";

/// Immutable mapping from entity kind to code prefix.
///
/// Built once at startup and shared by every [`CodeGenerator`](super::CodeGenerator).
/// The default table covers the coded kinds:
///
/// | Kind | Prefix |
/// |------|--------|
/// | Category | `CA` |
/// | Book | `BO` |
/// | Transaction | `TST` |
/// | Author | `AU` |
/// | Purchase | `PC` |
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefixRegistry {
    prefixes: HashMap<EntityKind, String>,
}

impl Default for PrefixRegistry {
    fn default() -> Self {
        Self::empty()
            .with_prefix(EntityKind::Category, "CA")
            .with_prefix(EntityKind::Book, "BO")
            .with_prefix(EntityKind::Transaction, "TST")
            .with_prefix(EntityKind::Author, "AU")
            .with_prefix(EntityKind::Purchase, "PC")
    }
}

impl PrefixRegistry {
    /// A registry with no prefixes.
    pub fn empty() -> Self {
        Self {
            prefixes: HashMap::new(),
        }
    }

    /// Returns a copy with `kind` mapped to `prefix`.
    pub fn with_prefix(mut self, kind: EntityKind, prefix: impl Into<String>) -> Self {
        self.prefixes.insert(kind, prefix.into());
        self
    }

    /// Applies comma-separated `kind=PREFIX` overrides, e.g.
    /// `user=US,favorite_book=FB`.
    ///
    /// Prefixes must be 1 to 8 upper-case ASCII letters or digits, starting
    /// with a letter.
    pub fn with_overrides(mut self, overrides: &str) -> StorageResult<Self> {
        let prefix_pattern = Regex::new(PREFIX_PATTERN).map_err(|e| BackendError::Internal {
            backend_name: "codegen".to_string(),
            message: format!("invalid prefix pattern: {}", e),
            source: None,
        })?;

        for pair in overrides.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let Some((kind, prefix)) = pair.split_once('=') else {
                return Err(StorageError::invalid_parameter(
                    "code_prefixes",
                    pair,
                    "expected kind=PREFIX",
                ));
            };

            let kind: EntityKind = kind.trim().parse()?;
            let prefix = prefix.trim();
            if !prefix_pattern.is_match(prefix) {
                return Err(StorageError::invalid_parameter(
                    "code_prefixes",
                    pair,
                    "prefix must be upper-case letters or digits starting with a letter",
                ));
            }

            self.prefixes.insert(kind, prefix.to_string());
        }
        Ok(self)
    }

    /// Returns the prefix for `kind`, if one is registered.
    pub fn prefix(&self, kind: EntityKind) -> Option<&str> {
        self.prefixes.get(&kind).map(String::as_str)
    }

    /// Returns the prefix for `kind` or `ErrUnknownEntityType`.
    pub fn require(&self, kind: EntityKind) -> StorageResult<&str> {
        self.prefix(kind).ok_or_else(|| {
            ValidationError::UnknownEntityType {
                entity_type: kind.to_string(),
            }
            .into()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_table() {
        let registry = PrefixRegistry::default();
        assert_eq!(registry.prefix(EntityKind::Category), Some("CA"));
        assert_eq!(registry.prefix(EntityKind::Book), Some("BO"));
        assert_eq!(registry.prefix(EntityKind::Transaction), Some("TST"));
        assert_eq!(registry.prefix(EntityKind::Author), Some("AU"));
        assert_eq!(registry.prefix(EntityKind::Purchase), Some("PC"));
        assert_eq!(registry.prefix(EntityKind::User), None);
        assert_eq!(registry.prefix(EntityKind::FavoriteBook), None);
    }

    #[test]
    fn test_require_unknown_kind() {
        let err = PrefixRegistry::default().require(EntityKind::User).unwrap_err();
        assert!(matches!(
            err,
            StorageError::Validation(ValidationError::UnknownEntityType { ref entity_type })
                if entity_type == "User"
        ));
    }

    #[test]
    fn test_overrides() {
        let registry = PrefixRegistry::default()
            .with_overrides("user=US, favorite_book=FB,author=WR")
            .unwrap();
        assert_eq!(registry.prefix(EntityKind::User), Some("US"));
        assert_eq!(registry.prefix(EntityKind::FavoriteBook), Some("FB"));
        assert_eq!(registry.prefix(EntityKind::Author), Some("WR"));
        assert_eq!(registry.prefix(EntityKind::Book), Some("BO"));
    }

    #[test]
    fn test_empty_overrides_are_a_no_op() {
        let registry = PrefixRegistry::default().with_overrides("").unwrap();
        assert_eq!(registry, PrefixRegistry::default());
    }

    #[test]
    fn test_invalid_overrides() {
        assert!(PrefixRegistry::default().with_overrides("user").is_err());
        assert!(PrefixRegistry::default().with_overrides("user=us").is_err());
        assert!(PrefixRegistry::default().with_overrides("user=1A").is_err());
        assert!(PrefixRegistry::default().with_overrides("publisher=PB").is_err());
    }
}

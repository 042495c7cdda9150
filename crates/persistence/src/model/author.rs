use serde::{Deserialize, Serialize};

use crate::error::StorageResult;
use crate::types::EntityKind;

use super::{Entity, default_true, require_non_blank};

/// A book author.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub name: String,
    #[serde(default)]
    pub bio: String,
    #[serde(default = "default_true")]
    pub active: bool,
}

impl Author {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bio: String::new(),
            active: true,
        }
    }

    pub fn with_bio(mut self, bio: impl Into<String>) -> Self {
        self.bio = bio.into();
        self
    }
}

impl Entity for Author {
    const KIND: EntityKind = EntityKind::Author;

    fn validate(&self) -> StorageResult<()> {
        require_non_blank("name", &self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_active_defaults_to_true() {
        let author: Author = serde_json::from_str(r#"{"name": "Octavia Butler"}"#).unwrap();
        assert!(author.active);
        assert_eq!(author.bio, "");
    }

    #[test]
    fn test_blank_name_is_rejected() {
        assert!(Author::new("  ").validate().is_err());
        assert!(Author::new("N. K. Jemisin").validate().is_ok());
    }
}

use serde::{Deserialize, Serialize};

use crate::error::StorageResult;
use crate::types::EntityKind;

use super::{Entity, require_non_blank};

/// A book category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl Category {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            image_url: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

impl Entity for Category {
    const KIND: EntityKind = EntityKind::Category;

    fn validate(&self) -> StorageResult<()> {
        require_non_blank("name", &self.name)
    }
}

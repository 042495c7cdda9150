use serde::{Deserialize, Serialize};

use crate::error::StorageResult;
use crate::types::EntityKind;

use super::{Entity, default_true, require_non_blank};

/// A customer account. Credentials are handled outside this crate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub username: String,
    #[serde(default = "default_true")]
    pub active: bool,
}

impl User {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            active: true,
        }
    }
}

impl Entity for User {
    const KIND: EntityKind = EntityKind::User;

    fn validate(&self) -> StorageResult<()> {
        require_non_blank("username", &self.username)
    }
}

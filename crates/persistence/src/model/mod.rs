//! Bookstore entity payloads.
//!
//! Each payload is a plain serde struct stored as the JSON `data` of a row.
//! Persistence metadata (id, code, version, timestamps) lives in
//! [`StoredEntity`](crate::types::StoredEntity), not here.

mod author;
mod book;
mod category;
mod favorite;
mod purchase;
mod transaction;
mod user;

pub use author::Author;
pub use book::Book;
pub use category::Category;
pub use favorite::FavoriteBook;
pub use purchase::Purchase;
pub use transaction::{Transaction, TransactionStatus};
pub use user::User;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{StorageResult, ValidationError};
use crate::types::EntityKind;

/// A payload type bound to one [`EntityKind`].
pub trait Entity: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// The kind rows of this type are stored under.
    const KIND: EntityKind;

    /// Checks invariants that must hold before the payload is written.
    fn validate(&self) -> StorageResult<()> {
        Ok(())
    }
}

/// Fails with `MissingRequiredField` if `value` is empty or whitespace.
pub(crate) fn require_non_blank(field: &str, value: &str) -> StorageResult<()> {
    if value.trim().is_empty() {
        return Err(ValidationError::MissingRequiredField {
            field: field.to_string(),
        }
        .into());
    }
    Ok(())
}

pub(crate) fn default_true() -> bool {
    true
}

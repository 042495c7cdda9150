//! Soft-delete state of stored rows.

use serde::{Deserialize, Serialize};

/// Lifecycle state of a stored row.
///
/// Rows are never physically removed. Deleting a row moves it to
/// [`RowState::Deleted`]; it stays visible to queries that opt into
/// [`RowScope::IncludeDeleted`] and keeps counting towards generated codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RowState {
    #[default]
    Active,
    Deleted,
}

impl RowState {
    /// Returns true if the row is deleted.
    pub fn is_deleted(&self) -> bool {
        matches!(self, RowState::Deleted)
    }
}

/// Which rows a query considers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowScope {
    /// Only active rows. The default for every query.
    #[default]
    ActiveOnly,
    /// Active and deleted rows.
    IncludeDeleted,
}

impl RowScope {
    /// Returns true if a row in `state` is visible under this scope.
    pub fn admits(&self, state: RowState) -> bool {
        match self {
            RowScope::ActiveOnly => state == RowState::Active,
            RowScope::IncludeDeleted => true,
        }
    }
}

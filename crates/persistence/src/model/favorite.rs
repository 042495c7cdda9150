use serde::{Deserialize, Serialize};

use crate::types::EntityKind;

use super::Entity;

/// A book a user has marked as favorite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FavoriteBook {
    pub user_id: u64,
    pub book_id: u64,
}

impl Entity for FavoriteBook {
    const KIND: EntityKind = EntityKind::FavoriteBook;
}

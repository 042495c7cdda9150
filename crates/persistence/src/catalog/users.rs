use crate::core::AtomicWrites;
use crate::error::{ResourceError, StorageResult, ValidationError};
use crate::model::{Entity, User};
use crate::query::{EntityQuery, Filter};
use crate::types::StoredEntity;

use super::Catalog;

impl<S> Catalog<S>
where
    S: AtomicWrites + ?Sized,
{
    /// Creates a user.
    ///
    /// # Errors
    ///
    /// * `ResourceError::AlreadyExists` if an active user has the same
    ///   username
    pub async fn create_user(&self, username: &str) -> StorageResult<StoredEntity<User>> {
        let user = User::new(username.trim());
        user.validate()?;

        let taken = EntityQuery::new(User::KIND).filter(Filter::eq("username", user.username.as_str()));
        if self.storage.count(&taken).await? > 0 {
            return Err(ResourceError::AlreadyExists {
                kind: User::KIND,
                message: format!("username '{}' is taken", user.username),
            }
            .into());
        }

        self.insert(&user).await
    }

    pub async fn get_user(&self, id: u64) -> StorageResult<StoredEntity<User>> {
        self.load(id).await
    }

    /// Loads a user that may act: it exists and is active.
    pub(crate) async fn active_user(&self, id: u64) -> StorageResult<StoredEntity<User>> {
        let user = self.load::<User>(id).await?;
        if !user.data().active {
            return Err(ValidationError::InvalidReference {
                field: "user_id".to_string(),
                message: format!("user {} is inactive", id),
            }
            .into());
        }
        Ok(user)
    }
}
